//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::markup::MarkupPolicy;
use crate::reveal::DEFAULT_TOKEN_DELAY;
use crate::types::Model;

/// Command-line arguments for the chatbox tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemini-2.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// Override for the API base URL.
    #[arrrg(optional, "API base URL (default: generativelanguage.googleapis.com/v1beta)", "URL")]
    pub base_url: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Render model output without escaping HTML first.
    #[arrrg(flag, "Treat model output as trusted markup (no escaping)")]
    pub trust_markup: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.  Sampling and safety
/// settings are fixed and live in [`crate::model_client`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// Base URL override; `None` uses the public endpoint.
    pub base_url: Option<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// How model text is treated before it becomes markup.
    pub markup_policy: MarkupPolicy,

    /// Delay between revealed tokens.
    pub reveal_delay: Duration,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-2.5-flash
    /// - Color: enabled
    /// - Markup: escaped
    /// - Reveal delay: 75ms
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            base_url: None,
            use_color: true,
            markup_policy: MarkupPolicy::Escaped,
            reveal_delay: DEFAULT_TOKEN_DELAY,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the markup policy.
    pub fn with_markup_policy(mut self, policy: MarkupPolicy) -> Self {
        self.markup_policy = policy;
        self
    }

    /// Sets the per-token reveal delay.
    pub fn with_reveal_delay(mut self, delay: Duration) -> Self {
        self.reveal_delay = delay;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let model = args
            .model
            .map(|s| s.parse::<Model>().unwrap_or(Model::Custom(s)))
            .unwrap_or_default();
        let markup_policy = if args.trust_markup {
            MarkupPolicy::Trusted
        } else {
            MarkupPolicy::Escaped
        };

        ChatConfig {
            model,
            base_url: args.base_url,
            use_color: !args.no_color,
            markup_policy,
            ..ChatConfig::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.model, Model::Known(KnownModel::Gemini25Flash));
        assert!(config.base_url.is_none());
        assert!(config.use_color);
        assert_eq!(config.markup_policy, MarkupPolicy::Escaped);
        assert_eq!(config.reveal_delay, Duration::from_millis(75));
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config, ChatConfig::default());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            model: Some("gemini-2.5-pro".to_string()),
            base_url: Some("http://localhost:8080/v1beta/".to_string()),
            no_color: true,
            trust_markup: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.model, Model::Known(KnownModel::Gemini25Pro));
        assert_eq!(
            config.base_url.as_deref(),
            Some("http://localhost:8080/v1beta/")
        );
        assert!(!config.use_color);
        assert_eq!(config.markup_policy, MarkupPolicy::Trusted);
    }

    #[test]
    fn unknown_model_is_custom() {
        let args = ChatArgs {
            model: Some("gemini-experimental".to_string()),
            ..ChatArgs::default()
        };
        assert_eq!(
            ChatConfig::from(args).model,
            Model::Custom("gemini-experimental".to_string())
        );
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_model(Model::Known(KnownModel::Gemini20Flash))
            .with_base_url(Some("http://localhost/".to_string()))
            .without_color()
            .with_markup_policy(MarkupPolicy::Trusted)
            .with_reveal_delay(Duration::from_millis(5));
        assert_eq!(config.model, Model::Known(KnownModel::Gemini20Flash));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost/"));
        assert!(!config.use_color);
        assert_eq!(config.markup_policy, MarkupPolicy::Trusted);
        assert_eq!(config.reveal_delay, Duration::from_millis(5));
    }
}
