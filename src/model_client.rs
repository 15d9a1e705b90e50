//! Single-turn access to the hosted model.
//!
//! [`GeminiModelClient`] sends one prompt with a fixed sampling and safety
//! configuration and returns the answer text.  Every failure, including a
//! safety block, is logged and replaced by [`FALLBACK_RESPONSE`]; callers
//! cannot tell failure causes apart.

use crate::client::Gemini;
use crate::error::Result;
use crate::observability::CLIENT_FALLBACKS;
use crate::types::{
    GenerateContentRequest, GenerationConfig, HarmBlockThreshold, HarmCategory, Model,
    SafetySetting,
};

/// Text returned in place of an answer when the model call fails.
pub const FALLBACK_RESPONSE: &str = "Sorry, something went wrong while contacting the AI (maybe quota limit). Please try again in a bit.";

/// Sampling temperature sent with every request.
pub const TEMPERATURE: f32 = 0.9;

/// Top-k sent with every request.
pub const TOP_K: u32 = 1;

/// Something that can answer a prompt.
///
/// `Ok` carries the raw model text, which may be a fallback message.  `Err`
/// is reserved for failures the implementation could not absorb itself.
///
/// ```
/// # use chatbox::{ModelClient, Result};
/// struct Echo;
///
/// #[async_trait::async_trait]
/// impl ModelClient for Echo {
///     async fn send(&self, prompt: &str) -> Result<String> {
///         Ok(format!("**{prompt}**"))
///     }
/// }
///
/// # tokio_test::block_on(async {
/// assert_eq!(Echo.send("hi").await.unwrap(), "**hi**");
/// # });
/// ```
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    /// Answers `prompt`.
    async fn send(&self, prompt: &str) -> Result<String>;
}

/// The generation config used for every request.
pub fn generation_config() -> GenerationConfig {
    GenerationConfig::new()
        .with_temperature(TEMPERATURE)
        .with_top_k(TOP_K)
}

/// The safety settings used for every request.
pub fn safety_settings() -> Vec<SafetySetting> {
    vec![
        SafetySetting::new(
            HarmCategory::Harassment,
            HarmBlockThreshold::BlockMediumAndAbove,
        ),
        SafetySetting::new(
            HarmCategory::DangerousContent,
            HarmBlockThreshold::BlockMediumAndAbove,
        ),
    ]
}

/// Builds the request for `prompt`: one user message, no history.
pub fn build_request(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest::single_turn(prompt)
        .with_generation_config(generation_config())
        .with_safety_settings(safety_settings())
}

/// [`ModelClient`] backed by the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiModelClient {
    client: Gemini,
    model: Model,
}

impl GeminiModelClient {
    /// Creates a model client for `model`.
    pub fn new(client: Gemini, model: Model) -> Self {
        Self { client, model }
    }

    /// The model requests are sent to.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Sends `prompt` and returns the answer or [`FALLBACK_RESPONSE`].
    ///
    /// A blank prompt returns an empty string without contacting the
    /// service.
    pub async fn send(&self, prompt: &str) -> String {
        if prompt.trim().is_empty() {
            return String::new();
        }
        tracing::debug!(model = %self.model, prompt, "sending prompt");
        let request = build_request(prompt);
        let outcome = match self.client.generate_content(&self.model, &request).await {
            Ok(response) => response.text(),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(text) => {
                tracing::debug!(model = %self.model, response = %text, "received response");
                text
            }
            Err(err) => {
                CLIENT_FALLBACKS.click();
                tracing::error!(model = %self.model, error = %err, "model call failed");
                FALLBACK_RESPONSE.to_string()
            }
        }
    }
}

#[async_trait::async_trait]
impl ModelClient for GeminiModelClient {
    async fn send(&self, prompt: &str) -> Result<String> {
        Ok(GeminiModelClient::send(self, prompt).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> GeminiModelClient {
        let client = Gemini::with_options(
            Some("test-key".to_string()),
            Some("http://127.0.0.1:9/".to_string()),
        )
        .unwrap();
        GeminiModelClient::new(client, Model::default())
    }

    #[test]
    fn request_has_fixed_configuration() {
        // Round-trip through text so the f32 temperature compares as written.
        let wire = serde_json::to_string(&build_request("Hello")).unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&wire).unwrap(),
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "Hello"}]}],
                "generationConfig": {"temperature": 0.9, "topK": 1},
                "safetySettings": [
                    {"category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE"},
                    {"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE"}
                ]
            })
        );
    }

    #[tokio::test]
    async fn blank_prompt_short_circuits() {
        let client = unreachable_client();
        assert_eq!(GeminiModelClient::send(&client, "").await, "");
        assert_eq!(GeminiModelClient::send(&client, "  \t ").await, "");
    }

    #[tokio::test]
    async fn transport_failure_becomes_fallback() {
        let client = unreachable_client();
        assert_eq!(
            GeminiModelClient::send(&client, "Hello").await,
            FALLBACK_RESPONSE
        );
        let via_trait: &dyn ModelClient = &client;
        assert_eq!(via_trait.send("Hello").await.unwrap(), FALLBACK_RESPONSE);
    }
}
