use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Content, SafetyRating};

/// Why a candidate stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    /// Natural stop point or stop sequence.
    Stop,
    /// Token limit reached.
    MaxTokens,
    /// Flagged by the safety policy.
    Safety,
    /// Flagged for recitation.
    Recitation,
    /// Unsupported language.
    Language,
    /// Blocklisted terms.
    Blocklist,
    /// Prohibited content.
    ProhibitedContent,
    /// Sensitive personally identifiable information.
    Spii,
    /// Some other reason.
    Other,
    /// A reason this crate does not know about.
    #[serde(other)]
    FinishReasonUnspecified,
}

impl FinishReason {
    /// True for reasons that mean the candidate's text must not be used.
    pub fn is_blocked(self) -> bool {
        matches!(
            self,
            FinishReason::Safety | FinishReason::Recitation | FinishReason::Language
        )
    }
}

/// Why the prompt itself was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    /// Blocked for safety.
    Safety,
    /// Blocklisted terms.
    Blocklist,
    /// Prohibited content.
    ProhibitedContent,
    /// Some other reason.
    Other,
    /// A reason this crate does not know about.
    #[serde(other)]
    BlockReasonUnspecified,
}

/// Feedback on the prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Set when the prompt was blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<BlockReason>,

    /// Ratings for the prompt.
    #[serde(default)]
    pub safety_ratings: Vec<SafetyRating>,
}

/// One generated response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content; absent when the candidate was blocked outright.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    /// Why generation stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,

    /// Ratings for the candidate.
    #[serde(default)]
    pub safety_ratings: Vec<SafetyRating>,

    /// Index in the response.
    #[serde(default)]
    pub index: u32,
}

/// Token accounting for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt.
    #[serde(default)]
    pub prompt_token_count: u64,
    /// Tokens across all candidates.
    #[serde(default)]
    pub candidates_token_count: u64,
    /// Prompt plus candidates.
    #[serde(default)]
    pub total_token_count: u64,
}

/// Response of `models/{model}:generateContent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated candidates.
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// Feedback on the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,

    /// Token accounting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,

    /// Version of the model that served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl GenerateContentResponse {
    /// Returns the text of the first candidate.
    ///
    /// A blocked prompt or a candidate that finished for a safety-related
    /// reason is reported as [`Error::Blocked`], as is a response that has
    /// prompt feedback but no candidates.  Without either it yields an empty
    /// string.
    pub fn text(&self) -> Result<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(Error::blocked(
                "prompt was blocked",
                Some(format!("{reason:?}")),
            ));
        }
        let Some(candidate) = self.candidates.first() else {
            if self.prompt_feedback.is_some() {
                return Err(Error::blocked("response contained no candidates", None));
            }
            return Ok(String::new());
        };
        if let Some(reason) = candidate.finish_reason
            && reason.is_blocked()
        {
            return Err(Error::blocked(
                "candidate was blocked",
                Some(format!("{reason:?}")),
            ));
        }
        Ok(candidate
            .content
            .as_ref()
            .map(Content::text)
            .unwrap_or_default())
    }
}
