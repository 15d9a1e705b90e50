use serde::{Deserialize, Serialize};

/// Categories the safety policy can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmCategory {
    /// Harassment content.
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,

    /// Hate speech.
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,

    /// Sexually explicit content.
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,

    /// Dangerous content.
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,

    /// Civic integrity.
    #[serde(rename = "HARM_CATEGORY_CIVIC_INTEGRITY")]
    CivicIntegrity,

    /// A category this crate does not know about.
    #[serde(other)]
    Unknown,
}

/// The probability level at which content is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    /// Block low, medium and high probability content.
    BlockLowAndAbove,

    /// Block medium and high probability content.
    BlockMediumAndAbove,

    /// Block only high probability content.
    BlockOnlyHigh,

    /// Never block.
    BlockNone,

    /// Turn the filter off.
    Off,
}

/// One entry of the request's `safetySettings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    /// The filtered category.
    pub category: HarmCategory,

    /// The block threshold for the category.
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// Creates a safety setting.
    pub fn new(category: HarmCategory, threshold: HarmBlockThreshold) -> Self {
        Self {
            category,
            threshold,
        }
    }
}

/// Probability that content falls into a harm category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmProbability {
    /// Negligible.
    Negligible,
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
    /// Unspecified or unknown.
    #[serde(other)]
    HarmProbabilityUnspecified,
}

/// Per-category rating attached to prompts and candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyRating {
    /// The rated category.
    pub category: HarmCategory,

    /// The assessed probability.
    pub probability: HarmProbability,

    /// Whether this rating caused a block.
    #[serde(default)]
    pub blocked: bool,
}
