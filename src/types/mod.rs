// Public modules
pub mod content;
pub mod generate_content_request;
pub mod generate_content_response;
pub mod generation_config;
pub mod model;
pub mod safety;

// Re-exports
pub use content::{Content, Part, Role};
pub use generate_content_request::GenerateContentRequest;
pub use generate_content_response::{
    BlockReason, Candidate, FinishReason, GenerateContentResponse, PromptFeedback, UsageMetadata,
};
pub use generation_config::GenerationConfig;
pub use model::{KnownModel, Model, ModelParseError};
pub use safety::{HarmBlockThreshold, HarmCategory, HarmProbability, SafetyRating, SafetySetting};
