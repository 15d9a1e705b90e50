// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod markup;
pub mod model_client;
pub mod reveal;
pub mod types;

mod observability;

// Re-exports
pub use client::Gemini;
pub use error::{Error, Result};
pub use markup::{MarkupPolicy, render_markup, transform};
pub use model_client::{FALLBACK_RESPONSE, GeminiModelClient, ModelClient};
pub use observability::register_biometrics;
pub use reveal::{RevealHandle, RevealScheduler, RevealState};
pub use types::*;
