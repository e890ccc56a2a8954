//! Classification providers.
//!
//! [`FaceClassifier`] is the seam between the session controller and the
//! external multimodal model; [`GeminiClient`] is the production
//! implementation.

pub mod gemini;
pub mod prompt;
pub mod traits;

pub use gemini::GeminiClient;
pub use traits::FaceClassifier;
