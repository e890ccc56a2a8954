//! eggteto - Eggen vs Teto face-shape classifier
//!
//! Takes a face photo from a file, a drag-and-drop, or a camera, sends it to
//! a multimodal model with a fixed prompt and a strict response schema, and
//! validates what comes back into an [`AnalysisResult`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use eggteto::config::{Config, Secrets};
//! use eggteto::{Acquisition, AppController, GeminiClient, codec};
//!
//! #[tokio::main]
//! async fn main() -> eggteto::Result<()> {
//!     let config = Config::load(None)?;
//!     let client = GeminiClient::new(&config.service, Secrets::load().api_key())?;
//!     let controller = AppController::new(Arc::new(client));
//!
//!     let image = codec::encode_path(Path::new("selfie.jpg"), Acquisition::Gallery).await?;
//!     let result = controller.submit(image).await?;
//!
//!     println!("{}% {}", result.confidence(), result.classification());
//!     Ok(())
//! }
//! ```

pub mod camera;
pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod presentation;
pub mod providers;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use controller::{AppController, SessionState};
pub use error::{EggtetoError, Result};
pub use providers::{FaceClassifier, GeminiClient};
pub use types::{Acquisition, AnalysisResult, Classification, EncodedImage, MediaType};

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
