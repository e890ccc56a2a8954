//! Classifier trait.
//!
//! The controller only knows `FaceClassifier`; tests substitute a stub, the
//! binary wires in [`GeminiClient`](super::GeminiClient).

use async_trait::async_trait;

use crate::Result;
use crate::types::{AnalysisResult, EncodedImage};

/// A service that turns one face photo into an [`AnalysisResult`].
///
/// Implementations make exactly one attempt per call. The image is taken
/// by value so it is released as soon as the call settles.
#[async_trait]
pub trait FaceClassifier: Send + Sync {
    /// Provider name for logging and metric labels.
    fn name(&self) -> &str;

    /// Classify the image.
    ///
    /// Fails with `EmptyResponse`, `MalformedResponse` or
    /// `ServiceUnavailable`.
    async fn classify(&self, image: EncodedImage) -> Result<AnalysisResult>;
}
