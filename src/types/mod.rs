//! Public types for the eggteto API.

mod analysis;
mod payload;

pub use analysis::{AnalysisResult, Classification, MAX_CONFIDENCE};
pub use payload::{Acquisition, EncodedImage, MediaType};
