//! Classification result types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EggtetoError, Result};

/// Face-shape category produced by the classification service.
///
/// Closed set: anything else coming back from the service is a validation
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Smooth, round, oval contours (primary variant).
    Eggen,
    /// Sharp, angular, defined jawline (secondary variant).
    Teto,
    /// The service could not decide.
    Unknown,
}

impl Classification {
    /// Wire name, as used in the response schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Eggen => "Eggen",
            Classification::Teto => "Teto",
            Classification::Unknown => "Unknown",
        }
    }

    /// Korean display label.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Eggen => "에겐",
            Classification::Teto => "테토",
            Classification::Unknown => "미확인",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated output of one successful classification call.
///
/// Fields are private so the only ways in are [`AnalysisResult::new`] and
/// deserialization, both of which run the same validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireAnalysis")]
pub struct AnalysisResult {
    #[serde(rename = "type")]
    classification: Classification,
    #[serde(rename = "percentage")]
    confidence: u8,
    title: String,
    description: String,
    #[serde(rename = "stylingTips")]
    styling_tips: Vec<String>,
    #[serde(rename = "celebrityLookalikes")]
    lookalikes: Vec<String>,
}

/// Highest confidence value the service may report.
pub const MAX_CONFIDENCE: i64 = 100;

impl AnalysisResult {
    /// Build a result, validating confidence range and title.
    pub fn new(
        classification: Classification,
        confidence: i64,
        title: impl Into<String>,
        description: impl Into<String>,
        styling_tips: Vec<String>,
        lookalikes: Vec<String>,
    ) -> Result<Self> {
        let confidence = u8::try_from(confidence)
            .ok()
            .filter(|c| i64::from(*c) <= MAX_CONFIDENCE)
            .ok_or_else(|| {
                EggtetoError::MalformedResponse(format!(
                    "confidence {confidence} outside 0..={MAX_CONFIDENCE}"
                ))
            })?;

        let title = title.into();
        if title.trim().is_empty() {
            return Err(EggtetoError::MalformedResponse("title is empty".to_string()));
        }

        Ok(Self {
            classification,
            confidence,
            title,
            description: description.into(),
            styling_tips,
            lookalikes,
        })
    }

    /// Parse the raw text returned by the service.
    ///
    /// Empty (or whitespace-only) text is `EmptyResponse`; anything that
    /// does not satisfy the schema is `MalformedResponse`.
    pub fn from_response_text(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(EggtetoError::EmptyResponse);
        }
        serde_json::from_str(text).map_err(|e| EggtetoError::MalformedResponse(e.to_string()))
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Confidence in percent, always within `0..=100`.
    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn styling_tips(&self) -> &[String] {
        &self.styling_tips
    }

    pub fn lookalikes(&self) -> &[String] {
        &self.lookalikes
    }
}

/// Shape of the JSON object the service is asked to produce.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnalysis {
    #[serde(rename = "type")]
    classification: Classification,
    percentage: i64,
    title: String,
    description: String,
    styling_tips: Vec<String>,
    celebrity_lookalikes: Vec<String>,
}

impl TryFrom<WireAnalysis> for AnalysisResult {
    type Error = String;

    fn try_from(wire: WireAnalysis) -> std::result::Result<Self, Self::Error> {
        AnalysisResult::new(
            wire.classification,
            wire.percentage,
            wire.title,
            wire.description,
            wire.styling_tips,
            wire.celebrity_lookalikes,
        )
        .map_err(|e| e.to_string())
    }
}
