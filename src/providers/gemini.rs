//! Google Gemini client for face-shape classification.
//!
//! Uses the `generateContent` REST endpoint with an inline image part, the
//! fixed instruction prompt, and a response schema so the model answers
//! with a single JSON object.
//! See: <https://ai.google.dev/api/generate-content>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::prompt::{INSTRUCTION, TEMPERATURE, response_schema};
use super::traits::FaceClassifier;
use crate::config::ServiceConfig;
use crate::types::{AnalysisResult, EncodedImage};
use crate::{EggtetoError, Result};

/// Default base URL for the Gemini API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default multimodal model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error bodies are cut to this many characters before logging.
const ERROR_BODY_LIMIT: usize = 200;

/// Client for the Gemini `generateContent` API.
///
/// The credential is injected once at construction. A missing credential
/// is not an error here; it surfaces as `ServiceUnavailable` on the first
/// classification.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: Option<String>,
    http: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a client from service configuration.
    pub fn new(config: &ServiceConfig, api_key: Option<String>) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EggtetoError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout,
        })
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let config = ServiceConfig {
            base_url: base_url.into(),
            ..ServiceConfig::default()
        };
        Self::new(&config, Some(api_key.into()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Send one image for classification.
    ///
    /// Exactly one request is made; there is no retry.
    #[instrument(
        skip(self, image),
        fields(
            provider = "gemini",
            model = %self.model,
            media_type = %image.media_type(),
            bytes = image.len()
        )
    )]
    pub async fn analyze(&self, image: EncodedImage) -> Result<AnalysisResult> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(EggtetoError::ServiceUnavailable(
                "no API key configured".to_string(),
            ));
        };

        let request = GenerateContentRequest::new(&image);
        // The payload now lives only in the request body.
        drop(image);

        let sent = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await;
        drop(request);

        let response = sent.map_err(|e| self.transport_error(e))?;
        let response = Self::check_status(response).await?;

        let envelope: GenerateContentResponse = response.json().await.map_err(|e| {
            EggtetoError::ServiceUnavailable(format!("undecodable response envelope: {e}"))
        })?;

        let text = envelope.text();
        if text.trim().is_empty() {
            debug!(
                finish_reason = envelope.finish_reason().unwrap_or("none"),
                block_reason = envelope.block_reason().unwrap_or("none"),
                "no text in response"
            );
            return Err(EggtetoError::EmptyResponse);
        }

        AnalysisResult::from_response_text(&text)
    }

    fn transport_error(&self, err: reqwest::Error) -> EggtetoError {
        if err.is_timeout() {
            EggtetoError::ServiceUnavailable(format!(
                "request timed out after {}s",
                self.timeout.as_secs()
            ))
        } else if err.is_connect() {
            EggtetoError::ServiceUnavailable(format!("connection failed: {err}"))
        } else {
            EggtetoError::ServiceUnavailable(format!("HTTP error: {err}"))
        }
    }

    /// Map non-success statuses to `ServiceUnavailable` with a diagnostic.
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(ERROR_BODY_LIMIT)
            .collect();

        let detail = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                format!("credential rejected ({status})")
            }
            StatusCode::NOT_FOUND => format!("model not found ({status})"),
            StatusCode::TOO_MANY_REQUESTS => format!(
                "rate limited, retry after {}",
                retry_after.as_deref().unwrap_or("unspecified")
            ),
            _ => format!("API error ({status})"),
        };
        Err(EggtetoError::ServiceUnavailable(format!("{detail}: {body}")))
    }
}

#[async_trait]
impl FaceClassifier for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn classify(&self, image: EncodedImage) -> Result<AnalysisResult> {
        self.analyze(image).await.inspect_err(|e| {
            warn!(provider = "gemini", kind = e.kind(), error = %e, "classification failed");
        })
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn new(image: &EncodedImage) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.media_type().to_string(),
                            data: image.to_base64(),
                        },
                    },
                    Part::Text { text: INSTRUCTION },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
                temperature: TEMPERATURE,
            },
        }
    }
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: &'static str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated in order.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }
}
