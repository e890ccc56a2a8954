//! eggteto error types

/// Shown for every classification failure, whatever the underlying cause.
pub const ANALYSIS_FAILED_MESSAGE: &str = "얼굴을 분석하는 데 실패했습니다. 다시 시도해주세요.";

/// Shown when the user offers something that is not an image.
pub const INVALID_INPUT_MESSAGE: &str = "이미지 파일만 업로드해주세요.";

/// Shown when a submission arrives while the session cannot accept one.
pub const SESSION_BUSY_MESSAGE: &str = "이미 분석 중입니다. 잠시만 기다려주세요.";

/// Shown when the camera cannot deliver a frame.
pub const CAMERA_FAILED_MESSAGE: &str = "카메라를 사용할 수 없습니다. 사진을 업로드해주세요.";

/// Fallback for local failures (configuration, I/O).
pub const GENERIC_FAILURE_MESSAGE: &str = "분석 중 오류가 발생했습니다.";

/// eggteto error types
///
/// The variants carry diagnostic detail for logs. What the user sees is
/// [`EggtetoError::user_message`], which collapses all
/// classification failures into one string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EggtetoError {
    // Local input validation
    #[error("not an image: {0}")]
    InvalidInputKind(String),

    // Classification failures
    #[error("empty response from classification service")]
    EmptyResponse,

    #[error("malformed classification response: {0}")]
    MalformedResponse(String),

    #[error("classification service unavailable: {0}")]
    ServiceUnavailable(String),

    // Session errors
    #[error("cannot submit while the session is {0}")]
    SessionBusy(&'static str),

    // Environment errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("camera error: {0}")]
    Camera(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for EggtetoError {
    fn from(err: std::io::Error) -> Self {
        EggtetoError::Io(err.to_string())
    }
}

impl EggtetoError {
    /// True for the three failures the classification service can cause.
    pub fn is_classification_failure(&self) -> bool {
        matches!(
            self,
            EggtetoError::EmptyResponse
                | EggtetoError::MalformedResponse(_)
                | EggtetoError::ServiceUnavailable(_)
        )
    }

    /// Short stable label for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            EggtetoError::InvalidInputKind(_) => "invalid_input_kind",
            EggtetoError::EmptyResponse => "empty_response",
            EggtetoError::MalformedResponse(_) => "malformed_response",
            EggtetoError::ServiceUnavailable(_) => "service_unavailable",
            EggtetoError::SessionBusy(_) => "session_busy",
            EggtetoError::Configuration(_) => "configuration",
            EggtetoError::Camera(_) => "camera",
            EggtetoError::Io(_) => "io",
        }
    }

    /// The localized message to show the user.
    ///
    /// Never includes the diagnostic detail carried by the variant.
    pub fn user_message(&self) -> &'static str {
        match self {
            EggtetoError::EmptyResponse
            | EggtetoError::MalformedResponse(_)
            | EggtetoError::ServiceUnavailable(_) => ANALYSIS_FAILED_MESSAGE,
            EggtetoError::InvalidInputKind(_) => INVALID_INPUT_MESSAGE,
            EggtetoError::SessionBusy(_) => SESSION_BUSY_MESSAGE,
            EggtetoError::Camera(_) => CAMERA_FAILED_MESSAGE,
            EggtetoError::Configuration(_) | EggtetoError::Io(_) => GENERIC_FAILURE_MESSAGE,
        }
    }
}

/// Result type alias for eggteto operations
pub type Result<T> = std::result::Result<T, EggtetoError>;
