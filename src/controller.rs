//! Session state machine.
//!
//! ```text
//!            submit                 success
//!   Idle ────────────► Pending ───────────────► Succeeded(result)
//!    ▲                    │                          │
//!    │                    │ failure                  │ retry
//!    │                    ▼                          │
//!    └──── dismiss ── Failed(error) ◄────────────────┘ (retry also)
//! ```
//!
//! The state lives in a `watch` channel: front-ends subscribe and render
//! whatever the current state is. The `Idle → Pending` step is a single
//! atomic check-and-set, so at most one classification is ever in flight.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::providers::FaceClassifier;
use crate::telemetry;
use crate::types::{AnalysisResult, EncodedImage};
use crate::{EggtetoError, Result};

/// What the session is doing right now.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Waiting for an image.
    #[default]
    Idle,
    /// A classification call is in flight.
    Pending,
    /// The last call produced a result.
    Succeeded(AnalysisResult),
    /// The last call failed.
    Failed(EggtetoError),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Pending => "pending",
            SessionState::Succeeded(_) => "succeeded",
            SessionState::Failed(_) => "failed",
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            SessionState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&EggtetoError> {
        match self {
            SessionState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Drives one session: image in, result or error out.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct AppController {
    inner: Arc<Inner>,
}

struct Inner {
    classifier: Arc<dyn FaceClassifier>,
    state: watch::Sender<SessionState>,
}

/// Returns the session to `Idle` if a submit future is dropped mid-flight.
struct PendingGuard<'a> {
    state: &'a watch::Sender<SessionState>,
    settled: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.state.send_replace(SessionState::Idle);
        }
    }
}

impl AppController {
    pub fn new(classifier: Arc<dyn FaceClassifier>) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            inner: Arc::new(Inner { classifier, state }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.inner.state.borrow(), SessionState::Pending)
    }

    /// Submit an encoded image for classification.
    ///
    /// Accepted from `Idle`, and from `Failed` (a new pick replaces the
    /// error). Anything else drops the image and returns `SessionBusy`
    /// without calling the classifier.
    #[instrument(skip(self, image), fields(provider = self.inner.classifier.name()))]
    pub async fn submit(&self, image: EncodedImage) -> Result<AnalysisResult> {
        let mut refused_in = None;
        self.inner.state.send_if_modified(|state| {
            if matches!(state, SessionState::Idle | SessionState::Failed(_)) {
                *state = SessionState::Pending;
                true
            } else {
                refused_in = Some(state.name());
                false
            }
        });
        if let Some(current) = refused_in {
            drop(image);
            debug!(state = current, "submission refused");
            metrics::counter!(telemetry::REJECTED_SUBMISSIONS_TOTAL).increment(1);
            return Err(EggtetoError::SessionBusy(current));
        }

        let mut guard = PendingGuard {
            state: &self.inner.state,
            settled: false,
        };

        let provider = self.inner.classifier.name().to_owned();
        let start = Instant::now();
        // The image moves into the classifier and is gone once this returns.
        let outcome = self.inner.classifier.classify(image).await;
        Self::record_request(&provider, start, &outcome);

        let next = match &outcome {
            Ok(result) => {
                info!(
                    classification = %result.classification(),
                    confidence = result.confidence(),
                    "classification succeeded"
                );
                SessionState::Succeeded(result.clone())
            }
            Err(err) => {
                info!(kind = err.kind(), "classification failed");
                SessionState::Failed(err.clone())
            }
        };
        guard.settled = true;
        self.inner.state.send_replace(next);
        outcome
    }

    /// Clear a displayed error. Only meaningful from `Failed`.
    pub fn dismiss(&self) -> bool {
        self.leave_if(|state| matches!(state, SessionState::Failed(_)))
    }

    /// Discard the held result or error and wait for a new image.
    pub fn retry(&self) -> bool {
        self.leave_if(|state| {
            matches!(state, SessionState::Succeeded(_) | SessionState::Failed(_))
        })
    }

    fn leave_if(&self, allowed: impl Fn(&SessionState) -> bool) -> bool {
        self.inner.state.send_if_modified(|state| {
            if allowed(state) {
                *state = SessionState::Idle;
                true
            } else {
                false
            }
        })
    }

    fn record_request(provider: &str, start: Instant, outcome: &Result<AnalysisResult>) {
        let status = match outcome {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => provider.to_owned(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => provider.to_owned(),
        )
        .record(start.elapsed().as_secs_f64());
    }
}
