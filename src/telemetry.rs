//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus,
//! statsd); without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `eggteto_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: classifier name (e.g. "gemini")
//! - `status`: outcome: "ok" or the error kind (e.g. "malformed_response")

/// Total classification requests dispatched by the session controller.
///
/// Labels: `provider`, `status`.
pub const REQUESTS_TOTAL: &str = "eggteto_requests_total";

/// Classification duration in seconds.
///
/// Labels: `provider`.
pub const REQUEST_DURATION_SECONDS: &str = "eggteto_request_duration_seconds";

/// Submissions refused because a classification was already pending.
pub const REJECTED_SUBMISSIONS_TOTAL: &str = "eggteto_rejected_submissions_total";
