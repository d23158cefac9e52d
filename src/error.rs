//! Client error types.
//!
//! Errors are categorized by where they originate:
//!
//! | Category | Variants | Recovery |
//! |----------|----------|----------|
//! | **Service** | `Transport`, `NotFound`, `Authentication`, `Api` | Retry (transport only) or fix request |
//! | **Job-level** | `Timeout`, `UnsuccessfulJob`, `NotImplemented` | Wait longer, resubmit, or use the backend |
//! | **Input** | `InvalidJobId`, `InvalidTarget`, `InvalidInput` | Fix input |
//! | **Config** | `Configuration`, `Serialization` | Fix configuration |

use thiserror::Error;

use crate::job::JobPayload;
use crate::status::JobStatus;

/// Errors that can occur while talking to Superstaq or tracking a job.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SuperstaqError {
    // ── Service errors (raised by the client) ────────────────────────
    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service does not know the requested resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API key was rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Any other non-success response from the service.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    // ── Job-level errors ─────────────────────────────────────────────
    /// Polling did not reach a terminal status in time.
    #[error("Timed out waiting for job {job_id} (last status: {last_status})")]
    Timeout {
        /// Composite job id.
        job_id: String,
        /// Overall status observed by the last refresh.
        last_status: JobStatus,
    },

    /// The job finished as `Error` or `Canceled`.
    #[error("Job {job_id} terminated with status {status}")]
    UnsuccessfulJob {
        /// Composite job id.
        job_id: String,
        /// Terminal overall status.
        status: JobStatus,
        /// Payload of the first sub-job that carried the status, if known.
        payload: Option<Box<JobPayload>>,
    },

    /// The operation is deliberately unsupported.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    // ── Input errors ─────────────────────────────────────────────────
    /// Malformed composite job id.
    #[error("Invalid job id: {0}")]
    InvalidJobId(String),

    /// Malformed or unsupported target name.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Invalid request arguments (empty batch, zero shots, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ── Config errors ────────────────────────────────────────────────
    /// Configuration error (missing API key, bad URL).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SuperstaqError {
    /// Returns `true` if the same request may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` for 404-style errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Api { status: 404, .. })
    }

    /// Returns `true` if the API key was rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_)
                | Self::Api {
                    status: 401 | 403,
                    ..
                }
        )
    }
}

impl From<reqwest::Error> for SuperstaqError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result type for client operations.
pub type SuperstaqResult<T> = Result<T, SuperstaqError>;
