//! Job status labels and the overall-status merge rule.
//!
//! The service reports one label per sub-job:
//!
//! ```text
//!   Submitted ──→ Queued ──→ Running ──→ Done
//!                   │           │
//!                   │           ├──→ Error
//!                   │           │
//!                   └───────────┴──→ Canceled
//! ```
//!
//! The remote service is authoritative; no transition is enforced locally.
//! `Done`, `Error` and `Canceled` are terminal. Any label outside the known
//! vocabulary is kept verbatim as [`JobStatus::Other`] and treated as
//! non-terminal, so polling continues instead of declaring success.

use serde::{Deserialize, Serialize};

/// Status label of a job or sub-job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    /// Accepted by the service but not yet queued.
    Submitted,
    /// Waiting in a device queue.
    Queued,
    /// Executing.
    Running,
    /// Finished successfully.
    Done,
    /// Finished with an error.
    Error,
    /// Canceled before completion.
    Canceled,
    /// A label this client does not know.
    Other(String),
}

impl JobStatus {
    /// Labels from which no further transition is expected.
    pub const TERMINAL: [JobStatus; 3] = [JobStatus::Done, JobStatus::Canceled, JobStatus::Error];

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error | JobStatus::Canceled)
    }

    /// Check if the job ended without producing results.
    pub fn is_unsuccessful(&self) -> bool {
        matches!(self, JobStatus::Error | JobStatus::Canceled)
    }

    /// Check if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Done)
    }

    /// The label as reported by the service.
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Submitted => "Submitted",
            JobStatus::Queued => "Queued",
            JobStatus::Running => "Running",
            JobStatus::Done => "Done",
            JobStatus::Error => "Error",
            JobStatus::Canceled => "Canceled",
            JobStatus::Other(label) => label,
        }
    }

    /// Merge sub-job statuses into one overall status.
    ///
    /// Precedence, first match wins: any `Error`, any `Canceled`, any
    /// `Submitted` or unknown label (the first one encountered), any
    /// `Queued`, any `Running`, otherwise `Done`. The aggregate is only as
    /// far along as its worst sub-job. An empty input yields `Submitted`.
    pub fn merge<'a>(statuses: impl IntoIterator<Item = &'a JobStatus>) -> JobStatus {
        let mut worst: Option<&JobStatus> = None;
        for status in statuses {
            if worst.is_none_or(|w| status.severity() < w.severity()) {
                worst = Some(status);
            }
        }
        worst.cloned().unwrap_or(JobStatus::Submitted)
    }

    /// Merge rank; lower means more severe or less progressed.
    fn severity(&self) -> u8 {
        match self {
            JobStatus::Error => 0,
            JobStatus::Canceled => 1,
            JobStatus::Submitted | JobStatus::Other(_) => 2,
            JobStatus::Queued => 3,
            JobStatus::Running => 4,
            JobStatus::Done => 5,
        }
    }
}

impl From<&str> for JobStatus {
    fn from(label: &str) -> Self {
        match label {
            "Submitted" => JobStatus::Submitted,
            "Queued" => JobStatus::Queued,
            "Running" => JobStatus::Running,
            "Done" => JobStatus::Done,
            "Error" => JobStatus::Error,
            "Canceled" => JobStatus::Canceled,
            other => JobStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for JobStatus {
    fn from(label: String) -> Self {
        match JobStatus::from(label.as_str()) {
            JobStatus::Other(_) => JobStatus::Other(label),
            known => known,
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
