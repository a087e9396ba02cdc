use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Why a job ended in `Failed` (or was never started).
///
/// Travels on the wire as a plain string such as `"AlreadyRunning"` or
/// `"Backend: http status 502"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum JobFailureReason {
    AlreadyRunning,
    EmptyVideoUrl,
    Cancelled,
    Backend(String),
}

impl JobFailureReason {
    /// Human-readable wording for status lines.
    pub fn describe(&self) -> String {
        match self {
            JobFailureReason::AlreadyRunning => "another video is still being summarized".into(),
            JobFailureReason::EmptyVideoUrl => "the video URL was empty".into(),
            JobFailureReason::Cancelled => "the job was cancelled".into(),
            JobFailureReason::Backend(detail) => format!("processing error ({detail})"),
        }
    }
}

impl fmt::Display for JobFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobFailureReason::AlreadyRunning => write!(f, "AlreadyRunning"),
            JobFailureReason::EmptyVideoUrl => write!(f, "EmptyVideoUrl"),
            JobFailureReason::Cancelled => write!(f, "Cancelled"),
            JobFailureReason::Backend(detail) => write!(f, "Backend: {detail}"),
        }
    }
}

impl FromStr for JobFailureReason {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "AlreadyRunning" => Ok(JobFailureReason::AlreadyRunning),
            "EmptyVideoUrl" => Ok(JobFailureReason::EmptyVideoUrl),
            "Cancelled" => Ok(JobFailureReason::Cancelled),
            other => match other.strip_prefix("Backend:") {
                Some(detail) => Ok(JobFailureReason::Backend(detail.trim().to_string())),
                None => Err(format!("unknown job failure reason {other:?}")),
            },
        }
    }
}

impl From<JobFailureReason> for String {
    fn from(reason: JobFailureReason) -> Self {
        reason.to_string()
    }
}

impl TryFrom<String> for JobFailureReason {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

/// Everything the panel can report to the user. The `Display` text is the
/// status line shown for the failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    #[error("A video is already being summarized. Please wait for it to finish.")]
    AlreadyRunning,
    #[error("Please enter a video URL or detect a video first.")]
    MissingInput,
    #[error("Please summarize a video first.")]
    NothingToExport,
    #[error("No video detected on the page.")]
    NoVideoDetected,
    #[error("Could not reach the page or background: {detail}")]
    TransportFailure { detail: String },
    #[error("Summarization failed: {}", .reason.describe())]
    JobFailure { reason: JobFailureReason },
    #[error("Failed to copy URL. Please try again.")]
    ClipboardFailure,
}

impl From<JobFailureReason> for PanelError {
    fn from(reason: JobFailureReason) -> Self {
        match reason {
            JobFailureReason::AlreadyRunning => PanelError::AlreadyRunning,
            reason => PanelError::JobFailure { reason },
        }
    }
}
