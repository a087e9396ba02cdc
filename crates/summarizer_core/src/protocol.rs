//! Messages exchanged between the background, content and panel contexts.
//!
//! On the wire every message is a JSON object keyed by `action`, e.g.
//! `{"action":"summarizeVideo","videoUrl":"https://youtu.be/x"}`. Receivers
//! match on the decoded [`Message`]; actions this build does not know decode to
//! [`Message::Unknown`] so newer senders never crash older receivers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::JobFailureReason;

/// Opaque browser tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

pub type JobId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    /// Content relay asks the background whether its tab's sidebar is open.
    GetSidebarState,
    /// Background tells a content relay to show or hide the sidebar.
    ToggleSidebar { open: bool },
    /// Panel asks the active tab's content relay for a playable video.
    DetectVideo,
    /// Panel asks the background to summarize a video.
    #[serde(rename_all = "camelCase")]
    SummarizeVideo { video_url: String },
    /// Background pushes job progress to whoever requested the summary.
    #[serde(rename_all = "camelCase")]
    UpdateProgress { progress: u8, job_id: JobId },
    /// Panel asks the background to cancel the running job.
    CancelSummary,
    #[serde(other)]
    Unknown,
}

impl Message {
    pub fn action(&self) -> &'static str {
        match self {
            Message::GetSidebarState => "getSidebarState",
            Message::ToggleSidebar { .. } => "toggleSidebar",
            Message::DetectVideo => "detectVideo",
            Message::SummarizeVideo { .. } => "summarizeVideo",
            Message::UpdateProgress { .. } => "updateProgress",
            Message::CancelSummary => "cancelSummary",
            Message::Unknown => "unknown",
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Response payload delivered to the original caller of a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    SidebarState(SidebarState),
    Detection(Detection),
    Summary(SummaryOutcome),
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SidebarState {
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub video_url: Option<String>,
}

impl Detection {
    pub fn found(url: impl Into<String>) -> Self {
        Self {
            video_url: Some(url.into()),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Terminal answer to `summarizeVideo`.
///
/// Serialized as `{"success":true,"resultUrl":..}` or
/// `{"success":false,"reason":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SummaryWire", try_from = "SummaryWire")]
pub enum SummaryOutcome {
    Completed { result_url: String },
    Failed { reason: JobFailureReason },
}

impl SummaryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SummaryOutcome::Completed { .. })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<JobFailureReason>,
}

impl From<SummaryOutcome> for SummaryWire {
    fn from(outcome: SummaryOutcome) -> Self {
        match outcome {
            SummaryOutcome::Completed { result_url } => Self {
                success: true,
                result_url: Some(result_url),
                reason: None,
            },
            SummaryOutcome::Failed { reason } => Self {
                success: false,
                result_url: None,
                reason: Some(reason),
            },
        }
    }
}

impl TryFrom<SummaryWire> for SummaryOutcome {
    type Error = String;

    fn try_from(wire: SummaryWire) -> Result<Self, Self::Error> {
        match (wire.success, wire.result_url, wire.reason) {
            (true, Some(result_url), _) => Ok(SummaryOutcome::Completed { result_url }),
            (true, None, _) => Err("successful summary without resultUrl".to_string()),
            (false, _, Some(reason)) => Ok(SummaryOutcome::Failed { reason }),
            (false, _, None) => Err("failed summary without reason".to_string()),
        }
    }
}
