use crate::{Detection, JobId, SummaryOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelMsg {
    /// User edited the video URL field.
    VideoUrlEdited(String),
    /// User clicked Detect.
    DetectClicked,
    /// Content relay answered `detectVideo`.
    DetectReplied(Detection),
    /// `detectVideo` got no answer.
    DetectFailed { detail: String },
    /// User clicked Summarize.
    SummarizeClicked,
    /// Background pushed `updateProgress`.
    ProgressPushed { job_id: JobId, progress: u8 },
    /// Terminal answer to `summarizeVideo`.
    SummarizeReplied(SummaryOutcome),
    /// `summarizeVideo` got no answer.
    SummarizeFailed { detail: String },
    /// User clicked Cancel while a summary is running.
    CancelClicked,
    /// User clicked Export.
    ExportClicked,
    /// Clipboard write finished.
    ClipboardWritten(Result<(), String>),
    /// UI tick used to expire transient confirmations.
    Tick,
    /// Panel is going away; later messages are ignored.
    Closed,
    NoOp,
}
