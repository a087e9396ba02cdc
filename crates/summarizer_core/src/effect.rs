#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEffect {
    SendDetectVideo,
    SendSummarizeVideo { video_url: String },
    SendCancelSummary,
    WriteClipboard { text: String },
}
