use crate::PanelError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelStatus {
    #[default]
    Idle,
    Detecting,
    Detected,
    Processing,
    Cancelling,
    Summarized,
    Exported,
    Failed(PanelError),
}

impl PanelStatus {
    pub fn text(&self) -> String {
        match self {
            PanelStatus::Idle => String::new(),
            PanelStatus::Detecting => "Detecting video...".to_string(),
            PanelStatus::Detected => "Video detected successfully!".to_string(),
            PanelStatus::Processing => "Processing video...".to_string(),
            PanelStatus::Cancelling => "Cancelling...".to_string(),
            PanelStatus::Summarized => "Video summarized successfully!".to_string(),
            PanelStatus::Exported => "Processed video URL copied to clipboard!".to_string(),
            PanelStatus::Failed(err) => err.to_string(),
        }
    }

    pub fn error(&self) -> Option<&PanelError> {
        match self {
            PanelStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelView {
    pub video_url: String,
    pub progress: u8,
    pub status: PanelStatus,
    pub status_text: String,
    pub summary_output: Option<String>,
    pub result_url: Option<String>,
    pub detecting: bool,
    pub summarizing: bool,
    pub confirmation_visible: bool,
    pub closed: bool,
    pub dirty: bool,
}
