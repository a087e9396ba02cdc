use crate::view_model::{PanelStatus, PanelView};
use crate::{JobId, PanelError, PROGRESS_MAX};

/// Ticks the "copied" confirmation stays visible after an export.
pub const CONFIRMATION_TICKS: u8 = 20;

/// Panel-local UI state. Nothing here is authoritative; it only mirrors what
/// the background and content relay last answered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelState {
    video_url_input: String,
    detected_url: Option<String>,
    detecting: bool,
    summarizing: bool,
    job_id: Option<JobId>,
    submitted_url: Option<String>,
    progress: u8,
    result_url: Option<String>,
    status: PanelStatus,
    confirmation_ticks: u8,
    closed: bool,
    dirty: bool,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> PanelView {
        let summary_output = match (&self.submitted_url, &self.result_url) {
            (Some(original), Some(result)) => Some(format!(
                "Original video: {original}\nSummarized video: {result}"
            )),
            _ => None,
        };
        PanelView {
            video_url: self.video_url_input.clone(),
            progress: self.progress,
            status: self.status.clone(),
            status_text: self.status.text(),
            summary_output,
            result_url: self.result_url.clone(),
            detecting: self.detecting,
            summarizing: self.summarizing,
            confirmation_visible: self.confirmation_ticks > 0,
            closed: self.closed,
            dirty: self.dirty,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_summarizing(&self) -> bool {
        self.summarizing
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_status(&mut self, status: PanelStatus) {
        self.status = status;
        self.mark_dirty();
    }

    pub(crate) fn fail(&mut self, err: PanelError) {
        self.set_status(PanelStatus::Failed(err));
    }

    pub(crate) fn set_video_url_input(&mut self, url: String) {
        self.video_url_input = url;
        self.mark_dirty();
    }

    /// The URL Summarize would submit: the edited field, else the last detection.
    pub(crate) fn summarize_target(&self) -> Option<String> {
        let typed = self.video_url_input.trim();
        if !typed.is_empty() {
            return Some(typed.to_string());
        }
        self.detected_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(ToOwned::to_owned)
    }

    pub(crate) fn is_detecting(&self) -> bool {
        self.detecting
    }

    pub(crate) fn begin_detection(&mut self) {
        self.detecting = true;
        self.set_status(PanelStatus::Detecting);
    }

    pub(crate) fn finish_detection(&mut self, url: Option<String>) {
        self.detecting = false;
        match url {
            Some(url) => {
                self.video_url_input = url.clone();
                self.detected_url = Some(url);
                self.set_status(PanelStatus::Detected);
            }
            None => self.fail(PanelError::NoVideoDetected),
        }
    }

    pub(crate) fn abort_detection(&mut self, detail: String) {
        self.detecting = false;
        self.fail(PanelError::TransportFailure { detail });
    }

    pub(crate) fn begin_summary(&mut self, video_url: String) {
        self.summarizing = true;
        self.job_id = None;
        self.progress = 0;
        self.result_url = None;
        self.confirmation_ticks = 0;
        self.submitted_url = Some(video_url);
        self.set_status(PanelStatus::Processing);
    }

    /// Accepts a progress push for the job being waited on. The first push
    /// latches the job id; later pushes for other jobs, or going backwards,
    /// are dropped.
    pub(crate) fn accept_progress(&mut self, job_id: JobId, progress: u8) -> bool {
        if !self.summarizing {
            return false;
        }
        match self.job_id {
            Some(current) if current != job_id => return false,
            Some(_) => {}
            None => self.job_id = Some(job_id),
        }
        let progress = progress.min(PROGRESS_MAX);
        if progress < self.progress {
            return false;
        }
        self.progress = progress;
        self.mark_dirty();
        true
    }

    pub(crate) fn complete_summary(&mut self, result_url: String) {
        self.summarizing = false;
        self.progress = PROGRESS_MAX;
        self.result_url = Some(result_url);
        self.set_status(PanelStatus::Summarized);
    }

    /// Ends the wait without a result. Progress keeps its last known value.
    pub(crate) fn abort_summary(&mut self, err: PanelError) {
        self.summarizing = false;
        self.fail(err);
    }

    pub(crate) fn result_url(&self) -> Option<&str> {
        self.result_url.as_deref()
    }

    pub(crate) fn confirm_export(&mut self) {
        self.confirmation_ticks = CONFIRMATION_TICKS;
        self.set_status(PanelStatus::Exported);
    }

    pub(crate) fn tick(&mut self) {
        if self.confirmation_ticks == 0 {
            return;
        }
        self.confirmation_ticks -= 1;
        if self.confirmation_ticks == 0 {
            self.mark_dirty();
        }
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.detecting = false;
        self.summarizing = false;
        self.mark_dirty();
    }
}
