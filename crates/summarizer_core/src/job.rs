use crate::{JobFailureReason, JobId};

pub const PROGRESS_MAX: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed(JobFailureReason),
}

/// One summarization: `Pending -> Running -> {Completed, Failed}`.
///
/// Transitions out of a terminal state are rejected, and progress is only
/// recorded while running and never goes backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: JobId,
    video_url: String,
    progress: u8,
    status: JobStatus,
    result_url: Option<String>,
}

impl Job {
    pub fn new(id: JobId, video_url: impl Into<String>) -> Self {
        Self {
            id,
            video_url: video_url.into(),
            progress: 0,
            status: JobStatus::Pending,
            result_url: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn result_url(&self) -> Option<&str> {
        self.result_url.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed(_))
    }

    pub fn start(&mut self) -> bool {
        if self.status != JobStatus::Pending {
            return false;
        }
        self.status = JobStatus::Running;
        true
    }

    /// Records a progress report and returns the new value if it advanced.
    pub fn record_progress(&mut self, progress: u8) -> Option<u8> {
        if !self.is_running() {
            return None;
        }
        let progress = progress.min(PROGRESS_MAX);
        if progress <= self.progress {
            return None;
        }
        self.progress = progress;
        Some(progress)
    }

    pub fn complete(&mut self, result_url: impl Into<String>) -> bool {
        if !self.is_running() {
            return false;
        }
        self.progress = PROGRESS_MAX;
        self.result_url = Some(result_url.into());
        self.status = JobStatus::Completed;
        true
    }

    pub fn fail(&mut self, reason: JobFailureReason) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed(reason);
        true
    }
}
