use std::collections::VecDeque;
use std::sync::Arc;

use extension_logging::{ext_debug, ext_error, ext_info, ext_warn, JOB_ENGINE};
use summarizer_core::{Job, JobFailureReason, JobId, PROGRESS_MAX};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

use crate::summarizer::{ProgressSink, Summarizer};

/// Raw report from a running summarizer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress {
        job_id: JobId,
        progress: u8,
    },
    Finished {
        job_id: JobId,
        result: Result<String, JobFailureReason>,
    },
}

/// Accepted change to the current job, in the order listeners should see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    Progress { job_id: JobId, progress: u8 },
    Completed { job_id: JobId, result_url: String },
    Failed { job_id: JobId, reason: JobFailureReason },
}

impl JobUpdate {
    pub fn job_id(&self) -> JobId {
        match self {
            JobUpdate::Progress { job_id, .. }
            | JobUpdate::Completed { job_id, .. }
            | JobUpdate::Failed { job_id, .. } => *job_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobUpdate::Progress { .. })
    }
}

#[derive(Debug, Clone)]
pub struct JobHandle {
    job_id: JobId,
    cancel: CancellationToken,
}

impl JobHandle {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct RunningTask {
    job_id: JobId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct ChannelProgressSink {
    job_id: JobId,
    tx: mpsc::UnboundedSender<EngineEvent>,
    cancel: CancellationToken,
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, progress: u8) {
        if self.cancel.is_cancelled() {
            return;
        }
        let _ = self.tx.send(EngineEvent::Progress {
            job_id: self.job_id,
            progress,
        });
    }
}

/// Owns the current [`Job`] record and the task doing its work.
///
/// This is the single write point for job state: raw [`EngineEvent`]s from
/// the task are folded into the record, and only the changes the record
/// accepts come out of [`JobEngine::next_update`]. Nothing is reported for a
/// job once it reached `Completed` or `Failed`.
pub struct JobEngine {
    summarizer: Arc<dyn Summarizer>,
    job: Option<Job>,
    next_id: JobId,
    running: Option<RunningTask>,
    events_tx: mpsc::UnboundedSender<EngineEvent>,
    events_rx: mpsc::UnboundedReceiver<EngineEvent>,
    ready: VecDeque<JobUpdate>,
}

impl JobEngine {
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            summarizer,
            job: None,
            next_id: 1,
            running: None,
            events_tx,
            events_rx,
            ready: VecDeque::new(),
        }
    }

    pub fn current(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.job.as_ref().is_some_and(Job::is_running)
    }

    /// Starts a fresh job, discarding any terminal one.
    pub fn start(&mut self, video_url: &str) -> Result<JobHandle, JobFailureReason> {
        if self.is_running() {
            return Err(JobFailureReason::AlreadyRunning);
        }
        let video_url = video_url.trim();
        if video_url.is_empty() {
            return Err(JobFailureReason::EmptyVideoUrl);
        }

        let job_id = self.next_id;
        self.next_id += 1;
        let mut job = Job::new(job_id, video_url);
        job.start();
        self.job = Some(job);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_job(
            self.summarizer.clone(),
            job_id,
            video_url.to_string(),
            cancel.clone(),
            self.events_tx.clone(),
        ));
        if let Some(previous) = self.running.replace(RunningTask {
            job_id,
            cancel: cancel.clone(),
            task,
        }) {
            previous.cancel.cancel();
        }
        ext_info!(JOB_ENGINE, "job {} started for {}", job_id, video_url);

        Ok(JobHandle { job_id, cancel })
    }

    /// Cancels the running job. Returns the resulting `Failed` update, or
    /// `None` when nothing was running.
    pub fn cancel(&mut self) -> Option<JobUpdate> {
        let job = self.job.as_mut().filter(|job| job.is_running())?;
        job.fail(JobFailureReason::Cancelled);
        let job_id = job.id();
        self.stop_task();
        ext_info!(JOB_ENGINE, "job {} cancelled", job_id);
        Some(JobUpdate::Failed {
            job_id,
            reason: JobFailureReason::Cancelled,
        })
    }

    /// Waits for the next accepted update. Cancel-safe: no event is lost if
    /// the returned future is dropped before completing.
    pub async fn next_update(&mut self) -> Option<JobUpdate> {
        loop {
            if let Some(update) = self.ready.pop_front() {
                return Some(update);
            }
            let event = self.events_rx.recv().await?;
            self.apply(event);
        }
    }

    fn apply(&mut self, event: EngineEvent) {
        let Some(job) = self.job.as_mut() else {
            return;
        };
        match event {
            EngineEvent::Progress { job_id, progress } => {
                if job_id != job.id() {
                    return;
                }
                if let Some(progress) = job.record_progress(progress) {
                    self.ready.push_back(JobUpdate::Progress { job_id, progress });
                }
            }
            EngineEvent::Finished { job_id, result } => {
                if job_id != job.id() || !job.is_running() {
                    ext_debug!(JOB_ENGINE, "ignoring late result for job {}", job_id);
                    return;
                }
                match result {
                    Ok(result_url) => {
                        // Listeners always see 100 before completion, even if
                        // the backend jumped straight to done.
                        if let Some(progress) = job.record_progress(PROGRESS_MAX) {
                            self.ready.push_back(JobUpdate::Progress { job_id, progress });
                        }
                        job.complete(result_url.clone());
                        ext_info!(JOB_ENGINE, "job {} completed: {}", job_id, result_url);
                        self.ready
                            .push_back(JobUpdate::Completed { job_id, result_url });
                    }
                    Err(reason) => {
                        job.fail(reason.clone());
                        ext_warn!(JOB_ENGINE, "job {} failed: {}", job_id, reason);
                        self.ready.push_back(JobUpdate::Failed { job_id, reason });
                    }
                }
                self.running = None;
            }
        }
    }

    fn stop_task(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            running.task.abort();
            ext_debug!(JOB_ENGINE, "stopped task for job {}", running.job_id);
        }
    }
}

impl Drop for JobEngine {
    fn drop(&mut self) {
        self.stop_task();
    }
}

async fn run_job(
    summarizer: Arc<dyn Summarizer>,
    job_id: JobId,
    video_url: String,
    cancel: CancellationToken,
    events_tx: mpsc::UnboundedSender<EngineEvent>,
) {
    let sink = ChannelProgressSink {
        job_id,
        tx: events_tx.clone(),
        cancel: cancel.clone(),
    };
    // The work runs in its own task so a panicking backend still ends the job.
    // Dropping the handle aborts it, including when this task is aborted.
    let mut work = AbortOnDropHandle::new(tokio::spawn(async move {
        summarizer.summarize(job_id, &video_url, &sink).await
    }));
    let result = tokio::select! {
        _ = cancel.cancelled() => Err(JobFailureReason::Cancelled),
        joined = &mut work => match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => {
                ext_error!(JOB_ENGINE, "job {} worker panicked", job_id);
                Err(JobFailureReason::Backend("worker panicked".to_string()))
            }
            Err(_) => Err(JobFailureReason::Cancelled),
        },
    };
    let _ = events_tx.send(EngineEvent::Finished { job_id, result });
}
