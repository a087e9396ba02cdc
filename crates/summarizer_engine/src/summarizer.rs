use std::time::Duration;

use extension_logging::{ext_debug, JOB_ENGINE};
use serde::{Deserialize, Serialize};
use summarizer_core::{JobFailureReason, JobId, PROGRESS_MAX};

/// Receives progress percentages while a summarizer runs.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: u8);
}

/// The long-running work behind a job: video URL in, result URL out.
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        job_id: JobId,
        video_url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<String, JobFailureReason>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub step: u8,
    pub tick_interval_ms: u64,
    pub result_base_url: String,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            step: 10,
            tick_interval_ms: 500,
            result_base_url: "https://example.com/processed".to_string(),
        }
    }
}

impl SimulationSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Fixed-step fake processing: one step per tick until 100, then a result URL
/// derived from the job id.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSummarizer {
    settings: SimulationSettings,
}

impl SimulatedSummarizer {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl Summarizer for SimulatedSummarizer {
    async fn summarize(
        &self,
        job_id: JobId,
        video_url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<String, JobFailureReason> {
        ext_debug!(JOB_ENGINE, "job {} simulating summary of {}", job_id, video_url);
        let step = self.settings.step.clamp(1, PROGRESS_MAX);
        let mut ticker = tokio::time::interval(self.settings.tick_interval());
        // The first tick of a tokio interval completes immediately.
        ticker.tick().await;

        let mut progress = 0u8;
        while progress < PROGRESS_MAX {
            ticker.tick().await;
            progress = progress.saturating_add(step).min(PROGRESS_MAX);
            sink.emit(progress);
        }

        Ok(format!(
            "{}/{}.mp4",
            self.settings.result_base_url.trim_end_matches('/'),
            job_id
        ))
    }
}
