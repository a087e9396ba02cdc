use std::time::Duration;

use extension_logging::{ext_debug, ext_warn, JOB_ENGINE};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use summarizer_core::{JobFailureReason, JobId, PROGRESS_MAX};

use crate::summarizer::{ProgressSink, Summarizer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpBackendSettings {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for HttpBackendSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            poll_interval_ms: 1_000,
            request_timeout_ms: 30_000,
        }
    }
}

impl HttpBackendSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    video_url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RemoteStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    #[serde(default)]
    progress: u32,
    status: RemoteStatus,
    #[serde(default)]
    result_url: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Remote processing backend: `POST {base}/jobs` submits the video, then
/// `GET {base}/jobs/{id}` is polled until the job completes or fails.
#[derive(Debug, Clone)]
pub struct HttpSummarizer {
    settings: HttpBackendSettings,
}

impl HttpSummarizer {
    pub fn new(settings: HttpBackendSettings) -> Self {
        Self { settings }
    }

    fn base_url(&self) -> &str {
        self.settings.base_url.trim_end_matches('/')
    }

    fn build_client(&self) -> Result<reqwest::Client, JobFailureReason> {
        reqwest::Client::builder()
            .timeout(self.settings.request_timeout())
            .build()
            .map_err(|err| backend_error(format!("client setup failed: {err}")))
    }

    async fn submit(
        &self,
        client: &reqwest::Client,
        video_url: &str,
    ) -> Result<SubmitResponse, JobFailureReason> {
        let body = serde_json::to_vec(&SubmitRequest { video_url })
            .map_err(|err| backend_error(format!("invalid request: {err}")))?;
        let response = client
            .post(format!("{}/jobs", self.base_url()))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn poll(
        &self,
        client: &reqwest::Client,
        remote_id: &str,
    ) -> Result<StatusResponse, JobFailureReason> {
        let response = client
            .get(format!("{}/jobs/{}", self.base_url(), remote_id))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }
}

#[async_trait::async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(
        &self,
        job_id: JobId,
        video_url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<String, JobFailureReason> {
        let client = self.build_client()?;
        let submitted = self.submit(&client, video_url).await?;
        ext_debug!(
            JOB_ENGINE,
            "job {} submitted to backend as {}",
            job_id,
            submitted.job_id
        );

        loop {
            let status = self.poll(&client, &submitted.job_id).await?;
            let progress = status.progress.min(u32::from(PROGRESS_MAX)) as u8;
            match status.status {
                RemoteStatus::Queued | RemoteStatus::Running => {
                    sink.emit(progress);
                    tokio::time::sleep(self.settings.poll_interval()).await;
                }
                RemoteStatus::Completed => {
                    return status
                        .result_url
                        .filter(|url| !url.is_empty())
                        .ok_or_else(|| backend_error("completed without resultUrl"));
                }
                RemoteStatus::Failed => {
                    let reason = status.reason.unwrap_or_else(|| "unknown error".to_string());
                    ext_warn!(JOB_ENGINE, "job {} failed on backend: {}", job_id, reason);
                    return Err(backend_error(reason));
                }
            }
        }
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, JobFailureReason> {
    let status = response.status();
    if !status.is_success() {
        return Err(backend_error(format!("http status {}", status.as_u16())));
    }
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| backend_error(format!("invalid response: {err}")))
}

fn backend_error(detail: impl Into<String>) -> JobFailureReason {
    JobFailureReason::Backend(detail.into())
}

fn map_reqwest_error(err: reqwest::Error) -> JobFailureReason {
    if err.is_timeout() {
        return backend_error(format!("timeout: {err}"));
    }
    backend_error(format!("network error: {err}"))
}
