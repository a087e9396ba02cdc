use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use summarizer_core::PROGRESS_MAX;
use url::Url;

use crate::http::{HttpBackendSettings, HttpSummarizer};
use crate::summarizer::{SimulatedSummarizer, SimulationSettings, Summarizer};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("summarizer step must be between 1 and {PROGRESS_MAX}, got {0}")]
    InvalidStep(u8),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("backend base_url is not a valid URL: {0}")]
    InvalidBackendUrl(String),
}

/// Runtime settings shared by all contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Timeout for short round trips (`getSidebarState`, `detectVideo`, `cancelSummary`).
    pub request_timeout_ms: u64,
    /// How long the panel waits for the next progress push before giving up
    /// on `summarizeVideo`.
    pub progress_idle_timeout_ms: u64,
    /// Hosts where the toolbar action toggles the sidebar. Empty means all pages.
    pub activation_hosts: Vec<String>,
    pub summarizer: SimulationSettings,
    /// When set, jobs run against a remote backend instead of the simulation.
    pub backend: Option<HttpBackendSettings>,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5_000,
            progress_idle_timeout_ms: 10_000,
            activation_hosts: vec!["youtube.com".to_string()],
            summarizer: SimulationSettings::default(),
            backend: None,
        }
    }
}

impl ExtensionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn progress_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.progress_idle_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("request_timeout_ms"));
        }
        if self.progress_idle_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("progress_idle_timeout_ms"));
        }
        if self.summarizer.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration("summarizer.tick_interval_ms"));
        }
        if self.summarizer.step == 0 || self.summarizer.step > PROGRESS_MAX {
            return Err(ConfigError::InvalidStep(self.summarizer.step));
        }
        if let Some(backend) = &self.backend {
            Url::parse(&backend.base_url)
                .map_err(|_| ConfigError::InvalidBackendUrl(backend.base_url.clone()))?;
            if backend.poll_interval_ms == 0 {
                return Err(ConfigError::ZeroDuration("backend.poll_interval_ms"));
            }
        }
        Ok(())
    }

    pub fn build_summarizer(&self) -> Arc<dyn Summarizer> {
        match &self.backend {
            Some(backend) => Arc::new(HttpSummarizer::new(backend.clone())),
            None => Arc::new(SimulatedSummarizer::new(self.summarizer.clone())),
        }
    }

    /// Whether the toolbar action applies to a page at `page_url`.
    pub fn activates_on(&self, page_url: &str) -> bool {
        if self.activation_hosts.is_empty() {
            return true;
        }
        let Some(host) = Url::parse(page_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        else {
            return false;
        };
        self.activation_hosts.iter().any(|allowed| {
            let allowed = allowed.trim().to_ascii_lowercase();
            host == allowed || host.ends_with(&format!(".{allowed}"))
        })
    }
}
