//! Uploader configuration.
//!
//! Stored as TOML. Every field has a default, so an empty or missing file
//! yields the stock configuration.

use std::path::Path;
use std::time::Duration;

use rapidcomm_protocol::constants::{
    DEFAULT_BACKEND_PORT, LARGE_FILE_THRESHOLD, MAX_RETRIES, PROGRESS_LOG_INTERVAL,
    PROGRESS_UPDATE_INTERVAL, RETRY_DELAY_BASE, UPLOAD_TIMEOUT, upload_url,
};
use rapidcomm_transfer::UploadLimits;
use serde::{Deserialize, Serialize};

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Uploader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Full URL of the upload endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Retries after the first attempt on connection failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Per-attempt wall-clock ceiling in seconds.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    /// Minimum spacing of progress updates in milliseconds.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    /// Files above this size get milestone progress logging.
    #[serde(default = "default_large_file_threshold")]
    pub large_file_threshold: u64,

    /// Milestone step in percent.
    #[serde(default = "default_progress_log_step")]
    pub progress_log_step: u32,

    #[serde(default)]
    pub limits: UploadLimits,
}

fn default_endpoint() -> String {
    upload_url(&format!("http://localhost:{DEFAULT_BACKEND_PORT}"))
}

fn default_max_retries() -> u32 {
    MAX_RETRIES
}

fn default_retry_base_delay_ms() -> u64 {
    RETRY_DELAY_BASE.as_millis() as u64
}

fn default_upload_timeout_secs() -> u64 {
    UPLOAD_TIMEOUT.as_secs()
}

fn default_progress_interval_ms() -> u64 {
    PROGRESS_UPDATE_INTERVAL.as_millis() as u64
}

fn default_large_file_threshold() -> u64 {
    LARGE_FILE_THRESHOLD
}

fn default_progress_log_step() -> u32 {
    PROGRESS_LOG_INTERVAL
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            upload_timeout_secs: default_upload_timeout_secs(),
            progress_interval_ms: default_progress_interval_ms(),
            large_file_threshold: default_large_file_threshold(),
            progress_log_step: default_progress_log_step(),
            limits: UploadLimits::default(),
        }
    }
}

impl UploaderConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads configuration from `path`, falling back to defaults if the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Retry and timing policy derived from this configuration.
    pub fn policy(&self) -> TransferPolicy {
        TransferPolicy {
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
            },
            timeout: Duration::from_secs(self.upload_timeout_secs),
            progress_interval: Duration::from_millis(self.progress_interval_ms),
            large_file_threshold: self.large_file_threshold,
            progress_log_step: self.progress_log_step,
        }
    }
}

/// Retry policy for connection failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: RETRY_DELAY_BASE,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `retry` (1-based): `base * 2^(retry - 1)`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exp)
    }
}

/// Everything a single-file transfer needs to know about timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPolicy {
    pub retry: RetryPolicy,
    /// Per-attempt ceiling; resets on every retry.
    pub timeout: Duration,
    pub progress_interval: Duration,
    pub large_file_threshold: u64,
    pub progress_log_step: u32,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        UploaderConfig::default().policy()
    }
}
