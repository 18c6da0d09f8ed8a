use std::time::Duration;

/// Default port the RapidComm backend listens on.
pub const DEFAULT_BACKEND_PORT: u16 = 8080;

/// Path of the upload endpoint on the backend.
pub const UPLOAD_PATH: &str = "/upload";

/// Multipart field carrying the file's binary content.
pub const FIELD_FILE: &str = "file";

/// Multipart field carrying the file's byte length as a decimal string.
pub const FIELD_ORIGINAL_SIZE: &str = "originalSize";

/// Multipart field carrying the submission time (epoch millis, decimal).
pub const FIELD_TIMESTAMP: &str = "timestamp";

/// Value of `status` in a successful upload response.
pub const STATUS_SUCCESS: &str = "success";

/// Content type used for the `file` part.
pub const FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Retries after the first attempt when the connection fails.
pub const MAX_RETRIES: u32 = 3;

/// Base delay for exponential retry backoff.
pub const RETRY_DELAY_BASE: Duration = Duration::from_millis(2000);

/// Wall-clock ceiling for a single upload attempt (10 minutes).
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Minimum spacing between observable progress updates.
pub const PROGRESS_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// Files larger than this get milestone progress logging (10 MB).
pub const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Milestone step, in percent, for large-file progress logging.
pub const PROGRESS_LOG_INTERVAL: u32 = 5;

/// Length of the integrity digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// Returns the upload URL for a backend base URL such as `http://host:8080`.
pub fn upload_url(backend_url: &str) -> String {
    format!("{}{UPLOAD_PATH}", backend_url.trim_end_matches('/'))
}
