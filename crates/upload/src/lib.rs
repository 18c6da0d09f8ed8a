//! Client-side upload orchestration for RapidComm.
//!
//! Files of a job are uploaded strictly one at a time, in submission
//! order, each as a single multipart `POST`. The crate owns the policy
//! (validation, retry with exponential backoff, per-attempt timeout,
//! cancellation); the network sits behind [`UploadTransport`] and the
//! consumer behind [`UploadNotifier`].
//!
//! # Flow
//!
//! 1. **Validate** the job against [`UploadLimits`](rapidcomm_transfer::UploadLimits)
//! 2. **Send** each file, retrying connection failures only
//! 3. **Verify** the digest when the backend reports size and hash
//! 4. **Settle** the job and notify a summary, or `on_cancelled`

pub mod attempt;
pub mod config;
pub mod error;
pub mod http;
pub mod notifier;
mod registry;
pub mod response;
pub mod scheduler;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use attempt::{AttemptEvent, TransferAttempt, TransferState};
pub use config::{ConfigError, RetryPolicy, TransferPolicy, UploaderConfig};
pub use error::{TransportError, UploadError};
pub use http::HttpTransport;
pub use notifier::{ChannelNotifier, UploadNotifier};
pub use response::{UploadReceipt, classify_response};
pub use scheduler::UploadScheduler;
pub use transport::{TransportResponse, UploadRequest, UploadTransport};
pub use types::{
    CancelHandle, FileOutcome, FileStatus, JobId, JobOutcome, JobResult, JobSummary, RetryNotice,
    UploadEvent, UploadJob,
};
