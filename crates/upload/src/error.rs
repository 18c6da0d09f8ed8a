//! Upload error types.

use std::time::Duration;

use rapidcomm_transfer::{TransferError, ValidationError};

use crate::types::JobId;

/// Errors produced while uploading.
///
/// [`Validation`](Self::Validation) and [`AlreadyRunning`](Self::AlreadyRunning)
/// are returned by `submit` before any request is sent. The rest end a
/// single file and are recorded in its outcome.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("job {0} is already running")]
    AlreadyRunning(JobId),

    #[error(
        "upload failed after {attempts} attempts, make sure the backend server is running at {endpoint}: {reason}"
    )]
    Network {
        endpoint: String,
        attempts: u32,
        reason: String,
    },

    #[error("server error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("failed to parse server response: {0}")]
    Parse(String),

    #[error("upload timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransferError> for UploadError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::Io(e) => Self::Io(e),
            TransferError::NotAFile(path) => Self::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {path}"),
            )),
        }
    }
}

/// Connection-level failure reported by a transport: no response arrived.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),
}
