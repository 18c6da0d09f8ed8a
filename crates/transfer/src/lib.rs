//! Upload building blocks: integrity digest, job validation, progress
//! aggregation, and file descriptors.

mod integrity;
mod progress;
mod types;
mod validation;

pub use integrity::{
    DigestHasher, IntegrityMismatch, IntegrityResult, calculate_file_digest, digest, verify,
    verify_file,
};
pub use progress::{MilestoneTracker, ProgressAggregator, ProgressThrottle, format_file_size};
pub use types::{FileDescriptor, FileSource};
pub use validation::{
    DEFAULT_MAX_FILE_BYTES, DEFAULT_MAX_FILES, DEFAULT_MAX_TOTAL_BYTES, UploadLimits,
    ValidationError, validate_files,
};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a regular file: {0}")]
    NotAFile(String),
}
