//! Data types for upload jobs and their outcomes.

use std::time::Duration;

use rapidcomm_protocol::types::{ProgressUpdate, UploadStats};
use rapidcomm_transfer::{FileDescriptor, IntegrityResult};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::response::UploadReceipt;

/// Identifier of one submitted job.
pub type JobId = Uuid;

/// An ordered list of files submitted for sequential upload.
///
/// Not `Clone`: a job is consumed by exactly one `submit`.
#[derive(Debug)]
pub struct UploadJob {
    id: JobId,
    files: Vec<FileDescriptor>,
    cancel: CancellationToken,
}

impl UploadJob {
    /// Creates a job; file order is the upload order.
    pub fn new(files: Vec<FileDescriptor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            files,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Returns a handle that cancels this job from any task, before or
    /// during submission.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            job_id: self.id,
            token: self.cancel.clone(),
        }
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(FileDescriptor::size).sum()
    }
}

/// Cancels one job. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    job_id: JobId,
    token: CancellationToken,
}

impl CancelHandle {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Aborts the in-flight request, clears any pending retry, and stops
    /// the job from starting further files.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// How a single file ended.
#[derive(Debug, Clone)]
pub enum FileStatus {
    Uploaded {
        receipt: UploadReceipt,
        /// `None` when the backend did not report both size and hash.
        integrity: Option<IntegrityResult>,
    },
    Failed {
        error: String,
    },
    Cancelled,
}

/// Result for one file of a job.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub index: usize,
    pub file_name: String,
    /// Number of requests sent for this file.
    pub attempts: u32,
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, FileStatus::Uploaded { .. })
    }

    /// Error message for a failed file.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            FileStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Categorised outcome of a whole job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    AllSucceeded,
    PartialFailure { failed: usize },
    Cancelled,
}

/// Final result of a job, one entry per attempted file in submission order.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job_id: JobId,
    pub outcome: JobOutcome,
    pub files: Vec<FileOutcome>,
    pub stats: UploadStats,
    pub has_errors: bool,
}

impl JobResult {
    /// Human-readable summary of the job.
    pub fn summary(&self) -> JobSummary {
        let s = &self.stats;
        let mut message = match self.outcome {
            JobOutcome::AllSucceeded => format!(
                "Successfully uploaded {} file{}!",
                s.uploaded_files,
                if s.uploaded_files == 1 { "" } else { "s" }
            ),
            JobOutcome::PartialFailure { failed } => format!(
                "Uploaded {}/{} files. {failed} uploads failed.",
                s.uploaded_files, s.total_files
            ),
            JobOutcome::Cancelled => format!(
                "Uploads cancelled after {}/{} files.",
                s.uploaded_files, s.total_files
            ),
        };
        for f in &self.files {
            if let Some(err) = f.error() {
                message.push_str(&format!("\n{}: {err}", f.file_name));
            }
        }
        JobSummary {
            outcome: self.outcome.clone(),
            stats: self.stats.clone(),
            has_errors: self.has_errors,
            message,
        }
    }
}

/// What the notifier sees when a job settles.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub outcome: JobOutcome,
    pub stats: UploadStats,
    pub has_errors: bool,
    pub message: String,
}

/// A retry about to be scheduled after a connection failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryNotice {
    pub file_index: usize,
    pub file_name: String,
    /// 1-based retry number.
    pub retry: u32,
    pub max_retries: u32,
    pub delay: Duration,
    pub reason: String,
}

/// Event forwarded by [`ChannelNotifier`](crate::notifier::ChannelNotifier).
#[derive(Debug, Clone)]
pub enum UploadEvent {
    Progress(ProgressUpdate),
    Retry(RetryNotice),
    FileSettled(FileOutcome),
    JobSettled(JobSummary),
    Cancelled,
}
