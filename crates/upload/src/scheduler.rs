//! Sequential upload scheduler.
//!
//! Validates a job, then uploads its files strictly one at a time in
//! submission order. A failed file is recorded and the job moves on; a
//! cancelled job stops where it is.

use std::sync::Arc;

use chrono::Utc;
use rapidcomm_transfer::{
    FileDescriptor, ProgressAggregator, UploadLimits, format_file_size, validate_files,
};
use tracing::{debug, info, warn};

use crate::attempt::FileTransfer;
use crate::config::{TransferPolicy, UploaderConfig};
use crate::error::UploadError;
use crate::notifier::UploadNotifier;
use crate::registry::ActiveUploads;
use crate::transport::UploadTransport;
use crate::types::{CancelHandle, FileStatus, JobId, JobOutcome, JobResult, UploadJob};

/// Runs upload jobs against one transport, reporting to one notifier.
///
/// Share it behind an `Arc` to cancel from another task while
/// [`submit`](Self::submit) is running.
pub struct UploadScheduler {
    transport: Arc<dyn UploadTransport>,
    notifier: Arc<dyn UploadNotifier>,
    limits: UploadLimits,
    policy: TransferPolicy,
    active: ActiveUploads,
}

impl UploadScheduler {
    /// Creates a scheduler with default limits and policy.
    pub fn new(transport: Arc<dyn UploadTransport>, notifier: Arc<dyn UploadNotifier>) -> Self {
        Self {
            transport,
            notifier,
            limits: UploadLimits::default(),
            policy: TransferPolicy::default(),
            active: ActiveUploads::default(),
        }
    }

    /// Creates a scheduler with limits and policy taken from `config`.
    pub fn from_config(
        config: &UploaderConfig,
        transport: Arc<dyn UploadTransport>,
        notifier: Arc<dyn UploadNotifier>,
    ) -> Self {
        Self::new(transport, notifier)
            .with_limits(config.limits.clone())
            .with_policy(config.policy())
    }

    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_policy(mut self, policy: TransferPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    pub fn policy(&self) -> &TransferPolicy {
        &self.policy
    }

    /// Validates and uploads every file of `job`, in order.
    ///
    /// Returns `Err` when validation rejects the job or the job is already
    /// running; no request was sent in either case. Per-file failures are
    /// reported in the result.
    pub async fn submit(&self, job: UploadJob) -> Result<JobResult, UploadError> {
        if let Err(e) = validate_files(job.files(), &self.limits) {
            warn!(job = %job.id(), "upload rejected: {e}");
            return Err(e.into());
        }

        let job_id = job.id();
        let token = job.cancel_token();
        if !self.active.register_job(job_id, token.clone()) {
            warn!(job = %job_id, "upload rejected: job is already running");
            return Err(UploadError::AlreadyRunning(job_id));
        }
        info!(
            job = %job_id,
            files = job.files().len(),
            total = %format_file_size(job.total_bytes()),
            "starting uploads"
        );

        let mut aggregator = ProgressAggregator::new(job.files().iter().map(FileDescriptor::size));
        let mut files = Vec::with_capacity(job.files().len());
        let mut cancelled = false;

        for (index, file) in job.files().iter().enumerate() {
            if token.is_cancelled() {
                cancelled = true;
                break;
            }

            aggregator.begin_file(index, file.name());
            let attempt_id = format!("upload_{index}_{}", Utc::now().timestamp_millis());
            let attempt_token = token.child_token();
            self.active.track_attempt(job_id, &attempt_id, attempt_token.clone());
            debug!(job = %job_id, attempt = %attempt_id, file = %file.name(), "file started");

            let outcome = FileTransfer::new(
                index,
                file,
                self.transport.as_ref(),
                self.notifier.as_ref(),
                &aggregator,
                &self.policy,
                attempt_token,
            )
            .run()
            .await;
            self.active.finish_attempt(job_id, &attempt_id);

            match outcome.status {
                FileStatus::Uploaded { .. } => aggregator.record_success(file.size()),
                FileStatus::Failed { .. } => aggregator.record_failure(),
                FileStatus::Cancelled => {
                    cancelled = true;
                    files.push(outcome);
                    break;
                }
            }
            self.notifier.on_file_settled(&outcome);
            files.push(outcome);
        }

        self.active.finish_job(job_id);

        let stats = aggregator.stats();
        let has_errors = stats.failed_files > 0;
        let outcome = if cancelled {
            JobOutcome::Cancelled
        } else if has_errors {
            JobOutcome::PartialFailure {
                failed: stats.failed_files,
            }
        } else {
            JobOutcome::AllSucceeded
        };
        let result = JobResult {
            job_id,
            outcome,
            files,
            stats,
            has_errors,
        };

        if cancelled {
            info!(
                job = %job_id,
                uploaded = result.stats.uploaded_files,
                total = result.stats.total_files,
                "uploads cancelled"
            );
            self.notifier.on_cancelled();
        } else {
            let summary = result.summary();
            if has_errors {
                warn!(job = %job_id, "{}", summary.message);
            } else {
                info!(job = %job_id, "{}", summary.message);
            }
            self.notifier.on_job_settled(&summary);
        }

        Ok(result)
    }

    /// Cancels a running job: aborts its in-flight request, clears any
    /// pending retry, and skips its remaining files.
    ///
    /// Returns `false` if the job is not running.
    pub fn cancel(&self, job_id: JobId) -> bool {
        self.active.cancel_job(job_id)
    }

    /// Handle that cancels `job` whether or not it has been submitted yet.
    pub fn cancel_handle(&self, job: &UploadJob) -> CancelHandle {
        job.cancel_handle()
    }

    pub fn has_active_uploads(&self) -> bool {
        self.active_uploads() > 0
    }

    /// Number of requests currently in flight or waiting to retry.
    pub fn active_uploads(&self) -> usize {
        self.active.active_attempts()
    }
}
