//! Notifier that reports upload events through `tracing`.

use rapidcomm_protocol::types::ProgressUpdate;
use rapidcomm_transfer::format_file_size;
use rapidcomm_upload::{FileOutcome, FileStatus, JobSummary, RetryNotice, UploadNotifier};

pub struct LogNotifier;

impl UploadNotifier for LogNotifier {
    fn on_progress(&self, update: &ProgressUpdate) {
        tracing::info!(
            file = %update.file_name,
            "[{}/{}] {:.0}% ({} of {}), overall {:.0}%",
            update.file_index + 1,
            update.total_files,
            update.percent,
            format_file_size(update.bytes_loaded),
            format_file_size(update.bytes_total),
            update.overall_percent,
        );
    }

    fn on_file_settled(&self, outcome: &FileOutcome) {
        match &outcome.status {
            FileStatus::Uploaded { receipt, integrity } => {
                let verified = integrity.as_ref().map(|i| i.verified);
                tracing::info!(
                    file = %outcome.file_name,
                    stored_as = %receipt.filename,
                    ?verified,
                    "uploaded"
                );
            }
            FileStatus::Failed { error } => {
                tracing::error!(file = %outcome.file_name, attempts = outcome.attempts, "{error}");
            }
            FileStatus::Cancelled => {}
        }
    }

    fn on_job_settled(&self, summary: &JobSummary) {
        if summary.has_errors {
            tracing::warn!("{}", summary.message);
        } else {
            tracing::info!("{}", summary.message);
        }
    }

    fn on_cancelled(&self) {
        tracing::warn!("uploads cancelled");
    }

    fn on_retry(&self, notice: &RetryNotice) {
        tracing::warn!(
            file = %notice.file_name,
            "retry {}/{} in {}s: {}",
            notice.retry,
            notice.max_retries,
            notice.delay.as_secs(),
            notice.reason
        );
    }
}
