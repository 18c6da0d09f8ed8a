//! Push-only interface from the upload core to its consumer (UI, CLI).

use rapidcomm_protocol::types::ProgressUpdate;
use tokio::sync::mpsc;
use tracing::warn;

use crate::types::{FileOutcome, JobSummary, RetryNotice, UploadEvent};

/// Receives upload events. The core never queries the consumer.
pub trait UploadNotifier: Send + Sync {
    /// Throttled progress of the file currently being sent.
    fn on_progress(&self, update: &ProgressUpdate);

    /// A file reached a terminal state.
    fn on_file_settled(&self, outcome: &FileOutcome);

    /// Every file of the job settled.
    fn on_job_settled(&self, summary: &JobSummary);

    /// The job was cancelled before settling.
    fn on_cancelled(&self);

    /// A connection failure is about to be retried.
    fn on_retry(&self, _notice: &RetryNotice) {}
}

/// Forwards events over a tokio channel without blocking the upload.
pub struct ChannelNotifier {
    events_tx: mpsc::Sender<UploadEvent>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiver its events arrive on.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<UploadEvent>) {
        let (events_tx, events_rx) = mpsc::channel(capacity);
        (Self { events_tx }, events_rx)
    }

    fn forward(&self, event: UploadEvent) {
        // Non-blocking; a full channel drops the event.
        if let Err(e) = self.events_tx.try_send(event) {
            warn!("failed to forward upload event: {e}");
        }
    }
}

impl UploadNotifier for ChannelNotifier {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.forward(UploadEvent::Progress(update.clone()));
    }

    fn on_file_settled(&self, outcome: &FileOutcome) {
        self.forward(UploadEvent::FileSettled(outcome.clone()));
    }

    fn on_job_settled(&self, summary: &JobSummary) {
        self.forward(UploadEvent::JobSettled(summary.clone()));
    }

    fn on_cancelled(&self) {
        self.forward(UploadEvent::Cancelled);
    }

    fn on_retry(&self, notice: &RetryNotice) {
        self.forward(UploadEvent::Retry(notice.clone()));
    }
}
