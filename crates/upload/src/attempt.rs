//! Single-file transfer: a tagged state machine plus the async driver that
//! feeds it events.
//!
//! ```text
//! Idle -> Sending{0} -> Succeeded | Failed | Cancelled
//!             |
//!             +-- network error --> Backoff{n, delay} -> Sending{n} -> ...
//! ```
//!
//! [`TransferState::on_event`] is pure; every side effect (requests,
//! timers, progress, logging) lives in [`FileTransfer`].

use std::time::Duration;

use chrono::Utc;
use rapidcomm_transfer::{
    FileDescriptor, IntegrityResult, MilestoneTracker, ProgressAggregator, ProgressThrottle,
    format_file_size,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::TransferPolicy;
use crate::error::{TransportError, UploadError};
use crate::notifier::UploadNotifier;
use crate::response::{UploadReceipt, classify_response};
use crate::transport::{PROGRESS_CHANNEL_CAPACITY, UploadRequest, UploadTransport};
use crate::types::{FileOutcome, FileStatus, RetryNotice};

/// State of one file's transfer.
#[derive(Debug)]
pub enum TransferState {
    Idle,
    /// Request `attempt` (0-based) is in flight.
    Sending { attempt: u32 },
    /// Waiting `delay` before sending request `attempt`.
    Backoff { attempt: u32, delay: Duration },
    Succeeded(UploadReceipt),
    Failed(UploadError),
    Cancelled,
}

/// Inputs to the transfer state machine.
#[derive(Debug)]
pub enum AttemptEvent {
    Start,
    /// The backend answered; already classified.
    Responded(Result<UploadReceipt, UploadError>),
    /// No response: the connection failed.
    NetworkError(String),
    TimedOut,
    BackoffElapsed,
    Cancelled,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_) | Self::Cancelled)
    }

    /// Applies one event. Terminal states absorb everything; events that do
    /// not apply to the current state leave it unchanged.
    pub fn on_event(self, event: AttemptEvent, policy: &TransferPolicy, endpoint: &str) -> Self {
        if self.is_terminal() {
            return self;
        }
        match (self, event) {
            (_, AttemptEvent::Cancelled) => Self::Cancelled,
            (Self::Idle, AttemptEvent::Start) => Self::Sending { attempt: 0 },
            (Self::Sending { .. }, AttemptEvent::Responded(Ok(receipt))) => {
                Self::Succeeded(receipt)
            }
            (Self::Sending { .. }, AttemptEvent::Responded(Err(e))) => Self::Failed(e),
            (Self::Sending { .. }, AttemptEvent::TimedOut) => {
                Self::Failed(UploadError::Timeout(policy.timeout))
            }
            (Self::Sending { attempt }, AttemptEvent::NetworkError(reason)) => {
                if attempt < policy.retry.max_retries {
                    let retry = attempt + 1;
                    Self::Backoff {
                        attempt: retry,
                        delay: policy.retry.delay_for_retry(retry),
                    }
                } else {
                    Self::Failed(UploadError::Network {
                        endpoint: endpoint.to_string(),
                        attempts: attempt + 1,
                        reason,
                    })
                }
            }
            (Self::Backoff { attempt, .. }, AttemptEvent::BackoffElapsed) => {
                Self::Sending { attempt }
            }
            (state, _) => state,
        }
    }
}

/// Bookkeeping for the transfer of one file. Discarded once it settles.
#[derive(Debug)]
pub struct TransferAttempt {
    /// Current attempt number, 0-based.
    pub attempt: u32,
    /// Bytes the transport reported for the current attempt.
    pub bytes_sent: u64,
    pub state: TransferState,
    /// Reason of the last connection failure.
    pub last_error: Option<String>,
}

impl Default for TransferAttempt {
    fn default() -> Self {
        Self {
            attempt: 0,
            bytes_sent: 0,
            state: TransferState::Idle,
            last_error: None,
        }
    }
}

/// Drives one file from `Idle` to a terminal state.
pub(crate) struct FileTransfer<'a> {
    index: usize,
    file: &'a FileDescriptor,
    transport: &'a dyn UploadTransport,
    endpoint: &'a str,
    notifier: &'a dyn UploadNotifier,
    aggregator: &'a ProgressAggregator,
    policy: &'a TransferPolicy,
    cancel: CancellationToken,
    throttle: ProgressThrottle,
    milestones: MilestoneTracker,
    attempt: TransferAttempt,
    requests: u32,
    /// Submission time sent with every attempt for this file.
    timestamp: i64,
}

impl<'a> FileTransfer<'a> {
    /// `aggregator` must already point at `index`.
    pub(crate) fn new(
        index: usize,
        file: &'a FileDescriptor,
        transport: &'a dyn UploadTransport,
        notifier: &'a dyn UploadNotifier,
        aggregator: &'a ProgressAggregator,
        policy: &'a TransferPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            index,
            file,
            transport,
            endpoint: transport.endpoint(),
            notifier,
            aggregator,
            policy,
            cancel,
            throttle: ProgressThrottle::new(policy.progress_interval),
            milestones: MilestoneTracker::new(policy.large_file_threshold, policy.progress_log_step),
            attempt: TransferAttempt::default(),
            requests: 0,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Runs the transfer to completion.
    pub(crate) async fn run(mut self) -> FileOutcome {
        let status = loop {
            let state = std::mem::replace(&mut self.attempt.state, TransferState::Idle);
            let event = match state {
                TransferState::Idle => AttemptEvent::Start,
                TransferState::Sending { .. } => self.send_attempt().await,
                TransferState::Backoff { attempt, delay } => self.wait_backoff(attempt, delay).await,
                TransferState::Succeeded(receipt) => break self.settle_success(receipt).await,
                TransferState::Failed(e) => {
                    warn!(file = %self.file.name(), attempts = self.requests, "upload failed: {e}");
                    break FileStatus::Failed {
                        error: e.to_string(),
                    };
                }
                TransferState::Cancelled => {
                    info!(file = %self.file.name(), "upload cancelled");
                    break FileStatus::Cancelled;
                }
            };
            self.advance(state, event);
        };

        FileOutcome {
            index: self.index,
            file_name: self.file.name().to_string(),
            attempts: self.requests,
            status,
        }
    }

    fn advance(&mut self, state: TransferState, event: AttemptEvent) {
        if let AttemptEvent::NetworkError(reason) = &event {
            self.attempt.last_error = Some(reason.clone());
        }
        self.attempt.state = state.on_event(event, self.policy, self.endpoint);
        if let TransferState::Sending { attempt } = self.attempt.state {
            self.attempt.attempt = attempt;
        }
    }

    async fn settle_success(&self, receipt: UploadReceipt) -> FileStatus {
        info!(
            file = %self.file.name(),
            stored_as = %receipt.filename,
            attempts = self.requests,
            "file uploaded"
        );
        let integrity = self.check_integrity(&receipt).await;
        FileStatus::Uploaded { receipt, integrity }
    }

    /// Sends one request and waits for whichever comes first: cancellation,
    /// the response, or the per-attempt deadline.
    async fn send_attempt(&mut self) -> AttemptEvent {
        if self.cancel.is_cancelled() {
            return AttemptEvent::Cancelled;
        }

        let content = match self.file.read_content().await {
            Ok(content) => content,
            Err(e) => return AttemptEvent::Responded(Err(e.into())),
        };
        let total = content.len() as u64;
        let request = UploadRequest {
            file_name: self.file.name().to_string(),
            original_size: total,
            timestamp: self.timestamp,
            content,
        };

        self.requests += 1;
        self.attempt.bytes_sent = 0;
        self.throttle.reset();
        debug!(
            file = %self.file.name(),
            attempt = self.attempt.attempt,
            size = %format_file_size(total),
            "sending file"
        );

        let (progress_tx, mut progress_rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        let cancel = self.cancel.clone();
        let transport = self.transport;
        let mut response = transport.send(request, progress_tx);
        let deadline = tokio::time::sleep(self.policy.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(file = %self.file.name(), "aborting in-flight request");
                    return AttemptEvent::Cancelled;
                }
                Some(loaded) = progress_rx.recv() => self.on_progress(loaded, total),
                result = &mut response => {
                    return match result {
                        Ok(resp) => AttemptEvent::Responded(classify_response(&resp, self.file.name())),
                        Err(TransportError::Connection(reason)) => AttemptEvent::NetworkError(reason),
                    };
                }
                _ = &mut deadline => return AttemptEvent::TimedOut,
            }
        }
    }

    fn on_progress(&mut self, loaded: u64, total: u64) {
        self.attempt.bytes_sent = loaded;

        if let Some(milestone) = self.milestones.observe(loaded, total) {
            info!(
                file = %self.file.name(),
                progress = milestone,
                loaded = %format_file_size(loaded),
                total = %format_file_size(total),
                "upload progress"
            );
        }

        if self.throttle.should_emit(Instant::now()) {
            let update = self.aggregator.record_tick(loaded, total);
            trace!(file = %update.file_name, percent = update.percent, "progress");
            self.notifier.on_progress(&update);
        }
    }

    /// Announces the retry, then sleeps unless cancelled first.
    async fn wait_backoff(&mut self, retry: u32, delay: Duration) -> AttemptEvent {
        let reason = self.attempt.last_error.clone().unwrap_or_default();
        warn!(
            file = %self.file.name(),
            retry,
            max_retries = self.policy.retry.max_retries,
            delay_ms = delay.as_millis() as u64,
            "connection failed, retrying: {reason}"
        );
        self.notifier.on_retry(&RetryNotice {
            file_index: self.index,
            file_name: self.file.name().to_string(),
            retry,
            max_retries: self.policy.retry.max_retries,
            delay,
            reason,
        });

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(file = %self.file.name(), "retry cancelled");
                AttemptEvent::Cancelled
            }
            _ = tokio::time::sleep(delay) => AttemptEvent::BackoffElapsed,
        }
    }

    /// Compares the local file with what the backend reported, when it
    /// reported both size and hash. Mismatches are logged, never fatal.
    async fn check_integrity(&self, receipt: &UploadReceipt) -> Option<IntegrityResult> {
        let (Some(size), Some(hash)) = (receipt.size, receipt.hash.as_deref()) else {
            return None;
        };
        match self.file.verify_integrity(size, hash).await {
            Ok(result) => {
                match &result.mismatch {
                    Some(mismatch) => {
                        warn!(file = %self.file.name(), "integrity check failed: {mismatch}")
                    }
                    None => debug!(file = %self.file.name(), "integrity verified"),
                }
                Some(result)
            }
            Err(e) => {
                warn!(file = %self.file.name(), "integrity check skipped: {e}");
                None
            }
        }
    }
}
