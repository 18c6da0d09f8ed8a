//! Scripted transport and recording notifier shared by the crate's tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rapidcomm_protocol::types::ProgressUpdate;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::TransportError;
use crate::notifier::UploadNotifier;
use crate::transport::{TransportResponse, UploadRequest, UploadTransport};
use crate::types::{FileOutcome, JobSummary, RetryNotice, UploadEvent};

pub(crate) const ENDPOINT: &str = "http://localhost:8080/upload";
pub(crate) const SUCCESS: &str = r#"{"status":"success","message":"ok"}"#;

/// What the mock does with one request.
pub(crate) enum Step {
    Respond(u16, String),
    NetworkError,
    /// Fails with a connection error after the given delay.
    FailAfter(Duration),
    /// Never answers; only cancellation or the deadline end the attempt.
    Hang,
    /// Sleeps before each progress report, then answers.
    Progress {
        ticks: Vec<(Duration, u64)>,
        status: u16,
        body: String,
    },
}

impl Step {
    pub(crate) fn ok() -> Self {
        Self::Respond(200, SUCCESS.into())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub file_name: String,
    pub original_size: u64,
    pub timestamp: i64,
    pub at: Instant,
}

/// Plays back a script of [`Step`]s, one per request. An exhausted script
/// answers with success.
#[derive(Default)]
pub(crate) struct MockTransport {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    aborted: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.file_name).collect()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Requests dropped before they answered.
    pub(crate) fn aborted(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }

    async fn handle(
        &self,
        request: UploadRequest,
        progress: mpsc::Sender<u64>,
    ) -> Result<TransportResponse, TransportError> {
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Step::ok);
        self.calls.lock().unwrap().push(Call {
            file_name: request.file_name,
            original_size: request.original_size,
            timestamp: request.timestamp,
            at: Instant::now(),
        });

        let mut guard = InFlight::enter(self);
        let result = match step {
            Step::Respond(status, body) => Ok(response(status, body)),
            Step::NetworkError => Err(refused()),
            Step::FailAfter(after) => {
                tokio::time::sleep(after).await;
                Err(refused())
            }
            Step::Hang => std::future::pending().await,
            Step::Progress {
                ticks,
                status,
                body,
            } => {
                for (after, loaded) in ticks {
                    tokio::time::sleep(after).await;
                    let _ = progress.send(loaded).await;
                }
                Ok(response(status, body))
            }
        };
        guard.completed = true;
        result
    }
}

fn refused() -> TransportError {
    TransportError::Connection("connection refused".into())
}

fn response(status: u16, body: String) -> TransportResponse {
    TransportResponse {
        status,
        body: body.into_bytes(),
    }
}

struct InFlight<'a> {
    mock: &'a MockTransport,
    completed: bool,
}

impl<'a> InFlight<'a> {
    fn enter(mock: &'a MockTransport) -> Self {
        let now = mock.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        mock.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self {
            mock,
            completed: false,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.mock.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !self.completed {
            self.mock.aborted.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl UploadTransport for MockTransport {
    fn send(
        &self,
        request: UploadRequest,
        progress: mpsc::Sender<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + '_>> {
        Box::pin(self.handle(request, progress))
    }

    fn endpoint(&self) -> &str {
        ENDPOINT
    }
}

/// Keeps every event it receives.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    events: Mutex<Vec<UploadEvent>>,
}

impl RecordingNotifier {
    pub(crate) fn events(&self) -> Vec<UploadEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn progress(&self) -> Vec<ProgressUpdate> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UploadEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn retries(&self) -> Vec<RetryNotice> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UploadEvent::Retry(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn settled_files(&self) -> Vec<FileOutcome> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UploadEvent::FileSettled(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn job_summary(&self) -> Option<JobSummary> {
        self.events().into_iter().find_map(|e| match e {
            UploadEvent::JobSettled(s) => Some(s),
            _ => None,
        })
    }

    pub(crate) fn cancelled(&self) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, UploadEvent::Cancelled))
    }

    fn push(&self, event: UploadEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl UploadNotifier for RecordingNotifier {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.push(UploadEvent::Progress(update.clone()));
    }

    fn on_file_settled(&self, outcome: &FileOutcome) {
        self.push(UploadEvent::FileSettled(outcome.clone()));
    }

    fn on_job_settled(&self, summary: &JobSummary) {
        self.push(UploadEvent::JobSettled(summary.clone()));
    }

    fn on_cancelled(&self) {
        self.push(UploadEvent::Cancelled);
    }

    fn on_retry(&self, notice: &RetryNotice) {
        self.push(UploadEvent::Retry(notice.clone()));
    }
}
