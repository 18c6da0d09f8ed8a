//! Transport seam between the upload state machine and the network.
//!
//! `UploadTransport` is implemented by [`HttpTransport`](crate::http::HttpTransport)
//! for real uploads and by mocks in tests.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Capacity of the per-attempt progress channel. Reports that do not fit
/// are dropped by the transport.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// One outbound upload request: a single file and its metadata.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    /// Byte length sent as `originalSize`.
    pub original_size: u64,
    /// Submission time in epoch milliseconds, sent as `timestamp`.
    pub timestamp: i64,
    /// File content, shared with the descriptor when held in memory.
    pub content: Bytes,
}

/// Raw response: transport status plus body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends upload requests to the backend.
pub trait UploadTransport: Send + Sync {
    /// Sends one request and waits for the response.
    ///
    /// Cumulative bytes sent are reported on `progress` with `try_send`.
    /// Any response, whatever its status, is `Ok`; `Err` means no response
    /// was received. Dropping the returned future aborts the request.
    fn send(
        &self,
        request: UploadRequest,
        progress: mpsc::Sender<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + '_>>;

    /// URL the transport sends to, for error messages and logs.
    fn endpoint(&self) -> &str;
}
