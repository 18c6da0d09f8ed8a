//! HTTP transport: one multipart `POST` per file, via `reqwest`.

use std::future::Future;
use std::pin::Pin;

use rapidcomm_protocol::constants::{
    FIELD_FILE, FIELD_ORIGINAL_SIZE, FIELD_TIMESTAMP, FILE_CONTENT_TYPE,
};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::TransportError;
use crate::transport::{TransportResponse, UploadRequest, UploadTransport};

/// Size of the body pieces handed to the HTTP client. Progress is reported
/// once per piece.
const BODY_CHUNK_SIZE: usize = 64 * 1024;

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Connection(e.to_string())
    }
}

/// Uploads files to a RapidComm backend over HTTP(S).
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Creates a transport that posts to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    async fn post(
        &self,
        request: UploadRequest,
        progress: mpsc::Sender<u64>,
    ) -> Result<TransportResponse, TransportError> {
        let length = request.content.len() as u64;
        let part = Part::stream_with_length(progress_body(request.content, progress), length)
            .file_name(request.file_name.clone())
            .mime_str(FILE_CONTENT_TYPE)?;
        let form = Form::new()
            .part(FIELD_FILE, part)
            .text(FIELD_ORIGINAL_SIZE, request.original_size.to_string())
            .text(FIELD_TIMESTAMP, request.timestamp.to_string());

        debug!(endpoint = %self.endpoint, file = %request.file_name, bytes = length, "sending upload request");

        let resp = self.http.post(&self.endpoint).multipart(form).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();

        Ok(TransportResponse { status, body })
    }
}

impl UploadTransport for HttpTransport {
    fn send(
        &self,
        request: UploadRequest,
        progress: mpsc::Sender<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + '_>> {
        Box::pin(self.post(request, progress))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Wraps file content in a streamed body that reports cumulative bytes as
/// the client pulls each piece.
fn progress_body(content: Bytes, progress: mpsc::Sender<u64>) -> reqwest::Body {
    let mut sent: u64 = 0;
    let stream = futures_util::stream::iter(body_pieces(content).map(move |piece| {
        sent += piece.len() as u64;
        // Non-blocking; a full channel drops the report.
        let _ = progress.try_send(sent);
        Ok::<_, std::io::Error>(piece)
    }));
    reqwest::Body::wrap_stream(stream)
}

/// Splits `content` into views of at most [`BODY_CHUNK_SIZE`] bytes over
/// the same buffer.
fn body_pieces(content: Bytes) -> impl Iterator<Item = Bytes> {
    (0..content.len())
        .step_by(BODY_CHUNK_SIZE)
        .map(move |start| content.slice(start..(start + BODY_CHUNK_SIZE).min(content.len())))
}
