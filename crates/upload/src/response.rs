//! Classification of backend responses into receipts or per-file errors.

use rapidcomm_protocol::UploadResponse;

use crate::error::UploadError;
use crate::transport::TransportResponse;

/// Parsed success payload for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Name the backend stored the file under.
    pub filename: String,
    /// Size the backend stored, if reported.
    pub size: Option<u64>,
    /// Backend-side integrity digest, if reported.
    pub hash: Option<String>,
    pub message: Option<String>,
}

/// Turns a raw response into a receipt or a terminal error.
///
/// The transport status decides first: anything outside 2xx is an
/// [`UploadError::Http`] whatever the body says. A 2xx body must then parse
/// and declare `status: "success"`.
pub fn classify_response(
    response: &TransportResponse,
    local_name: &str,
) -> Result<UploadReceipt, UploadError> {
    let status = response.status;

    if !(200..300).contains(&status) {
        let message = serde_json::from_slice::<UploadResponse>(&response.body)
            .ok()
            .and_then(|r| r.message)
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(UploadError::Http { status, message });
    }

    let parsed: UploadResponse = serde_json::from_slice(&response.body)
        .map_err(|e| UploadError::Parse(e.to_string()))?;

    if !parsed.is_success() {
        return Err(UploadError::Http {
            status,
            message: parsed.message.unwrap_or_else(|| "upload failed".into()),
        });
    }

    Ok(UploadReceipt {
        filename: parsed.filename.unwrap_or_else(|| local_name.to_string()),
        size: parsed.size,
        hash: parsed.hash,
        message: parsed.message,
    })
}
