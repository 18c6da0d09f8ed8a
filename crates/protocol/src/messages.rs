use serde::{Deserialize, Serialize};

use crate::constants::STATUS_SUCCESS;

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// JSON body returned by the backend for an upload request.
///
/// Success: `{"status":"success","filename":..,"size":..,"hash":..}`.
/// Failure: `{"status":"error","message":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl UploadResponse {
    /// Returns `true` if the body declares a successful upload.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Builds an error body, as the backend does for rejected uploads.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: Some(message.into()),
            filename: None,
            size: None,
            hash: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_success_body() {
        let json = r#"{"status":"success","message":"File uploaded successfully","filename":"a.bin","size":10,"hash":"abc"}"#;
        let resp: UploadResponse = serde_json::from_str(json).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.filename.as_deref(), Some("a.bin"));
        assert_eq!(resp.size, Some(10));
        assert_eq!(resp.hash.as_deref(), Some("abc"));
    }

    #[test]
    fn parses_success_without_integrity_fields() {
        let json = r#"{"status":"success","message":"ok","filename":"a.bin"}"#;
        let resp: UploadResponse = serde_json::from_str(json).unwrap();
        assert!(resp.is_success());
        assert!(resp.size.is_none());
        assert!(resp.hash.is_none());
    }

    #[test]
    fn error_body_is_not_success() {
        let json = r#"{"status":"error","message":"disk full"}"#;
        let resp: UploadResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.message.as_deref(), Some("disk full"));
    }

    #[test]
    fn error_constructor_skips_empty_fields() {
        let json = serde_json::to_string(&UploadResponse::error("nope")).unwrap();
        assert_eq!(json, r#"{"status":"error","message":"nope"}"#);
    }

    #[test]
    fn missing_status_fails_to_parse() {
        assert!(serde_json::from_str::<UploadResponse>(r#"{"message":"x"}"#).is_err());
    }
}
