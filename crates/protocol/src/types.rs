use serde::{Deserialize, Serialize};

/// Aggregate statistics for one upload job.
///
/// `uploaded_bytes` is a running total of the sizes of files that
/// completed successfully; it does not include partial progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStats {
    pub total_files: usize,
    pub uploaded_files: usize,
    pub failed_files: usize,
    pub total_bytes: u64,
    pub uploaded_bytes: u64,
}

impl UploadStats {
    /// Number of files that reached a terminal state.
    pub fn settled_files(&self) -> usize {
        self.uploaded_files + self.failed_files
    }

    /// Returns `true` once every file has succeeded or failed.
    pub fn is_settled(&self) -> bool {
        self.settled_files() == self.total_files
    }
}

/// A progress update for the file currently being sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// Zero-based position of the file in the job.
    pub file_index: usize,
    pub total_files: usize,
    pub file_name: String,
    /// Percent of the current file sent (0-100).
    pub percent: f64,
    pub bytes_loaded: u64,
    pub bytes_total: u64,
    /// Approximate percent of the whole job sent (0-100).
    pub overall_percent: f64,
}

impl ProgressUpdate {
    /// Bytes of the current file not yet sent.
    pub fn remaining_bytes(&self) -> u64 {
        self.bytes_total.saturating_sub(self.bytes_loaded)
    }
}
