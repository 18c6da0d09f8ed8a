use serde::{Deserialize, Serialize};

use crate::types::FileDescriptor;

/// Default maximum number of files per job.
pub const DEFAULT_MAX_FILES: usize = 50;

/// Default ceiling on the summed size of a job (1 GiB).
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 1024 * 1024 * 1024;

/// Default ceiling on a single file (100 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Size and count ceilings checked before a job touches the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    pub max_files: usize,
    pub max_total_bytes: u64,
    pub max_file_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Why a job was rejected before any transfer started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no files selected")]
    NoFiles,

    #[error("too many files selected: {count} (maximum {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("total file size {total} bytes exceeds the {max} byte limit")]
    TotalSizeExceeded { total: u64, max: u64 },

    #[error("file \"{name}\" ({size} bytes) exceeds the {max} byte limit")]
    FileTooLarge { name: String, size: u64, max: u64 },

    #[error("file \"{name}\" is empty")]
    EmptyFile { name: String },
}

/// Checks a job's files against `limits`.
///
/// Checks run in a fixed order and the first violation wins:
/// - Empty file list
/// - Too many files
/// - Summed size over the job ceiling
/// - A single file over the per-file ceiling
/// - A zero-length file
pub fn validate_files(
    files: &[FileDescriptor],
    limits: &UploadLimits,
) -> Result<(), ValidationError> {
    if files.is_empty() {
        return Err(ValidationError::NoFiles);
    }

    if files.len() > limits.max_files {
        return Err(ValidationError::TooManyFiles {
            count: files.len(),
            max: limits.max_files,
        });
    }

    let total = files
        .iter()
        .fold(0u64, |sum, f| sum.saturating_add(f.size()));
    if total > limits.max_total_bytes {
        return Err(ValidationError::TotalSizeExceeded {
            total,
            max: limits.max_total_bytes,
        });
    }

    if let Some(f) = files.iter().find(|f| f.size() > limits.max_file_bytes) {
        return Err(ValidationError::FileTooLarge {
            name: f.name().to_string(),
            size: f.size(),
            max: limits.max_file_bytes,
        });
    }

    if let Some(f) = files.iter().find(|f| f.size() == 0) {
        return Err(ValidationError::EmptyFile {
            name: f.name().to_string(),
        });
    }

    Ok(())
}
