use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::TransferError;
use crate::integrity::{self, IntegrityResult};

/// Where a file's content comes from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Content already held in memory. Clones share the buffer.
    Memory(Bytes),
    /// Content read from disk on every attempt.
    Path(PathBuf),
}

/// A file queued for upload. Immutable once the job starts.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    name: String,
    size: u64,
    source: FileSource,
}

impl FileDescriptor {
    /// Creates a descriptor for in-memory content.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            source: FileSource::Memory(data),
        }
    }

    /// Creates a descriptor for a file on disk, using its current size.
    ///
    /// The name is the final path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, TransferError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(TransferError::NotAFile(path.display().to_string()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte length recorded when the descriptor was created.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Reads the whole content for one upload attempt. In-memory content
    /// is shared, not copied.
    pub async fn read_content(&self) -> Result<Bytes, TransferError> {
        match &self.source {
            FileSource::Memory(data) => Ok(data.clone()),
            FileSource::Path(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
        }
    }

    /// Compares the local content against what the backend reported.
    pub async fn verify_integrity(
        &self,
        remote_size: u64,
        remote_digest: &str,
    ) -> Result<IntegrityResult, TransferError> {
        match &self.source {
            FileSource::Memory(data) => Ok(integrity::verify(data, remote_size, remote_digest)),
            FileSource::Path(path) => {
                let path = path.clone();
                let remote_digest = remote_digest.to_string();
                let result = tokio::task::spawn_blocking(move || {
                    integrity::verify_file(&path, remote_size, &remote_digest)
                })
                .await
                .map_err(|e| TransferError::Io(std::io::Error::other(e)))??;
                Ok(result)
            }
        }
    }
}
