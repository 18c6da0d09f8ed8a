pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use messages::UploadResponse;
pub use types::{ProgressUpdate, UploadStats};
