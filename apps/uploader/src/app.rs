//! Wires the CLI to the upload scheduler.

use std::sync::Arc;

use anyhow::Context;
use rapidcomm_transfer::FileDescriptor;
use rapidcomm_upload::{HttpTransport, JobOutcome, UploadJob, UploadScheduler, UploaderConfig};

use crate::notifier::LogNotifier;

/// Uploads `paths` in order. Returns `true` if any file did not upload.
pub async fn run(config: UploaderConfig, paths: Vec<String>) -> anyhow::Result<bool> {
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let file = FileDescriptor::from_path(path)
            .await
            .with_context(|| format!("cannot open {path}"))?;
        files.push(file);
    }

    let transport = Arc::new(HttpTransport::new(config.endpoint.clone())?);
    let scheduler = UploadScheduler::from_config(&config, transport, Arc::new(LogNotifier));

    let job = UploadJob::new(files);
    let cancel = scheduler.cancel_handle(&job);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("SIGINT received, cancelling uploads");
            cancel.cancel();
        }
    });

    let result = scheduler.submit(job).await?;
    Ok(result.has_errors || result.outcome == JobOutcome::Cancelled)
}
