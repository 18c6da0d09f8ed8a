//! Registry of running jobs and their in-flight attempts.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::types::JobId;

struct JobEntry {
    token: CancellationToken,
    /// Attempt id -> cancellation token. At most one entry per job.
    attempts: HashMap<String, CancellationToken>,
}

/// Maps each running job to its cancellation token and live attempts.
///
/// Owned by one scheduler. The lock is only held for map updates, never
/// across an await.
#[derive(Default)]
pub(crate) struct ActiveUploads {
    jobs: Mutex<HashMap<JobId, JobEntry>>,
}

impl ActiveUploads {
    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, JobEntry>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a job. Returns `false`, leaving the existing entry alone,
    /// if the job is already registered.
    pub(crate) fn register_job(&self, job_id: JobId, token: CancellationToken) -> bool {
        match self.lock().entry(job_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(JobEntry {
                    token,
                    attempts: HashMap::new(),
                });
                true
            }
        }
    }

    pub(crate) fn finish_job(&self, job_id: JobId) {
        self.lock().remove(&job_id);
    }

    pub(crate) fn track_attempt(&self, job_id: JobId, attempt_id: &str, token: CancellationToken) {
        if let Some(entry) = self.lock().get_mut(&job_id) {
            entry.attempts.insert(attempt_id.to_string(), token);
        }
    }

    pub(crate) fn finish_attempt(&self, job_id: JobId, attempt_id: &str) {
        if let Some(entry) = self.lock().get_mut(&job_id) {
            entry.attempts.remove(attempt_id);
        }
    }

    /// Cancels a job and every attempt it is tracking.
    ///
    /// Returns `false` if the job is not running.
    pub(crate) fn cancel_job(&self, job_id: JobId) -> bool {
        let mut jobs = self.lock();
        let Some(entry) = jobs.get_mut(&job_id) else {
            return false;
        };
        info!(job = %job_id, active = entry.attempts.len(), "cancelling active uploads");
        for (attempt_id, token) in entry.attempts.drain() {
            token.cancel();
            debug!(job = %job_id, attempt = %attempt_id, "cancelled upload");
        }
        entry.token.cancel();
        true
    }

    /// Number of attempts in flight across all jobs.
    pub(crate) fn active_attempts(&self) -> usize {
        self.lock().values().map(|e| e.attempts.len()).sum()
    }
}
