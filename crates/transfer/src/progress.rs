use std::time::Duration;

use rapidcomm_protocol::types::{ProgressUpdate, UploadStats};
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// ProgressAggregator
// ---------------------------------------------------------------------------

/// Folds per-file progress into job-wide statistics.
///
/// Only one file is in flight at a time, so job progress is estimated as
/// `index * average_file_size + loaded` over the job's total bytes. Files
/// of uneven size make this drift; it is an estimate, not a byte ledger.
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    stats: UploadStats,
    current_index: usize,
    current_name: String,
}

impl ProgressAggregator {
    /// Creates an aggregator for a job whose files have the given sizes.
    pub fn new(sizes: impl IntoIterator<Item = u64>) -> Self {
        let (total_files, total_bytes) = sizes
            .into_iter()
            .fold((0usize, 0u64), |(n, sum), s| (n + 1, sum.saturating_add(s)));
        Self {
            stats: UploadStats {
                total_files,
                total_bytes,
                ..Default::default()
            },
            current_index: 0,
            current_name: String::new(),
        }
    }

    /// Marks `index` as the file now being sent.
    pub fn begin_file(&mut self, index: usize, name: &str) {
        self.current_index = index;
        self.current_name = name.to_string();
    }

    /// Builds a progress update for the current file.
    pub fn record_tick(&self, loaded: u64, total: u64) -> ProgressUpdate {
        let percent = if total == 0 {
            0.0
        } else {
            (loaded as f64 / total as f64 * 100.0).min(100.0)
        };
        ProgressUpdate {
            file_index: self.current_index,
            total_files: self.stats.total_files,
            file_name: self.current_name.clone(),
            percent,
            bytes_loaded: loaded,
            bytes_total: total,
            overall_percent: self.overall_percent(loaded),
        }
    }

    /// Approximate percent of the whole job sent, given the bytes loaded
    /// for the current file.
    pub fn overall_percent(&self, loaded: u64) -> f64 {
        if self.stats.total_bytes == 0 || self.stats.total_files == 0 {
            return 0.0;
        }
        let total = self.stats.total_bytes as f64;
        let avg_file_size = total / self.stats.total_files as f64;
        let completed = self.current_index as f64 * avg_file_size;
        ((completed + loaded as f64) / total * 100.0).min(100.0)
    }

    /// Records a file that uploaded successfully.
    pub fn record_success(&mut self, size: u64) {
        self.stats.uploaded_files += 1;
        self.stats.uploaded_bytes = self.stats.uploaded_bytes.saturating_add(size);
    }

    /// Records a file that failed.
    pub fn record_failure(&mut self) {
        self.stats.failed_files += 1;
    }

    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> UploadStats {
        self.stats.clone()
    }
}

// ---------------------------------------------------------------------------
// ProgressThrottle
// ---------------------------------------------------------------------------

/// Leading-edge rate limiter for progress ticks.
///
/// The first tick passes; ticks arriving within `interval` of the last
/// emitted one are dropped.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
        }
    }

    /// Returns `true` if a tick observed at `now` should be emitted.
    pub fn should_emit(&mut self, now: Instant) -> bool {
        match self.last_emit {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }

    /// Forgets the last emission, e.g. when a new attempt starts.
    pub fn reset(&mut self) {
        self.last_emit = None;
    }
}

// ---------------------------------------------------------------------------
// MilestoneTracker
// ---------------------------------------------------------------------------

/// Reports each new `step`-percent milestone crossed by a large file.
#[derive(Debug, Clone)]
pub struct MilestoneTracker {
    threshold: u64,
    step: u32,
    last: u32,
}

impl MilestoneTracker {
    /// Files of at most `threshold` bytes never report milestones.
    pub fn new(threshold: u64, step: u32) -> Self {
        Self {
            threshold,
            step: step.max(1),
            last: 0,
        }
    }

    /// Returns the milestone reached, if it is new and above zero.
    pub fn observe(&mut self, loaded: u64, total: u64) -> Option<u32> {
        if total <= self.threshold {
            return None;
        }
        let percent = (loaded.min(total) as f64 / total as f64 * 100.0) as u32;
        let milestone = percent / self.step * self.step;
        if milestone > 0 && milestone != self.last {
            self.last = milestone;
            Some(milestone)
        } else {
            None
        }
    }
}

/// Formats a byte count for humans: `0 Bytes`, `1.5 KB`, `12.34 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
