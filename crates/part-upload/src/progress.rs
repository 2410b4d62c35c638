use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Byte counter shared by every worker of one upload.
#[derive(Debug)]
pub struct ProgressTracker {
    total_bytes: u64,
    transferred: AtomicU64,
    started_at: Instant,
}

/// Point-in-time view of a [`ProgressTracker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub transferred_bytes: u64,
    pub total_bytes: u64,
    pub elapsed: Duration,
}

impl ProgressTracker {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            transferred: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Records `bytes` as confirmed sent and returns the new running total.
    pub fn add(&self, bytes: u64) -> u64 {
        self.transferred.fetch_add(bytes, Ordering::SeqCst) + bytes
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let transferred = self.transferred.load(Ordering::SeqCst);
        ProgressSnapshot {
            transferred_bytes: transferred.min(self.total_bytes),
            total_bytes: self.total_bytes,
            elapsed: self.started_at.elapsed(),
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

impl ProgressSnapshot {
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.transferred_bytes as f64 / self.total_bytes as f64 * 100.0
    }

    /// Average speed since the tracker was created, in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.transferred_bytes as f64 / secs
        } else {
            0.0
        }
    }

    /// Estimated time left at the current average speed; `None` while nothing has moved.
    pub fn eta(&self) -> Option<Duration> {
        let speed = self.bytes_per_second();
        if speed <= 0.0 {
            return None;
        }
        let remaining = self.total_bytes - self.transferred_bytes;
        Some(Duration::from_secs_f64(remaining as f64 / speed))
    }

    pub fn is_complete(&self) -> bool {
        self.transferred_bytes == self.total_bytes
    }
}
