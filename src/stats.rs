use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the status poller
#[derive(Debug, Default)]
pub struct PollStats {
    pub attempts: AtomicU64,
    pub successes: AtomicU64,
    pub failures: AtomicU64,
    /// Ticks that elapsed while a request was still pending
    pub skipped_ticks: AtomicU64,
    last_success: Mutex<Option<DateTime<Utc>>>,
}

impl PollStats {
    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        *self.last_success.lock() = Some(Utc::now());
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self, ticks: u64) {
        if ticks > 0 {
            self.skipped_ticks.fetch_add(ticks, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> PollStatsSnapshot {
        PollStatsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            skipped_ticks: self.skipped_ticks.load(Ordering::Relaxed),
            last_success: *self.last_success.lock(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollStatsSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub skipped_ticks: u64,
    pub last_success: Option<DateTime<Utc>>,
}

impl PollStatsSnapshot {
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }
}

/// Counters for the reservation toggler
#[derive(Debug, Default)]
pub struct ToggleStats {
    pub requests: AtomicU64,
    pub applied: AtomicU64,
    pub failed: AtomicU64,
    pub rejected_busy: AtomicU64,
}

impl ToggleStats {
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_busy(&self) {
        self.rejected_busy.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ToggleStatsSnapshot {
        ToggleStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected_busy: self.rejected_busy.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleStatsSnapshot {
    pub requests: u64,
    pub applied: u64,
    pub failed: u64,
    pub rejected_busy: u64,
}
