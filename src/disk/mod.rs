//! Disk-space policy: periodic and reactive health checks, cleanup
//! triggering, and adaptive adjustment of the check interval from the
//! observed log rate.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant, SystemTime};

use crate::core::config::LimitsConfig;
use crate::files::FileSink;
use crate::pipeline::state::SharedState;
use crate::platform;

/// Bytes written between reactive (non-forced) checks.
const REACTIVE_CHECK_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Adaptive-interval baseline: the rate the default interval is tuned for.
const TARGET_LOGS_PER_SEC: f64 = 100.0;

/// Verdict of one disk check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CheckVerdict {
    Healthy,
    /// `report` is set on the first failed cleanup after a healthy phase;
    /// the processor emits a single error record for it.
    Unhealthy { report: bool },
}

/// Per-processor accounting for check scheduling. Owned by the processor;
/// reset whenever a new processor starts.
#[derive(Debug)]
pub(crate) struct DiskPolicy {
    bytes_since_check: u64,
    logs_since_check: u64,
    last_check: Instant,
    interval: Duration,
}

impl DiskPolicy {
    pub fn new(interval: Duration) -> Self {
        Self {
            bytes_since_check: 0,
            logs_since_check: 0,
            last_check: Instant::now(),
            interval,
        }
    }

    /// Current (possibly adapted) periodic check interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Account one written record. Returns true when enough bytes have
    /// accumulated to warrant a reactive (non-forced) check.
    pub fn record_written(&mut self, bytes: u64) -> bool {
        self.bytes_since_check += bytes;
        self.logs_since_check += 1;
        if self.bytes_since_check >= REACTIVE_CHECK_THRESHOLD {
            self.bytes_since_check = 0;
            return true;
        }
        false
    }

    /// Adapt the periodic interval to the observed log rate, then reset the
    /// rate counters. Returns the new interval when it changed.
    pub fn adapt(&mut self, min: Duration, max: Duration) -> Option<Duration> {
        let elapsed = self.last_check.elapsed();
        let next = adjust_interval(self.interval, self.logs_since_check, elapsed, min, max);
        self.reset_counters();
        if next == self.interval {
            None
        } else {
            self.interval = next;
            Some(next)
        }
    }

    /// Reset rate counters after a successful periodic check.
    pub fn reset_counters(&mut self) {
        self.bytes_since_check = 0;
        self.logs_since_check = 0;
        self.last_check = Instant::now();
    }
}

/// Pure adaptive-interval step: slow down below half the target rate,
/// speed up above double, clamp to `[min, max]`.
fn adjust_interval(
    current: Duration,
    logs: u64,
    elapsed: Duration,
    min: Duration,
    max: Duration,
) -> Duration {
    let elapsed_ms = elapsed.as_millis().max(10);
    #[allow(clippy::cast_precision_loss)]
    let rate = (logs as f64 * 1000.0) / elapsed_ms as f64;

    let adjusted = if rate < 0.5 * TARGET_LOGS_PER_SEC {
        current.mul_f64(1.5)
    } else if rate > 2.0 * TARGET_LOGS_PER_SEC {
        current.mul_f64(0.8)
    } else {
        current
    };

    adjusted.clamp(min, max)
}

/// Run one disk check against the sink's directory.
///
/// Forced checks may clean up; non-forced checks only observe. Updates
/// `disk_ok`, `disk_full_reported`, `deletions_total`, and
/// `earliest_file_ms` on the shared state.
pub(crate) fn run_check(
    sink: &FileSink,
    state: &SharedState,
    limits: &LimitsConfig,
    forced: bool,
) -> CheckVerdict {
    if limits.max_total_size_kb == 0 && limits.min_disk_free_kb == 0 {
        return mark_healthy(state);
    }

    let free = match platform::free_space(sink.directory()) {
        Ok(free) => free,
        Err(_) => return mark_unhealthy(state, false),
    };

    let mut space_to_free = limits
        .min_disk_free_kb
        .saturating_mul(1000)
        .saturating_sub(free);

    if limits.max_total_size_kb > 0 {
        let Ok((total, _)) = sink.extension_stats() else {
            return mark_unhealthy(state, false);
        };
        let limit = limits.max_total_size_kb.saturating_mul(1000);
        if total > limit {
            space_to_free = space_to_free.max(total - limit);
        }
    }

    if space_to_free == 0 {
        return mark_healthy(state);
    }
    if !forced {
        return mark_unhealthy(state, false);
    }

    match sink.prune(space_to_free) {
        Ok(outcome) => {
            state
                .deletions_total
                .fetch_add(outcome.deleted, Ordering::Relaxed);
            refresh_earliest(sink, state);
            mark_healthy(state)
        }
        Err(_) => {
            let first = !state.disk_full_reported.swap(true, Ordering::Relaxed);
            state.disk_ok.store(false, Ordering::Relaxed);
            CheckVerdict::Unhealthy { report: first }
        }
    }
}

/// Re-scan the archive for the oldest file and publish its mtime.
pub(crate) fn refresh_earliest(sink: &FileSink, state: &SharedState) {
    let earliest_ms = sink
        .earliest_archived()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
    state.earliest_file_ms.store(earliest_ms, Ordering::Relaxed);
}

fn mark_healthy(state: &SharedState) -> CheckVerdict {
    state.disk_ok.store(true, Ordering::Relaxed);
    state.disk_full_reported.store(false, Ordering::Relaxed);
    CheckVerdict::Healthy
}

fn mark_unhealthy(state: &SharedState, report: bool) -> CheckVerdict {
    state.disk_ok.store(false, Ordering::Relaxed);
    CheckVerdict::Unhealthy { report }
}

// ──────────────────── tests ────────────────────
