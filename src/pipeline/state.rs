//! Process-wide shared state for one logger instance.
//!
//! Every field is an atomic with single-writer discipline: the processor
//! owns `current_size`, `earliest_file_ms`, and the processed/rotation/
//! deletion counters; producers additionally increment the `dropped_*`
//! pair; lifecycle calls own the boolean flags.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::platform::monotonic_ms;

/// Atomic state shared between producers, the processor, and lifecycle
/// calls.
#[derive(Debug, Default)]
pub(crate) struct SharedState {
    // Lifecycle flags.
    pub initialized: AtomicBool,
    pub started: AtomicBool,
    pub shutdown_called: AtomicBool,
    /// Set on unrecoverable rotation failure; file output stops.
    pub disabled: AtomicBool,
    pub processor_exited: AtomicBool,

    // Disk health.
    pub disk_ok: AtomicBool,
    /// De-duplicates the disk-full error record.
    pub disk_full_reported: AtomicBool,

    // Counters.
    pub current_size: AtomicU64,
    /// Unix ms mtime of the oldest archived file; 0 = none known.
    pub earliest_file_ms: AtomicU64,
    /// Drops since the last successful proc heartbeat.
    pub dropped_interval: AtomicU64,
    /// Lifetime drops.
    pub dropped_total: AtomicU64,
    pub processed_total: AtomicU64,
    pub rotations_total: AtomicU64,
    pub deletions_total: AtomicU64,
    pub heartbeat_seq: AtomicU64,
    /// Monotonic ms at first successful start; 0 = never started.
    pub start_ms: AtomicU64,
}

impl SharedState {
    pub fn new() -> Self {
        let state = Self::default();
        state.disk_ok.store(true, Ordering::Relaxed);
        state
    }

    /// Record one dropped record. Called by producers on failed send and by
    /// the processor on discard paths.
    pub fn count_drop(&self) {
        self.dropped_interval.fetch_add(1, Ordering::Relaxed);
        self.dropped_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Take the interval drop count; only the proc heartbeat calls this.
    pub fn take_interval_drops(&self) -> u64 {
        self.dropped_interval.swap(0, Ordering::Relaxed)
    }

    /// Capture the start instant once; later calls keep the first value.
    pub fn mark_started(&self) {
        let _ = self
            .start_ms
            .compare_exchange(0, monotonic_ms().max(1), Ordering::Relaxed, Ordering::Relaxed);
    }

    /// Hours since the first successful start, or 0.0 if never started.
    #[allow(clippy::cast_precision_loss)]
    pub fn uptime_hours(&self) -> f64 {
        let start = self.start_ms.load(Ordering::Relaxed);
        if start == 0 {
            return 0.0;
        }
        let elapsed = monotonic_ms().saturating_sub(start);
        elapsed as f64 / 3_600_000.0
    }

    pub fn snapshot(&self) -> LoggerStats {
        LoggerStats {
            dropped_total: self.dropped_total.load(Ordering::Relaxed),
            dropped_interval: self.dropped_interval.load(Ordering::Relaxed),
            processed_total: self.processed_total.load(Ordering::Relaxed),
            rotations_total: self.rotations_total.load(Ordering::Relaxed),
            deletions_total: self.deletions_total.load(Ordering::Relaxed),
            current_file_size: self.current_size.load(Ordering::Relaxed),
            disk_ok: self.disk_ok.load(Ordering::Relaxed),
        }
    }
}

/// Public counter snapshot, readable at any time without blocking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerStats {
    /// Lifetime records dropped (channel full/closed, disk unhealthy, write
    /// errors).
    pub dropped_total: u64,
    /// Drops since the last successful proc heartbeat.
    pub dropped_interval: u64,
    /// Records written to the active file.
    pub processed_total: u64,
    /// Completed rotations.
    pub rotations_total: u64,
    /// Archived files deleted by pruning or retention.
    pub deletions_total: u64,
    /// Bytes in the active file since creation or last rotation.
    pub current_file_size: u64,
    /// Last disk-check verdict.
    pub disk_ok: bool,
}
