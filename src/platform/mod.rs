//! Thin platform facade: free-space queries, process self-stats, and a
//! process-local monotonic millisecond clock.

#![allow(missing_docs)]

use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

use crate::core::errors::{Result, SpoolError};

// ──────────────────── clock ────────────────────

/// Milliseconds since a process-local monotonic origin.
///
/// Uses `Instant` (monotonic clock) instead of `SystemTime` so stored
/// timestamps are immune to wall-clock adjustment.
#[must_use]
pub fn monotonic_ms() -> u64 {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    let origin = *ORIGIN.get_or_init(Instant::now);
    u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX)
}

// ──────────────────── free space ────────────────────

/// Bytes available to unprivileged writers on the filesystem holding `path`.
#[cfg(unix)]
pub fn free_space(path: &Path) -> Result<u64> {
    let stat = nix::sys::statvfs::statvfs(path).map_err(|error| SpoolError::DiskStats {
        path: path.to_path_buf(),
        details: format!("statvfs failed: {error}"),
    })?;
    let fragment = stat.fragment_size();
    Ok(stat.blocks_available().saturating_mul(fragment))
}

#[cfg(not(unix))]
pub fn free_space(path: &Path) -> Result<u64> {
    Err(SpoolError::DiskStats {
        path: path.to_path_buf(),
        details: "free-space query not supported on this platform".to_string(),
    })
}

// ──────────────────── process stats ────────────────────

/// Process self-metrics for the sys heartbeat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub rss_bytes: u64,
    pub vsize_bytes: u64,
    pub threads: u64,
}

/// Read RSS, virtual size, and thread count from `/proc/self/status`.
/// Returns `None` where procfs is unavailable.
#[must_use]
pub fn process_stats() -> Option<ProcessStats> {
    let raw = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_proc_status(&raw)
}

fn parse_proc_status(raw: &str) -> Option<ProcessStats> {
    let mut stats = ProcessStats::default();
    let mut seen = 0_u8;
    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            stats.rss_bytes = parse_kb_line(rest)?;
            seen += 1;
        } else if let Some(rest) = line.strip_prefix("VmSize:") {
            stats.vsize_bytes = parse_kb_line(rest)?;
            seen += 1;
        } else if let Some(rest) = line.strip_prefix("Threads:") {
            stats.threads = rest.trim().parse().ok()?;
            seen += 1;
        }
    }
    (seen == 3).then_some(stats)
}

/// Parse a `/proc` "`   1234 kB`" field into bytes.
fn parse_kb_line(rest: &str) -> Option<u64> {
    let kb: u64 = rest.trim().strip_suffix("kB")?.trim().parse().ok()?;
    Some(kb.saturating_mul(1024))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_ms_is_nondecreasing() {
        let a = monotonic_ms();
        let b = monotonic_ms();
        assert!(b >= a);
    }

    #[cfg(unix)]
    #[test]
    fn free_space_reports_for_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        let free = free_space(dir.path()).unwrap();
        assert!(free > 0);
    }

    #[cfg(unix)]
    #[test]
    fn free_space_errors_for_missing_path() {
        let err = free_space(Path::new("/nonexistent_logspool_test_dir_9921")).unwrap_err();
        assert_eq!(err.code(), "LSP-2002");
    }

    #[test]
    fn proc_status_parses_expected_fields() {
        let raw = "Name:\ttest\nVmSize:\t  204800 kB\nVmRSS:\t   10240 kB\nThreads:\t7\n";
        let stats = parse_proc_status(raw).unwrap();
        assert_eq!(stats.vsize_bytes, 204_800 * 1024);
        assert_eq!(stats.rss_bytes, 10_240 * 1024);
        assert_eq!(stats.threads, 7);
    }

    #[test]
    fn proc_status_incomplete_returns_none() {
        assert!(parse_proc_status("Name:\ttest\n").is_none());
    }
}
