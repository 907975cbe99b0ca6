//! The single consumer: owns all file I/O and multiplexes the record
//! channel against the flush, disk-check, retention, and heartbeat timers.
//!
//! Exactly one processor thread is live at a time. It runs until the record
//! channel it was handed at spawn disconnects, performs a final sync, and
//! returns the file sink through its join handle so the lifecycle can hand
//! it to a successor.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, SystemTime};

use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, Sender, never, select, tick};

use crate::core::config::{Config, ConsoleTarget};
use crate::core::errors::{Result, SpoolError};
use crate::disk::{self, CheckVerdict, DiskPolicy};
use crate::files::FileSink;
use crate::heartbeat;
use crate::pipeline::channel::SwapChannel;
use crate::pipeline::state::SharedState;
use crate::record::{Level, Record, Value};
use crate::serialize;

/// One-shot flush rendezvous placed on the capacity-1 flush channel.
#[derive(Debug)]
pub(crate) struct FlushRequest {
    pub reply: Sender<()>,
}

/// Spawn the processor thread bound to `rx`.
pub(crate) fn spawn(
    rx: Receiver<Record>,
    flush_rx: Receiver<FlushRequest>,
    sink: Option<FileSink>,
    state: Arc<SharedState>,
    config: Arc<ArcSwap<Config>>,
    channel: Arc<SwapChannel>,
) -> Result<thread::JoinHandle<Option<FileSink>>> {
    state.processor_exited.store(false, Ordering::Release);
    thread::Builder::new()
        .name("logspool-processor".to_string())
        .spawn(move || run(rx, flush_rx, sink, &state, &config, &channel))
        .map_err(|e| SpoolError::Runtime {
            details: format!("failed to spawn processor thread: {e}"),
        })
}

#[allow(clippy::needless_pass_by_value)]
fn run(
    rx: Receiver<Record>,
    flush_rx: Receiver<FlushRequest>,
    mut sink: Option<FileSink>,
    state: &SharedState,
    config: &ArcSwap<Config>,
    channel: &SwapChannel,
) -> Option<FileSink> {
    let startup_cfg = config.load_full();
    let mut policy = DiskPolicy::new(startup_cfg.disk_check_interval());
    let mut flush_rx = flush_rx;

    // Startup duties: one forced disk check when file output is enabled,
    // then the initial heartbeat set without waiting for the first tick.
    if startup_cfg.output.enable_file
        && let Some(s) = sink.as_ref()
    {
        let verdict = disk::run_check(s, state, &startup_cfg.limits, true);
        if let CheckVerdict::Unhealthy { report: true } = verdict {
            emit_disk_full_report(&startup_cfg, channel, state);
        }
        disk::refresh_earliest(s, state);
        state.current_size.store(s.size(), Ordering::Relaxed);
    }
    heartbeat::emit_all(&startup_cfg, channel, state, sink.as_ref());

    let flush_tick = tick(startup_cfg.flush_interval());
    let mut disk_tick = tick(policy.interval());
    let retention_tick = startup_cfg
        .retention_check_interval()
        .map_or_else(never, tick);
    let heartbeat_tick = startup_cfg.heartbeat_interval().map_or_else(never, tick);

    loop {
        select! {
            recv(rx) -> msg => match msg {
                Ok(record) => {
                    let cfg = config.load_full();
                    let reactive = process_record(&cfg, record, &mut sink, state, &mut policy);
                    if reactive && let Some(s) = sink.as_ref() {
                        disk::run_check(s, state, &cfg.limits, false);
                    }
                }
                // All senders gone: the channel was swapped or the logger
                // stopped. Buffered records were drained above.
                Err(_) => break,
            },
            recv(flush_tick) -> _ => {
                if config.load().behavior.enable_periodic_sync
                    && let Some(s) = sink.as_mut()
                    && let Err(e) = s.sync()
                {
                    diag(&config.load(), &format!("periodic sync failed: {e}"));
                }
            },
            recv(disk_tick) -> _ => {
                let cfg = config.load_full();
                if let Some(s) = sink.as_ref() {
                    let verdict = disk::run_check(s, state, &cfg.limits, true);
                    if let CheckVerdict::Unhealthy { report: true } = verdict {
                        emit_disk_full_report(&cfg, channel, state);
                    }
                    if verdict == CheckVerdict::Healthy {
                        if cfg.behavior.enable_adaptive_interval {
                            if let Some(interval) = policy.adapt(
                                Duration::from_millis(cfg.timers.min_check_interval_ms),
                                Duration::from_millis(cfg.timers.max_check_interval_ms),
                            ) {
                                disk_tick = tick(interval);
                            }
                        } else {
                            policy.reset_counters();
                        }
                    }
                }
            },
            recv(flush_rx) -> req => match req {
                Ok(req) => {
                    // Records whose send completed before the flush call are
                    // already buffered; serve them before confirming.
                    while let Ok(record) = rx.try_recv() {
                        let cfg = config.load_full();
                        process_record(&cfg, record, &mut sink, state, &mut policy);
                    }
                    if let Some(s) = sink.as_mut()
                        && let Err(e) = s.sync()
                    {
                        diag(&config.load(), &format!("flush sync failed: {e}"));
                    }
                    // Requester may have timed out already; that is fine.
                    let _ = req.reply.send(());
                }
                // Flush sender dropped during a reconfigure; stop watching.
                Err(_) => flush_rx = never(),
            },
            recv(retention_tick) -> _ => {
                let cfg = config.load_full();
                if let Some(s) = sink.as_ref() {
                    run_retention(&cfg, s, state);
                }
            },
            recv(heartbeat_tick) -> _ => {
                heartbeat::emit_all(&config.load_full(), channel, state, sink.as_ref());
            },
        }
    }

    if let Some(s) = sink.as_mut() {
        let _ = s.sync();
    }
    state.processor_exited.store(true, Ordering::Release);
    sink
}

/// Process one record: discard on unhealthy disk, serialize once, route to
/// console and file, rotate pre-write, account drops and sizes.
///
/// Returns true when enough bytes accumulated for a reactive disk check.
fn process_record(
    cfg: &Config,
    record: Record,
    sink: &mut Option<FileSink>,
    state: &SharedState,
    policy: &mut DiskPolicy,
) -> bool {
    let file_active =
        cfg.output.enable_file && sink.is_some() && !state.disabled.load(Ordering::Relaxed);

    // Consumer-side discard while the disk is unhealthy; console-only
    // configurations are unaffected by disk health.
    if file_active && !state.disk_ok.load(Ordering::Relaxed) {
        state.count_drop();
        return false;
    }

    let bytes = serialize::render(&cfg.format, &record);
    let n = bytes.len() as u64;

    if cfg.output.enable_console {
        write_console(cfg.output.console_target, record.level, &bytes);
    }

    if !file_active {
        return false;
    }
    let Some(s) = sink.as_mut() else {
        return false;
    };

    // Rotation is pre-write: the active file never exceeds the limit by
    // more than one record.
    if let Some(max) = cfg.max_file_bytes()
        && s.size() + n > max
    {
        match s.rotate() {
            Ok(()) => {
                state.rotations_total.fetch_add(1, Ordering::Relaxed);
                state.current_size.store(0, Ordering::Relaxed);
                disk::refresh_earliest(s, state);
            }
            Err(err @ SpoolError::Rotate { .. }) => {
                // Rename failed: fatal for file logging.
                state.disabled.store(true, Ordering::Relaxed);
                state.count_drop();
                diag(cfg, &format!("rotation failed, file logging disabled: {err}"));
                return false;
            }
            Err(err) => {
                // Rename succeeded but the fresh file did not open; treat
                // like a write error and let a forced check recover.
                state.count_drop();
                diag(cfg, &format!("rotation reopen failed: {err}"));
                disk::run_check(s, state, &cfg.limits, true);
                return false;
            }
        }
    }

    match s.append(&bytes) {
        Ok(()) => {
            state.current_size.store(s.size(), Ordering::Relaxed);
            state.processed_total.fetch_add(1, Ordering::Relaxed);
            policy.record_written(n)
        }
        Err(err) => {
            state.count_drop();
            diag(cfg, &format!("write failed: {err}"));
            disk::run_check(s, state, &cfg.limits, true);
            false
        }
    }
}

fn write_console(target: ConsoleTarget, level: Level, bytes: &[u8]) {
    use std::io::Write;
    // Console errors are ignored by design of the pipeline contract.
    let to_stderr = match target {
        ConsoleTarget::Stdout => false,
        ConsoleTarget::Stderr => true,
        ConsoleTarget::Split => level >= Level::Warn,
    };
    if to_stderr {
        let _ = std::io::stderr().lock().write_all(bytes);
    } else {
        let _ = std::io::stdout().lock().write_all(bytes);
    }
}

fn run_retention(cfg: &Config, sink: &FileSink, state: &SharedState) {
    let Some(period) = cfg.retention_period() else {
        return;
    };
    let earliest_ms = state.earliest_file_ms.load(Ordering::Relaxed);
    if earliest_ms == 0 {
        return;
    }
    let cutoff = SystemTime::now() - period;
    let earliest = SystemTime::UNIX_EPOCH + Duration::from_millis(earliest_ms);
    if earliest >= cutoff {
        return;
    }
    let outcome = sink.clean_expired(cutoff);
    state
        .deletions_total
        .fetch_add(outcome.deleted, Ordering::Relaxed);
    disk::refresh_earliest(sink, state);
}

/// One error record per transition into the unhealthy state.
fn emit_disk_full_report(cfg: &Config, channel: &SwapChannel, state: &SharedState) {
    let record = Record::new(
        cfg.format.record_flags(),
        Level::Error,
        vec![Value::from(
            "Log directory full or disk space low, cleanup failed",
        )],
    );
    if channel.try_send(record).is_err() {
        state.count_drop();
    }
    diag(cfg, "log directory full or disk space low, cleanup failed");
}

/// Internal diagnostics, gated and marked so they are distinguishable from
/// normal logs.
pub(crate) fn diag(cfg: &Config, msg: &str) {
    if cfg.behavior.internal_errors_to_stderr {
        eprintln!("[LOGSPOOL] {msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::OutputConfig;
    use crate::pipeline::channel::record_channel;
    use crate::record::RecordFlags;

    fn file_config(dir: &std::path::Path) -> Config {
        let mut cfg = Config::default();
        cfg.output = OutputConfig {
            enable_console: false,
            enable_file: true,
            directory: dir.to_path_buf(),
            name: "app".to_string(),
            extension: "log".to_string(),
            ..OutputConfig::default()
        };
        cfg
    }

    fn info_record(msg: &str) -> Record {
        Record::new(
            RecordFlags::SHOW_LEVEL,
            Level::Info,
            vec![Value::from(msg)],
        )
    }

    #[test]
    fn process_record_appends_and_counts() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = file_config(tmp.path());
        let state = SharedState::new();
        let mut sink = Some(FileSink::open(&cfg.output).unwrap());
        let mut policy = DiskPolicy::new(Duration::from_secs(5));

        process_record(&cfg, info_record("one"), &mut sink, &state, &mut policy);
        process_record(&cfg, info_record("two"), &mut sink, &state, &mut policy);

        assert_eq!(state.processed_total.load(Ordering::Relaxed), 2);
        let contents = std::fs::read_to_string(sink.unwrap().active_path()).unwrap();
        assert_eq!(contents, "INFO one\nINFO two\n");
        assert_eq!(
            state.current_size.load(Ordering::Relaxed),
            contents.len() as u64
        );
    }

    #[test]
    fn unhealthy_disk_discards_with_accounting() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = file_config(tmp.path());
        let state = SharedState::new();
        state.disk_ok.store(false, Ordering::Relaxed);
        let mut sink = Some(FileSink::open(&cfg.output).unwrap());
        let mut policy = DiskPolicy::new(Duration::from_secs(5));

        process_record(&cfg, info_record("lost"), &mut sink, &state, &mut policy);

        assert_eq!(state.dropped_total.load(Ordering::Relaxed), 1);
        assert_eq!(state.processed_total.load(Ordering::Relaxed), 0);
        let contents = std::fs::read_to_string(sink.unwrap().active_path()).unwrap();
        assert!(contents.is_empty());
    }

    #[test]
    fn unhealthy_disk_ignored_for_console_only() {
        let mut cfg = Config::default();
        cfg.output.enable_console = false;
        cfg.output.enable_file = false;
        let state = SharedState::new();
        state.disk_ok.store(false, Ordering::Relaxed);
        let mut policy = DiskPolicy::new(Duration::from_secs(5));

        process_record(&cfg, info_record("ok"), &mut None, &state, &mut policy);
        assert_eq!(state.dropped_total.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn rotation_is_pre_write() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = file_config(tmp.path());
        cfg.limits.max_size_kb = 1; // 1000 bytes
        let state = SharedState::new();
        let mut sink = Some(FileSink::open(&cfg.output).unwrap());
        let mut policy = DiskPolicy::new(Duration::from_secs(5));

        // ~600-byte records: the second one must rotate first.
        let payload = "x".repeat(590);
        process_record(&cfg, info_record(&payload), &mut sink, &state, &mut policy);
        process_record(&cfg, info_record(&payload), &mut sink, &state, &mut policy);

        assert_eq!(state.rotations_total.load(Ordering::Relaxed), 1);
        let s = sink.unwrap();
        assert!(s.size() < 1000);
        let archived: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("app_"))
            .collect();
        assert_eq!(archived.len(), 1);
    }

    #[test]
    fn disabled_logger_skips_file_output() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = file_config(tmp.path());
        let state = SharedState::new();
        state.disabled.store(true, Ordering::Relaxed);
        let mut sink = Some(FileSink::open(&cfg.output).unwrap());
        let mut policy = DiskPolicy::new(Duration::from_secs(5));

        process_record(&cfg, info_record("gone"), &mut sink, &state, &mut policy);
        assert_eq!(state.processed_total.load(Ordering::Relaxed), 0);
        let contents = std::fs::read_to_string(sink.unwrap().active_path()).unwrap();
        assert!(contents.is_empty());
    }

    #[test]
    fn retention_deletes_expired_archives() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = file_config(tmp.path());
        cfg.timers.retention_period_hrs = 1;
        let state = SharedState::new();
        let sink = FileSink::open(&cfg.output).unwrap();

        let old = tmp.path().join("app_250101_000000_1.log");
        std::fs::write(&old, b"old").unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(7200);
        filetime::set_file_mtime(&old, filetime::FileTime::from_system_time(mtime)).unwrap();
        disk::refresh_earliest(&sink, &state);

        run_retention(&cfg, &sink, &state);
        assert!(!old.exists());
        assert_eq!(state.deletions_total.load(Ordering::Relaxed), 1);
        assert_eq!(state.earliest_file_ms.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn retention_skips_when_nothing_old_enough() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = file_config(tmp.path());
        cfg.timers.retention_period_hrs = 1;
        let state = SharedState::new();
        let sink = FileSink::open(&cfg.output).unwrap();

        let fresh = tmp.path().join("app_250101_000000_1.log");
        std::fs::write(&fresh, b"fresh").unwrap();
        disk::refresh_earliest(&sink, &state);

        run_retention(&cfg, &sink, &state);
        assert!(fresh.exists());
        assert_eq!(state.deletions_total.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn processor_drains_then_exits_on_disconnect() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Arc::new(ArcSwap::from_pointee(file_config(tmp.path())));
        let state = Arc::new(SharedState::new());
        let channel = Arc::new(SwapChannel::new());
        let sink = FileSink::open(&cfg.load().output).unwrap();

        let (tx, rx) = record_channel(16);
        let (_ftx, frx) = crossbeam_channel::bounded::<FlushRequest>(1);
        let handle = spawn(
            rx,
            frx,
            Some(sink),
            Arc::clone(&state),
            Arc::clone(&cfg),
            Arc::clone(&channel),
        )
        .unwrap();

        tx.send(info_record("a")).unwrap();
        tx.send(info_record("b")).unwrap();
        drop(tx);

        let sink = handle.join().unwrap().unwrap();
        assert!(state.processor_exited.load(Ordering::Acquire));
        let contents = std::fs::read_to_string(sink.active_path()).unwrap();
        assert_eq!(contents, "INFO a\nINFO b\n");
        assert_eq!(state.processed_total.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn flush_request_is_confirmed() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Arc::new(ArcSwap::from_pointee(file_config(tmp.path())));
        let state = Arc::new(SharedState::new());
        let channel = Arc::new(SwapChannel::new());
        let sink = FileSink::open(&cfg.load().output).unwrap();

        let (tx, rx) = record_channel(16);
        let (ftx, frx) = crossbeam_channel::bounded::<FlushRequest>(1);
        let handle = spawn(
            rx,
            frx,
            Some(sink),
            Arc::clone(&state),
            Arc::clone(&cfg),
            Arc::clone(&channel),
        )
        .unwrap();

        tx.send(info_record("flushed")).unwrap();
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        ftx.send(FlushRequest { reply: reply_tx }).unwrap();
        reply_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("flush confirmation");

        drop(tx);
        let sink = handle.join().unwrap().unwrap();
        let contents = std::fs::read_to_string(sink.active_path()).unwrap();
        assert!(contents.contains("flushed"));
    }
}
