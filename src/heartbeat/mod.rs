//! Self-metrics heartbeats: proc, disk, and sys records injected through
//! the normal send path so they participate in drop accounting like any
//! other record.

use std::sync::atomic::Ordering;

use crate::core::config::Config;
use crate::files::FileSink;
use crate::pipeline::channel::SwapChannel;
use crate::pipeline::state::SharedState;
use crate::platform;
use crate::record::{Level, Record, Value};

/// Sentinel for disk metrics that could not be obtained.
const UNAVAILABLE: i64 = -1;

/// Emit the heartbeat set for the configured level. Called once at
/// processor startup and on every heartbeat tick.
pub(crate) fn emit_all(
    cfg: &Config,
    channel: &SwapChannel,
    state: &SharedState,
    sink: Option<&FileSink>,
) {
    if cfg.heartbeat.level >= 1 {
        emit_proc(cfg, channel, state);
    }
    if cfg.heartbeat.level >= 2 {
        emit_disk(cfg, channel, state, sink);
    }
    if cfg.heartbeat.level >= 3 {
        emit_sys(cfg, channel, state);
    }
}

fn emit_proc(cfg: &Config, channel: &SwapChannel, state: &SharedState) {
    let sequence = state.heartbeat_seq.fetch_add(1, Ordering::Relaxed) + 1;
    // The proc heartbeat is the only reader that resets the interval
    // counter. If this record is dropped, the swapped count is lost; the
    // drop itself still reaches the lifetime counter below.
    let dropped_since_last = state.take_interval_drops();

    let mut args = vec![
        kv("type", "proc"),
        kv("sequence", sequence),
        kv("uptime_hours", format!("{:.2}", state.uptime_hours())),
        kv("processed_logs", state.processed_total.load(Ordering::Relaxed)),
        kv(
            "total_dropped_logs",
            state.dropped_total.load(Ordering::Relaxed),
        ),
    ];
    if dropped_since_last > 0 {
        args.push(kv("dropped_since_last", dropped_since_last));
    }

    send(cfg, channel, state, Level::Proc, args);
}

fn emit_disk(cfg: &Config, channel: &SwapChannel, state: &SharedState, sink: Option<&FileSink>) {
    let sequence = state.heartbeat_seq.fetch_add(1, Ordering::Relaxed) + 1;

    let (total_mb, file_count) = sink
        .and_then(|s| s.extension_stats().ok())
        .map_or((UNAVAILABLE.to_string(), UNAVAILABLE.to_string()), |(total, count)| {
            (format!("{:.2}", to_mb(total)), count.to_string())
        });
    let free_mb = sink
        .and_then(|s| platform::free_space(s.directory()).ok())
        .map_or(UNAVAILABLE.to_string(), |free| format!("{:.2}", to_mb(free)));
    let current_mb = format!("{:.2}", to_mb(state.current_size.load(Ordering::Relaxed)));

    let args = vec![
        kv("type", "disk"),
        kv("sequence", sequence),
        kv("rotated_files", state.rotations_total.load(Ordering::Relaxed)),
        kv("deleted_files", state.deletions_total.load(Ordering::Relaxed)),
        kv("total_log_size_mb", total_mb),
        kv("log_file_count", file_count),
        kv("current_file_size_mb", current_mb),
        kv("disk_status_ok", state.disk_ok.load(Ordering::Relaxed)),
        kv("disk_free_mb", free_mb),
    ];

    send(cfg, channel, state, Level::Disk, args);
}

fn emit_sys(cfg: &Config, channel: &SwapChannel, state: &SharedState) {
    let sequence = state.heartbeat_seq.fetch_add(1, Ordering::Relaxed) + 1;

    let mut args = vec![kv("type", "sys"), kv("sequence", sequence)];
    if let Some(stats) = platform::process_stats() {
        args.push(kv("rss_mb", format!("{:.2}", to_mb(stats.rss_bytes))));
        args.push(kv("vsize_mb", format!("{:.2}", to_mb(stats.vsize_bytes))));
        args.push(kv("threads", stats.threads));
    }

    send(cfg, channel, state, Level::Sys, args);
}

fn send(cfg: &Config, channel: &SwapChannel, state: &SharedState, level: Level, args: Vec<Value>) {
    let record = Record::new(cfg.format.record_flags(), level, args);
    if channel.try_send(record).is_err() {
        state.count_drop();
    }
}

fn kv(key: &str, value: impl ToString) -> Value {
    Value::String(format!("{key}={}", value.to_string()))
}

#[allow(clippy::cast_precision_loss)]
fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::channel::record_channel;

    fn setup(level: u8) -> (Config, SwapChannel, SharedState) {
        let mut cfg = Config::default();
        cfg.heartbeat.level = level;
        (cfg, SwapChannel::new(), SharedState::new())
    }

    fn arg_strings(record: &Record) -> Vec<String> {
        record
            .args
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn level_zero_emits_nothing() {
        let (cfg, channel, state) = setup(0);
        let (tx, rx) = record_channel(8);
        channel.install(tx);
        emit_all(&cfg, &channel, &state, None);
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn level_one_emits_proc_only() {
        let (cfg, channel, state) = setup(1);
        let (tx, rx) = record_channel(8);
        channel.install(tx);
        emit_all(&cfg, &channel, &state, None);

        let records: Vec<Record> = rx.try_iter().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Proc);
        let args = arg_strings(&records[0]);
        assert!(args.contains(&"type=proc".to_string()));
        assert!(args.iter().any(|a| a.starts_with("sequence=")));
        assert!(args.iter().any(|a| a.starts_with("total_dropped_logs=")));
    }

    #[test]
    fn level_three_emits_proc_disk_sys() {
        let (cfg, channel, state) = setup(3);
        let (tx, rx) = record_channel(8);
        channel.install(tx);
        emit_all(&cfg, &channel, &state, None);

        let levels: Vec<Level> = rx.try_iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![Level::Proc, Level::Disk, Level::Sys]);
    }

    #[test]
    fn sequence_increments_per_record() {
        let (cfg, channel, state) = setup(2);
        let (tx, rx) = record_channel(8);
        channel.install(tx);
        emit_all(&cfg, &channel, &state, None);
        emit_all(&cfg, &channel, &state, None);

        let seqs: Vec<String> = rx
            .try_iter()
            .flat_map(|r| arg_strings(&r))
            .filter(|a| a.starts_with("sequence="))
            .collect();
        assert_eq!(
            seqs,
            vec!["sequence=1", "sequence=2", "sequence=3", "sequence=4"]
        );
    }

    #[test]
    fn proc_reports_and_resets_interval_drops() {
        let (cfg, channel, state) = setup(1);
        let (tx, rx) = record_channel(8);
        channel.install(tx);
        for _ in 0..3 {
            state.count_drop();
        }

        emit_all(&cfg, &channel, &state, None);
        let record = rx.try_iter().next().unwrap();
        let args = arg_strings(&record);
        assert!(args.contains(&"dropped_since_last=3".to_string()));
        assert!(args.contains(&"total_dropped_logs=3".to_string()));
        assert_eq!(state.dropped_interval.load(Ordering::Relaxed), 0);
        assert_eq!(state.dropped_total.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn dropped_since_last_omitted_when_zero() {
        let (cfg, channel, state) = setup(1);
        let (tx, rx) = record_channel(8);
        channel.install(tx);
        emit_all(&cfg, &channel, &state, None);
        let args = arg_strings(&rx.try_iter().next().unwrap());
        assert!(!args.iter().any(|a| a.starts_with("dropped_since_last=")));
    }

    #[test]
    fn dropped_heartbeat_counts_as_lifetime_drop() {
        let (cfg, channel, state) = setup(1);
        // Capacity-zero stand-in: no channel installed at all.
        emit_all(&cfg, &channel, &state, None);
        assert_eq!(state.dropped_total.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn disk_heartbeat_uses_sentinels_without_sink() {
        let (cfg, channel, state) = setup(2);
        let (tx, rx) = record_channel(8);
        channel.install(tx);
        emit_all(&cfg, &channel, &state, None);

        let disk = rx.try_iter().find(|r| r.level == Level::Disk).unwrap();
        let args = arg_strings(&disk);
        assert!(args.contains(&"total_log_size_mb=-1".to_string()));
        assert!(args.contains(&"log_file_count=-1".to_string()));
        assert!(args.contains(&"disk_free_mb=-1".to_string()));
        assert!(args.contains(&"disk_status_ok=true".to_string()));
    }
}
