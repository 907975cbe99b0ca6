//! Configuration system: TOML file + env var overrides + validation.
//!
//! The logger reads its configuration through a lock-free snapshot
//! (`arc_swap`); this module only defines the model, loading, and the
//! validation contract. `apply_config` is the sole mutation entry point.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SpoolError};
use crate::record::{Level, RecordFlags};

// ──────────────────── enums ────────────────────

/// Wire format produced by the serializer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Txt,
    Json,
    Raw,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            "raw" => Ok(Self::Raw),
            other => Err(format!("unknown format {other:?} (expected txt|json|raw)")),
        }
    }
}

/// Where console output is routed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
    /// Warn and above to stderr, the rest to stdout.
    Split,
}

impl std::str::FromStr for ConsoleTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            "split" => Ok(Self::Split),
            other => Err(format!(
                "unknown console target {other:?} (expected stdout|stderr|split)"
            )),
        }
    }
}

// ──────────────────── config sections ────────────────────

/// Full logspool configuration model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub format: FormatConfig,
    pub limits: LimitsConfig,
    pub timers: TimersConfig,
    pub heartbeat: HeartbeatConfig,
    pub behavior: BehaviorConfig,
}

/// Output sinks and file naming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub enable_console: bool,
    pub console_target: ConsoleTarget,
    pub enable_file: bool,
    pub directory: PathBuf,
    pub name: String,
    /// Extension without the leading dot; empty means no extension.
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enable_console: true,
            console_target: ConsoleTarget::Stdout,
            enable_file: false,
            directory: PathBuf::from("./log"),
            name: "log".to_string(),
            extension: "log".to_string(),
        }
    }
}

/// Knobs forwarded to the serializer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormatConfig {
    pub format: LogFormat,
    pub show_timestamp: bool,
    pub show_level: bool,
    /// chrono format string for rendered timestamps.
    pub timestamp_format: String,
    /// Replace control characters in string values.
    pub sanitization: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Txt,
            show_timestamp: true,
            show_level: true,
            timestamp_format: "%Y-%m-%dT%H:%M:%S%.3f".to_string(),
            sanitization: true,
        }
    }
}

impl FormatConfig {
    /// Base flags stamped onto records built against this configuration.
    #[must_use]
    pub fn record_flags(&self) -> RecordFlags {
        let mut flags = RecordFlags::empty();
        if self.show_timestamp {
            flags |= RecordFlags::SHOW_TIMESTAMP;
        }
        if self.show_level {
            flags |= RecordFlags::SHOW_LEVEL;
        }
        flags
    }
}

/// Buffering and size policy. Size thresholds are KB×1000; 0 disables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Capacity of the producer→processor hand-off channel.
    pub buffer_size: usize,
    /// Rotate the active file when it would exceed this size.
    pub max_size_kb: u64,
    /// Prune archived files when their total exceeds this size.
    pub max_total_size_kb: u64,
    /// Prune archived files when disk free space falls below this.
    pub min_disk_free_kb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            max_size_kb: 0,
            max_total_size_kb: 0,
            min_disk_free_kb: 0,
        }
    }
}

/// Processor timer periods.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimersConfig {
    pub flush_interval_ms: u64,
    pub disk_check_interval_ms: u64,
    /// Adaptive-interval clamp floor.
    pub min_check_interval_ms: u64,
    /// Adaptive-interval clamp ceiling.
    pub max_check_interval_ms: u64,
    /// Archived files older than this expire; 0 disables retention.
    pub retention_period_hrs: u64,
    pub retention_check_mins: u64,
}

impl Default for TimersConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 100,
            disk_check_interval_ms: 5_000,
            min_check_interval_ms: 500,
            max_check_interval_ms: 60_000,
            retention_period_hrs: 0,
            retention_check_mins: 10,
        }
    }
}

/// Self-metrics emission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// 0 = disabled, 1 = proc, 2 = proc+disk, 3 = proc+disk+sys.
    pub level: u8,
    pub interval_s: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            level: 0,
            interval_s: 60,
        }
    }
}

/// Behavioral switches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Minimum severity accepted by leveled producer calls.
    pub level: Level,
    pub enable_adaptive_interval: bool,
    pub enable_periodic_sync: bool,
    /// Route internal diagnostics to stderr with the `[LOGSPOOL]` marker.
    pub internal_errors_to_stderr: bool,
    /// Caller frames captured by `*_trace` calls; 0 disables, max 10.
    pub trace_depth: u8,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            enable_adaptive_interval: true,
            enable_periodic_sync: true,
            internal_errors_to_stderr: false,
            trace_depth: 0,
        }
    }
}

// ──────────────────── derived accessors ────────────────────

impl Config {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.timers.flush_interval_ms)
    }

    pub fn disk_check_interval(&self) -> Duration {
        Duration::from_millis(self.timers.disk_check_interval_ms)
    }

    pub fn retention_check_interval(&self) -> Option<Duration> {
        if self.timers.retention_period_hrs == 0 || self.timers.retention_check_mins == 0 {
            return None;
        }
        Some(Duration::from_secs(self.timers.retention_check_mins * 60))
    }

    pub fn retention_period(&self) -> Option<Duration> {
        if self.timers.retention_period_hrs == 0 {
            return None;
        }
        Some(Duration::from_secs(self.timers.retention_period_hrs * 3600))
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        if self.heartbeat.level == 0 {
            return None;
        }
        Some(Duration::from_secs(self.heartbeat.interval_s))
    }

    /// Byte threshold for size-based rotation; `None` when disabled.
    pub fn max_file_bytes(&self) -> Option<u64> {
        (self.limits.max_size_kb > 0).then(|| self.limits.max_size_kb * 1000)
    }

    /// Active file path: `directory/name[.extension]`.
    #[must_use]
    pub fn active_file_path(&self) -> PathBuf {
        let mut file = self.output.name.clone();
        if !self.output.extension.is_empty() {
            file.push('.');
            file.push_str(&self.output.extension);
        }
        self.output.directory.join(file)
    }

    /// Whether switching to `next` requires a channel swap and processor
    /// restart rather than a snapshot update.
    #[must_use]
    pub fn requires_restart(&self, next: &Self) -> bool {
        self.limits.buffer_size != next.limits.buffer_size
            || self.file_identity_changed(next)
            || self.timers.flush_interval_ms != next.timers.flush_interval_ms
            || self.timers.disk_check_interval_ms != next.timers.disk_check_interval_ms
            || self.behavior.enable_adaptive_interval != next.behavior.enable_adaptive_interval
            || self.timers.retention_period_hrs != next.timers.retention_period_hrs
            || self.timers.retention_check_mins != next.timers.retention_check_mins
            || self.heartbeat.interval_s != next.heartbeat.interval_s
            || self.heartbeat.level != next.heartbeat.level
    }

    /// Whether switching to `next` changes which file the processor writes.
    #[must_use]
    pub fn file_identity_changed(&self, next: &Self) -> bool {
        self.output.enable_file != next.output.enable_file
            || self.output.directory != next.output.directory
            || self.output.name != next.output.name
            || self.output.extension != next.output.extension
    }
}

// ──────────────────── loading ────────────────────

impl Config {
    /// Default configuration path, relative to the working directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from("./logspool.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Resolution order:
    /// 1. Explicit `path` argument
    /// 2. `LOGSPOOL_CONFIG` environment variable
    /// 3. Default path (`./logspool.toml`)
    ///
    /// A missing file is only an error for an explicitly requested path;
    /// otherwise defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_config = if path.is_none() {
            env::var_os("LOGSPOOL_CONFIG").map(PathBuf::from)
        } else {
            None
        };

        let effective_path = path.map_or_else(
            || env_config.clone().unwrap_or_else(Self::default_path),
            Path::to_path_buf,
        );
        let is_explicit_path = path.is_some() || env_config.is_some();

        let mut cfg = if effective_path.exists() {
            let raw = fs::read_to_string(&effective_path)
                .map_err(|source| SpoolError::io(&effective_path, source))?;
            toml::from_str::<Self>(&raw)?
        } else if is_explicit_path {
            return Err(SpoolError::InvalidConfig {
                details: format!("config file not found: {}", effective_path.display()),
            });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[allow(clippy::too_many_lines)]
    fn apply_env_overrides(&mut self) -> Result<()> {
        // output
        set_env_bool("LOGSPOOL_ENABLE_CONSOLE", &mut self.output.enable_console)?;
        if let Some(raw) = env_var("LOGSPOOL_CONSOLE_TARGET") {
            self.output.console_target =
                raw.parse::<ConsoleTarget>()
                    .map_err(|details| SpoolError::ConfigParse {
                        context: "env",
                        details: format!("LOGSPOOL_CONSOLE_TARGET={raw:?}: {details}"),
                    })?;
        }
        set_env_bool("LOGSPOOL_ENABLE_FILE", &mut self.output.enable_file)?;
        if let Some(raw) = env_var("LOGSPOOL_DIRECTORY") {
            self.output.directory = PathBuf::from(raw);
        }
        if let Some(raw) = env_var("LOGSPOOL_NAME") {
            self.output.name = raw;
        }
        if let Some(raw) = env_var("LOGSPOOL_EXTENSION") {
            self.output.extension = raw;
        }

        // format
        if let Some(raw) = env_var("LOGSPOOL_FORMAT") {
            self.format.format =
                raw.parse::<LogFormat>()
                    .map_err(|details| SpoolError::ConfigParse {
                        context: "env",
                        details: format!("LOGSPOOL_FORMAT={raw:?}: {details}"),
                    })?;
        }
        set_env_bool("LOGSPOOL_SHOW_TIMESTAMP", &mut self.format.show_timestamp)?;
        set_env_bool("LOGSPOOL_SHOW_LEVEL", &mut self.format.show_level)?;
        if let Some(raw) = env_var("LOGSPOOL_TIMESTAMP_FORMAT") {
            self.format.timestamp_format = raw;
        }
        set_env_bool("LOGSPOOL_SANITIZATION", &mut self.format.sanitization)?;

        // limits
        set_env_usize("LOGSPOOL_BUFFER_SIZE", &mut self.limits.buffer_size)?;
        set_env_u64("LOGSPOOL_MAX_SIZE_KB", &mut self.limits.max_size_kb)?;
        set_env_u64(
            "LOGSPOOL_MAX_TOTAL_SIZE_KB",
            &mut self.limits.max_total_size_kb,
        )?;
        set_env_u64(
            "LOGSPOOL_MIN_DISK_FREE_KB",
            &mut self.limits.min_disk_free_kb,
        )?;

        // timers
        set_env_u64(
            "LOGSPOOL_FLUSH_INTERVAL_MS",
            &mut self.timers.flush_interval_ms,
        )?;
        set_env_u64(
            "LOGSPOOL_DISK_CHECK_INTERVAL_MS",
            &mut self.timers.disk_check_interval_ms,
        )?;
        set_env_u64(
            "LOGSPOOL_MIN_CHECK_INTERVAL_MS",
            &mut self.timers.min_check_interval_ms,
        )?;
        set_env_u64(
            "LOGSPOOL_MAX_CHECK_INTERVAL_MS",
            &mut self.timers.max_check_interval_ms,
        )?;
        set_env_u64(
            "LOGSPOOL_RETENTION_PERIOD_HRS",
            &mut self.timers.retention_period_hrs,
        )?;
        set_env_u64(
            "LOGSPOOL_RETENTION_CHECK_MINS",
            &mut self.timers.retention_check_mins,
        )?;

        // heartbeat
        set_env_u8("LOGSPOOL_HEARTBEAT_LEVEL", &mut self.heartbeat.level)?;
        set_env_u64("LOGSPOOL_HEARTBEAT_INTERVAL_S", &mut self.heartbeat.interval_s)?;

        // behavior
        if let Some(raw) = env_var("LOGSPOOL_LEVEL") {
            self.behavior.level =
                raw.parse::<Level>()
                    .map_err(|details| SpoolError::ConfigParse {
                        context: "env",
                        details: format!("LOGSPOOL_LEVEL={raw:?}: {details}"),
                    })?;
        }
        set_env_bool(
            "LOGSPOOL_ENABLE_ADAPTIVE_INTERVAL",
            &mut self.behavior.enable_adaptive_interval,
        )?;
        set_env_bool(
            "LOGSPOOL_ENABLE_PERIODIC_SYNC",
            &mut self.behavior.enable_periodic_sync,
        )?;
        set_env_bool(
            "LOGSPOOL_INTERNAL_ERRORS_TO_STDERR",
            &mut self.behavior.internal_errors_to_stderr,
        )?;
        set_env_u8("LOGSPOOL_TRACE_DEPTH", &mut self.behavior.trace_depth)?;

        Ok(())
    }

    /// Reject invalid or inconsistent fields. Called from `load` and from
    /// `apply_config` before any logger state is touched.
    pub fn validate(&self) -> Result<()> {
        if self.output.name.is_empty() {
            return Err(SpoolError::InvalidConfig {
                details: "output.name must not be empty".to_string(),
            });
        }
        if self.output.extension.starts_with('.') {
            return Err(SpoolError::InvalidConfig {
                details: format!(
                    "output.extension must not start with '.', got {:?}",
                    self.output.extension
                ),
            });
        }
        if self.format.timestamp_format.is_empty() {
            return Err(SpoolError::InvalidConfig {
                details: "format.timestamp_format must not be empty".to_string(),
            });
        }
        // Rendering an invalid strftime string fails at write time; reject
        // it here instead.
        if chrono::format::StrftimeItems::new(&self.format.timestamp_format)
            .any(|item| matches!(item, chrono::format::Item::Error))
        {
            return Err(SpoolError::InvalidConfig {
                details: format!(
                    "format.timestamp_format is not a valid strftime string: {:?}",
                    self.format.timestamp_format
                ),
            });
        }
        if self.limits.buffer_size == 0 {
            return Err(SpoolError::InvalidConfig {
                details: "limits.buffer_size must be >= 1".to_string(),
            });
        }

        for (name, val) in [
            ("flush_interval_ms", self.timers.flush_interval_ms),
            ("disk_check_interval_ms", self.timers.disk_check_interval_ms),
            ("min_check_interval_ms", self.timers.min_check_interval_ms),
            ("max_check_interval_ms", self.timers.max_check_interval_ms),
        ] {
            if val == 0 {
                return Err(SpoolError::InvalidConfig {
                    details: format!("timers.{name} must be >= 1"),
                });
            }
        }
        if self.timers.min_check_interval_ms > self.timers.max_check_interval_ms {
            return Err(SpoolError::InvalidConfig {
                details: format!(
                    "timers.min_check_interval_ms ({}) must be <= timers.max_check_interval_ms ({})",
                    self.timers.min_check_interval_ms, self.timers.max_check_interval_ms
                ),
            });
        }

        if self.heartbeat.level > 3 {
            return Err(SpoolError::InvalidConfig {
                details: format!("heartbeat.level must be in [0, 3], got {}", self.heartbeat.level),
            });
        }
        if self.heartbeat.level > 0 && self.heartbeat.interval_s == 0 {
            return Err(SpoolError::InvalidConfig {
                details: "heartbeat.interval_s must be >= 1 when heartbeats are enabled"
                    .to_string(),
            });
        }

        if self.behavior.trace_depth > 10 {
            return Err(SpoolError::InvalidConfig {
                details: format!(
                    "behavior.trace_depth must be in [0, 10], got {}",
                    self.behavior.trace_depth
                ),
            });
        }

        Ok(())
    }
}

// ──────────────────── env helpers ────────────────────

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_env_u64(name: &str, slot: &mut u64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<u64>().map_err(|error| SpoolError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_u8(name: &str, slot: &mut u8) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<u8>().map_err(|error| SpoolError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_usize(name: &str, slot: &mut usize) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw
            .parse::<usize>()
            .map_err(|error| SpoolError::ConfigParse {
                context: "env",
                details: format!("{name}={raw:?}: {error}"),
            })?;
    }
    Ok(())
}

fn set_env_bool(name: &str, slot: &mut bool) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<bool>().map_err(|error| SpoolError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

// ──────────────────── tests ────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn empty_name_rejected() {
        let mut cfg = Config::default();
        cfg.output.name = String::new();
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.code(), "LSP-1001");
        assert!(err.to_string().contains("output.name"));
    }

    #[test]
    fn dotted_extension_rejected() {
        let mut cfg = Config::default();
        cfg.output.extension = ".log".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn invalid_strftime_rejected() {
        let mut cfg = Config::default();
        cfg.format.timestamp_format = "%Q".to_string();
        assert!(cfg.validate().is_err());
        cfg.format.timestamp_format = "%H:%M:%S".to_string();
        cfg.validate().unwrap();
    }

    #[test]
    fn zero_buffer_rejected() {
        let mut cfg = Config::default();
        cfg.limits.buffer_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn check_interval_ordering_enforced() {
        let mut cfg = Config::default();
        cfg.timers.min_check_interval_ms = 10_000;
        cfg.timers.max_check_interval_ms = 1_000;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("min_check_interval_ms"));
    }

    #[test]
    fn heartbeat_level_capped() {
        let mut cfg = Config::default();
        cfg.heartbeat.level = 4;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn heartbeat_interval_required_when_enabled() {
        let mut cfg = Config::default();
        cfg.heartbeat.level = 1;
        cfg.heartbeat.interval_s = 0;
        assert!(cfg.validate().is_err());
        cfg.heartbeat.interval_s = 1;
        cfg.validate().unwrap();
    }

    #[test]
    fn trace_depth_capped() {
        let mut cfg = Config::default();
        cfg.behavior.trace_depth = 11;
        assert!(cfg.validate().is_err());
        cfg.behavior.trace_depth = 10;
        cfg.validate().unwrap();
    }

    #[test]
    fn active_file_path_with_and_without_extension() {
        let mut cfg = Config::default();
        cfg.output.directory = PathBuf::from("/var/log/app");
        cfg.output.name = "app".to_string();
        cfg.output.extension = "log".to_string();
        assert_eq!(cfg.active_file_path(), PathBuf::from("/var/log/app/app.log"));

        cfg.output.extension = String::new();
        assert_eq!(cfg.active_file_path(), PathBuf::from("/var/log/app/app"));
    }

    #[test]
    fn restart_field_detection() {
        let base = Config::default();

        let mut next = base.clone();
        next.limits.buffer_size += 1;
        assert!(base.requires_restart(&next));

        let mut next = base.clone();
        next.output.directory = PathBuf::from("/elsewhere");
        assert!(base.requires_restart(&next));
        assert!(base.file_identity_changed(&next));

        let mut next = base.clone();
        next.behavior.level = Level::Warn;
        assert!(!base.requires_restart(&next));

        let mut next = base.clone();
        next.format.format = LogFormat::Json;
        assert!(!base.requires_restart(&next));
    }

    #[test]
    fn toml_roundtrip_preserves_fields() {
        let mut cfg = Config::default();
        cfg.limits.max_size_kb = 512;
        cfg.heartbeat.level = 2;
        cfg.behavior.level = Level::Warn;
        let raw = toml::to_string(&cfg).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [limits]
            buffer_size = 16

            [behavior]
            level = "warn"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.limits.buffer_size, 16);
        assert_eq!(parsed.behavior.level, Level::Warn);
        assert_eq!(parsed.timers.flush_interval_ms, 100);
    }

    #[test]
    fn format_parse_accepts_known_values() {
        assert_eq!("txt".parse::<LogFormat>().unwrap(), LogFormat::Txt);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!("split".parse::<ConsoleTarget>().unwrap(), ConsoleTarget::Split);
        assert!("tty".parse::<ConsoleTarget>().is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn check_interval_validation_matches_ordering(
                min in 1_u64..100_000,
                max in 1_u64..100_000,
            ) {
                let mut cfg = Config::default();
                cfg.timers.min_check_interval_ms = min;
                cfg.timers.max_check_interval_ms = max;
                prop_assert_eq!(cfg.validate().is_ok(), min <= max);
            }

            #[test]
            fn heartbeat_validation_covers_full_range(level in 0_u8..=10, interval in 0_u64..100) {
                let mut cfg = Config::default();
                cfg.heartbeat.level = level;
                cfg.heartbeat.interval_s = interval;
                let expected = level <= 3 && (level == 0 || interval > 0);
                prop_assert_eq!(cfg.validate().is_ok(), expected);
            }
        }
    }
}
