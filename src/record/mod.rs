//! The immutable value passed from producers to the processor.
//!
//! A [`Record`] is built entirely on the producer side (timestamp, level,
//! optional caller trace, argument values) and handed off by value; the
//! processor is its sole consumer. Interpretation of [`Value`] items belongs
//! to the serializer.

#![allow(missing_docs)]

pub mod trace;

use bitflags::bitflags;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// ──────────────────── level ────────────────────

/// Record severity. Discriminants are spaced so future levels can slot in;
/// `Proc` and above are reserved for heartbeat records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(i8)]
pub enum Level {
    Debug = -4,
    Info = 0,
    Warn = 4,
    Error = 8,
    Proc = 12,
    Disk = 16,
    Sys = 20,
}

impl Level {
    /// Numeric severity used for ordering and filtering.
    #[must_use]
    pub const fn severity(self) -> i8 {
        self as i8
    }

    /// Upper-case label rendered by the txt serializer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Proc => "PROC",
            Self::Disk => "DISK",
            Self::Sys => "SYS",
        }
    }

    /// Whether this level is reserved for heartbeat records.
    #[must_use]
    pub const fn is_heartbeat(self) -> bool {
        self.severity() >= Self::Proc.severity()
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "proc" => Ok(Self::Proc),
            "disk" => Ok(Self::Disk),
            "sys" => Ok(Self::Sys),
            other => Err(format!(
                "unknown level {other:?} (expected debug|info|warn|error|proc|disk|sys)"
            )),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────── flags ────────────────────

bitflags! {
    /// Per-record rendering flags, derived from config at the call site.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RecordFlags: u8 {
        /// Render the capture timestamp.
        const SHOW_TIMESTAMP = 1 << 0;
        /// Render the level label.
        const SHOW_LEVEL = 1 << 1;
        /// Raw rendering: no metadata, no trailing newline.
        const RAW = 1 << 2;
        /// Force JSON rendering regardless of the configured format.
        const STRUCTURED_JSON = 1 << 3;
    }
}

// ──────────────────── values ────────────────────

/// A dynamically typed argument value.
///
/// Producers hand over anything convertible; the serializer decides how each
/// variant renders per format.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bytes(Vec<u8>),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
    Null,
    Time(DateTime<Local>),
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Signed(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Signed(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Unsigned(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Unsigned(u64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::Unsigned(v as u64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<DateTime<Local>> for Value {
    fn from(v: DateTime<Local>) -> Self {
        Self::Time(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ──────────────────── record ────────────────────

/// One log record. Immutable once enqueued; ownership moves to the
/// processor on send.
#[derive(Debug, Clone)]
pub struct Record {
    pub flags: RecordFlags,
    pub timestamp: DateTime<Local>,
    pub level: Level,
    /// Caller chain captured at the call site, empty when disabled.
    pub trace: Option<String>,
    pub args: Vec<Value>,
}

impl Record {
    /// Build a record stamped with the current wall-clock time.
    #[must_use]
    pub fn new(flags: RecordFlags, level: Level, args: Vec<Value>) -> Self {
        Self {
            flags,
            timestamp: Local::now(),
            level,
            trace: None,
            args,
        }
    }

    /// Attach a caller trace.
    #[must_use]
    pub fn with_trace(mut self, trace: Option<String>) -> Self {
        self.trace = trace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering_matches_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Proc);
        assert!(Level::Proc < Level::Disk);
        assert!(Level::Disk < Level::Sys);

        assert_eq!(Level::Debug.severity(), -4);
        assert_eq!(Level::Info.severity(), 0);
        assert_eq!(Level::Warn.severity(), 4);
        assert_eq!(Level::Error.severity(), 8);
        assert_eq!(Level::Proc.severity(), 12);
        assert_eq!(Level::Disk.severity(), 16);
        assert_eq!(Level::Sys.severity(), 20);
    }

    #[test]
    fn heartbeat_levels_reserved() {
        assert!(!Level::Error.is_heartbeat());
        assert!(Level::Proc.is_heartbeat());
        assert!(Level::Sys.is_heartbeat());
    }

    #[test]
    fn level_parses_case_insensitive() {
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("debug".parse::<Level>().unwrap(), Level::Debug);
        assert!("trace".parse::<Level>().is_err());
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::from("x"), Value::String("x".to_string()));
        assert_eq!(Value::from(3_i32), Value::Signed(3));
        assert_eq!(Value::from(3_u64), Value::Unsigned(3));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(Option::<i64>::None), Value::Null);
        assert_eq!(Value::from(Some(7_i64)), Value::Signed(7));
    }

    #[test]
    fn record_carries_flags_and_args() {
        let rec = Record::new(
            RecordFlags::SHOW_LEVEL,
            Level::Info,
            vec![Value::from("hello")],
        );
        assert!(rec.flags.contains(RecordFlags::SHOW_LEVEL));
        assert!(!rec.flags.contains(RecordFlags::SHOW_TIMESTAMP));
        assert_eq!(rec.args.len(), 1);
        assert!(rec.trace.is_none());
    }
}
