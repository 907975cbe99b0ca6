#![forbid(unsafe_code)]

//! logspool: in-process asynchronous structured logger.
//!
//! Producers never block on I/O or a lock: each call builds an immutable
//! [`Record`] and hands it to a bounded channel with a non-blocking send.
//! A single consumer thread owns all file I/O and multiplexes the channel
//! against flush, disk-check, retention, and heartbeat timers. Saturation
//! drops records instead of blocking; every drop is counted and reported
//! through periodic heartbeat records.
//!
//! ```no_run
//! use std::time::Duration;
//! use logspool::{Config, Logger};
//!
//! # fn main() -> logspool::Result<()> {
//! let mut cfg = Config::default();
//! cfg.output.enable_file = true;
//! cfg.output.directory = "/var/log/myapp".into();
//!
//! let logger = Logger::with_config(cfg)?;
//! logger.start()?;
//! logger.info(["service listening", "port=8080"]);
//! logger.flush(Duration::from_secs(1))?;
//! logger.shutdown(Duration::from_secs(2))?;
//! # Ok(())
//! # }
//! ```

pub mod core;
mod disk;
mod files;
mod heartbeat;
pub mod logger;
mod pipeline;
mod platform;
pub mod record;
pub mod serialize;

pub use crate::core::config::{
    BehaviorConfig, Config, ConsoleTarget, FormatConfig, HeartbeatConfig, LimitsConfig, LogFormat,
    OutputConfig, TimersConfig,
};
pub use crate::core::errors::{Result, SpoolError};
pub use crate::logger::{Logger, default_logger};
pub use crate::pipeline::LoggerStats;
pub use crate::record::{Level, Record, RecordFlags, Value};
