//! LSP-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the crate.
pub type Result<T> = std::result::Result<T, SpoolError>;

/// Top-level error type for logspool.
///
/// Producers never surface these; lifecycle calls (`apply_config`, `start`,
/// `stop`, `flush`, `shutdown`) do.
#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("[LSP-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[LSP-1002] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[LSP-1101] logger not initialized")]
    NotInitialized,

    #[error("[LSP-1102] logger not started")]
    NotStarted,

    #[error("[LSP-2001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[LSP-2002] disk stats failure for {path}: {details}")]
    DiskStats { path: PathBuf, details: String },

    #[error("[LSP-2003] cleanup failed: needed {needed} bytes, freed {freed}")]
    CleanupFailed { needed: u64, freed: u64 },

    #[error("[LSP-2004] rotation failure for {path}: {details}")]
    Rotate { path: PathBuf, details: String },

    #[error("[LSP-3001] timeout waiting for flush confirmation")]
    FlushTimeout,

    #[error("[LSP-3002] processor busy, flush request not accepted")]
    ProcessorBusy,

    #[error("[LSP-3003] timeout waiting for processor shutdown")]
    ShutdownTimeout,

    #[error("[LSP-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl SpoolError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "LSP-1001",
            Self::ConfigParse { .. } => "LSP-1002",
            Self::NotInitialized => "LSP-1101",
            Self::NotStarted => "LSP-1102",
            Self::Io { .. } => "LSP-2001",
            Self::DiskStats { .. } => "LSP-2002",
            Self::CleanupFailed { .. } => "LSP-2003",
            Self::Rotate { .. } => "LSP-2004",
            Self::FlushTimeout => "LSP-3001",
            Self::ProcessorBusy => "LSP-3002",
            Self::ShutdownTimeout => "LSP-3003",
            Self::Runtime { .. } => "LSP-3900",
        }
    }

    /// Whether retrying the failed call might succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::DiskStats { .. }
                | Self::FlushTimeout
                | Self::ProcessorBusy
                | Self::ShutdownTimeout
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<toml::de::Error> for SpoolError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
