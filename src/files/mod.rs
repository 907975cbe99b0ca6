//! File lifecycle: the active log file, rotation by rename-with-timestamp,
//! pruning by ascending age, and retention expiry.
//!
//! The active file lives at `directory/name[.extension]`. Rotation renames
//! it to `name_YYMMDD_HHMMSS_<nanos>[.extension]` and opens a fresh active
//! file. Scans only ever consider files carrying the configured extension;
//! archived candidates additionally carry the `name_` prefix, so the active
//! file is never a deletion candidate.

use std::fs::{self, File, Metadata, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Local;

use crate::core::config::OutputConfig;
use crate::core::errors::{Result, SpoolError};

/// Outcome of a prune or retention pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CleanOutcome {
    pub deleted: u64,
    pub freed_bytes: u64,
}

/// Append-only sink for the active log file. Owned by the processor while
/// it runs; travels back to the lifecycle through the processor's join
/// handle.
#[derive(Debug)]
pub(crate) struct FileSink {
    directory: PathBuf,
    name: String,
    extension: String,
    file: Option<File>,
    size: u64,
}

impl FileSink {
    /// Open the active file, creating the directory as needed.
    pub fn open(output: &OutputConfig) -> Result<Self> {
        let mut sink = Self {
            directory: output.directory.clone(),
            name: output.name.clone(),
            extension: output.extension.clone(),
            file: None,
            size: 0,
        };
        sink.open_active()?;
        Ok(sink)
    }

    /// Path of the active file.
    #[must_use]
    pub fn active_path(&self) -> PathBuf {
        self.directory.join(self.active_file_name())
    }

    /// Bytes written to the active file since creation or last rotation.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Append one serialized record. The caller handles errors by dropping
    /// the record and forcing a disk check. A sink whose file was lost to a
    /// failed reopen heals itself on the next append that can open it.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        if self.file.is_none() {
            self.open_active()?;
        }
        let path = self.active_path();
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| SpoolError::io(&path, std::io::Error::other("no active file")))?;
        file.write_all(bytes)
            .map_err(|source| SpoolError::io(&path, source))?;
        self.size += bytes.len() as u64;
        Ok(())
    }

    /// Flush kernel buffers for the active file. Errors are reported but
    /// the sink stays usable.
    pub fn sync(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.sync_data()
                .map_err(|source| SpoolError::io(self.directory.join(&self.name), source))?;
        }
        Ok(())
    }

    /// Close the active file, tolerating sync errors.
    pub fn close(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.sync_data();
        }
    }

    /// Rotate: close, rename with a timestamp suffix, reopen fresh.
    ///
    /// A rename failure is fatal for file logging; the caller disables the
    /// logger. A failure to reopen after a successful rename is an IO error
    /// the caller may retry via a later disk check.
    pub fn rotate(&mut self) -> Result<()> {
        // Tolerate close errors; rename is the decisive step.
        self.close();

        let from = self.active_path();
        let to = self.directory.join(self.archived_file_name());
        fs::rename(&from, &to).map_err(|source| SpoolError::Rotate {
            path: from,
            details: source.to_string(),
        })?;

        self.open_active()
    }

    /// Delete archived files oldest-first until `space_to_free` bytes are
    /// reclaimed. Errors when the requirement cannot be met.
    pub fn prune(&self, space_to_free: u64) -> Result<CleanOutcome> {
        let mut outcome = CleanOutcome::default();
        if space_to_free == 0 {
            return Ok(outcome);
        }

        let mut archived = self.archived_files()?;
        archived.sort_by_key(|(_, meta)| meta.modified().unwrap_or(SystemTime::UNIX_EPOCH));

        for (path, meta) in archived {
            if outcome.freed_bytes >= space_to_free {
                break;
            }
            if fs::remove_file(&path).is_ok() {
                outcome.deleted += 1;
                outcome.freed_bytes += meta.len();
            }
        }

        if outcome.freed_bytes < space_to_free {
            return Err(SpoolError::CleanupFailed {
                needed: space_to_free,
                freed: outcome.freed_bytes,
            });
        }
        Ok(outcome)
    }

    /// Delete archived files whose mtime is before `cutoff`. The active
    /// file is never a candidate.
    pub fn clean_expired(&self, cutoff: SystemTime) -> CleanOutcome {
        let mut outcome = CleanOutcome::default();
        let Ok(archived) = self.archived_files() else {
            return outcome;
        };
        for (path, meta) in archived {
            let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if mtime < cutoff && fs::remove_file(&path).is_ok() {
                outcome.deleted += 1;
                outcome.freed_bytes += meta.len();
            }
        }
        outcome
    }

    /// Earliest archived-file mtime, `None` when no archive exists.
    pub fn earliest_archived(&self) -> Option<SystemTime> {
        self.archived_files()
            .ok()?
            .into_iter()
            .filter_map(|(_, meta)| meta.modified().ok())
            .min()
    }

    /// Total size and count of files in the directory carrying the
    /// configured extension (active file included).
    pub fn extension_stats(&self) -> Result<(u64, u64)> {
        let mut total = 0_u64;
        let mut count = 0_u64;
        for entry in self.read_dir()? {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if !path.is_file() || !self.extension_matches(&path) {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                total += meta.len();
                count += 1;
            }
        }
        Ok((total, count))
    }

    /// Directory the sink writes into.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    // ──────────────────── internals ────────────────────

    fn open_active(&mut self) -> Result<()> {
        create_dir_0755(&self.directory)?;
        let path = self.active_path();
        let file = open_append_0644(&path).map_err(|source| SpoolError::io(&path, source))?;
        self.size = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.file = Some(file);
        Ok(())
    }

    fn active_file_name(&self) -> String {
        let mut name = self.name.clone();
        if !self.extension.is_empty() {
            name.push('.');
            name.push_str(&self.extension);
        }
        name
    }

    fn archived_file_name(&self) -> String {
        let now = Local::now();
        let mut name = format!(
            "{}_{}_{}",
            self.name,
            now.format("%y%m%d_%H%M%S"),
            now.timestamp_subsec_nanos()
        );
        if !self.extension.is_empty() {
            name.push('.');
            name.push_str(&self.extension);
        }
        name
    }

    fn read_dir(&self) -> Result<fs::ReadDir> {
        fs::read_dir(&self.directory).map_err(|source| SpoolError::io(&self.directory, source))
    }

    fn extension_matches(&self, path: &Path) -> bool {
        match path.extension() {
            Some(ext) => !self.extension.is_empty() && *ext == *self.extension.as_str(),
            None => self.extension.is_empty(),
        }
    }

    /// Archived files: `name_` prefix plus matching extension. The active
    /// file never matches the prefix.
    fn archived_files(&self) -> Result<Vec<(PathBuf, Metadata)>> {
        let prefix = format!("{}_", self.name);
        let mut files = Vec::new();
        for entry in self.read_dir()? {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if !path.is_file() || !self.extension_matches(&path) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !file_name.starts_with(&prefix) {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                files.push((path, meta));
            }
        }
        Ok(files)
    }
}

// ──────────────────── fs helpers ────────────────────

#[cfg(unix)]
fn create_dir_0755(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    if dir.is_dir() {
        return Ok(());
    }
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(dir)
        .map_err(|source| SpoolError::io(dir, source))
}

#[cfg(not(unix))]
fn create_dir_0755(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| SpoolError::io(dir, source))
}

#[cfg(unix)]
fn open_append_0644(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o644)
        .open(path)
}

#[cfg(not(unix))]
fn open_append_0644(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

// ──────────────────── tests ────────────────────
