// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Append-only log holding the active window of a session.
//!
//! Each flushed batch is appended to `entries.json` as newline-delimited JSON.
//! Once the file reaches the rotation threshold it is handed to the
//! [`Outbox`], and the next write starts a fresh file.
//!
//! [`EntryLog::persist`] fails only when the batch is not on disk. A write that
//! fails partway is truncated back to the previous end of file, so the batch
//! can be retried without leaving a torn line behind. Anything that goes wrong
//! after the append (sync, rotation) is logged and reported in the outcome,
//! never as an error, because the caller would otherwise write the batch twice.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::constants::ACTIVE_LOG_FILE;
use crate::entry::Entry;
use crate::error::FileSystemError;
use crate::outbox::Outbox;

/// Result of a single [`EntryLog::persist`] call.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    pub written: usize,
    pub skipped: usize,
    /// Outbox file created when this write crossed the threshold.
    pub rotated: Option<PathBuf>,
    /// Set when the threshold was reached but the rotation failed. The data
    /// stays in the active log and the next write or delivery pass rotates it.
    pub rotation_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EntryLog {
    session_dir: PathBuf,
    path: PathBuf,
    rotation_threshold: u64,
}

impl EntryLog {
    #[must_use]
    pub fn new(session_dir: &Path, rotation_threshold: u64) -> Self {
        Self {
            session_dir: session_dir.to_path_buf(),
            path: session_dir.join(ACTIVE_LOG_FILE),
            rotation_threshold,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `batch` in order and rotates if the file reached the threshold.
    ///
    /// An entry that fails to encode would be skipped with a warning, but
    /// payloads are `serde_json::Value`, which always encodes, so `skipped`
    /// stays at zero in practice.
    pub fn persist(
        &self,
        batch: &[Entry],
        outbox: &Outbox,
    ) -> Result<PersistOutcome, FileSystemError> {
        if batch.is_empty() {
            return Ok(PersistOutcome::default());
        }

        let mut outcome = PersistOutcome::default();
        let mut buffer = String::new();
        for entry in batch {
            match entry.to_line() {
                Ok(line) => {
                    buffer.push_str(&line);
                    buffer.push('\n');
                    outcome.written += 1;
                }
                Err(e) => {
                    warn!("Skipping {} entry that failed to encode: {e}", entry.kind());
                    outcome.skipped += 1;
                }
            }
        }

        fs::create_dir_all(&self.session_dir)
            .map_err(|e| FileSystemError::io("creating", &self.session_dir, e))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| FileSystemError::io("opening", &self.path, e))?;
        let start = file
            .metadata()
            .map_err(|e| FileSystemError::io("inspecting", &self.path, e))?
            .len();

        if let Err(e) = file.write_all(buffer.as_bytes()) {
            if let Err(truncate) = file.set_len(start) {
                error!(
                    "Failed to truncate {} after a partial write: {truncate}",
                    self.path.display()
                );
            }
            return Err(FileSystemError::io("appending to", &self.path, e));
        }
        if let Err(e) = file.sync_data() {
            warn!("Failed to sync {}: {e}", self.path.display());
        }
        drop(file);

        let size = start.saturating_add(u64::try_from(buffer.len()).unwrap_or(u64::MAX));
        debug!(
            "Persisted {} entries, active log is {size} bytes",
            outcome.written
        );

        if size >= self.rotation_threshold {
            match outbox.rotate(&self.path) {
                Ok(rotated) => outcome.rotated = rotated,
                Err(e) => {
                    error!("Rotation deferred: {e}");
                    outcome.rotation_error = Some(e.to_string());
                }
            }
        }
        Ok(outcome)
    }
}
