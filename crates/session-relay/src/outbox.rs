// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Rotated, immutable batches waiting for delivery.
//!
//! Rotation renames the active log into `out/entries/<id>.json`. Ids are
//! UUID v7, whose textual form sorts by creation time, so listing the outbox
//! in file-name order yields the batches oldest first. A file is never
//! rewritten after rotation; it is either removed after a confirmed upload or
//! left untouched for the next delivery pass.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::{OUTBOX_DIR, OUTFILE_EXTENSION};
use crate::entry::Entry;
use crate::error::FileSystemError;

#[derive(Debug, Clone)]
pub struct Outbox {
    dir: PathBuf,
}

impl Outbox {
    #[must_use]
    pub fn new(session_dir: &Path) -> Self {
        Self {
            dir: session_dir.join(OUTBOX_DIR[0]).join(OUTBOX_DIR[1]),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Moves `active` into the outbox under a fresh name.
    ///
    /// Returns `None` when there is nothing to rotate (no active file, or an
    /// empty one).
    pub fn rotate(&self, active: &Path) -> Result<Option<PathBuf>, FileSystemError> {
        let len = match fs::metadata(active) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FileSystemError::io("inspecting", active, e)),
        };
        if len == 0 {
            return Ok(None);
        }

        fs::create_dir_all(&self.dir)
            .map_err(|e| FileSystemError::io("creating", &self.dir, e))?;
        let target = self
            .dir
            .join(format!("{}.{OUTFILE_EXTENSION}", Uuid::now_v7()));
        fs::rename(active, &target).map_err(|e| FileSystemError::io("rotating", active, e))?;

        debug!("Rotated {len} bytes into {}", target.display());
        Ok(Some(target))
    }

    /// Outbox files, oldest first.
    pub fn list(&self) -> Result<Vec<PathBuf>, FileSystemError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FileSystemError::io("listing", &self.dir, e)),
        };

        let mut files = Vec::new();
        for dir_entry in read_dir {
            let path = dir_entry
                .map_err(|e| FileSystemError::io("listing", &self.dir, e))?
                .path();
            if path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(OUTFILE_EXTENSION)
            {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Parses every line of an outbox file. Lines that are not valid entries,
    /// including lines that are not UTF-8, are logged and skipped; they never
    /// fail the whole file.
    pub fn read(path: &Path) -> Result<Vec<Entry>, FileSystemError> {
        let contents = fs::read(path).map_err(|e| FileSystemError::io("reading", path, e))?;

        let mut entries = Vec::new();
        for (index, line) in contents.split(|byte| *byte == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<Entry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(
                    "Skipping unparsable entry at {}:{}: {e}",
                    path.display(),
                    index + 1
                ),
            }
        }
        Ok(entries)
    }

    pub fn remove(&self, path: &Path) -> Result<(), FileSystemError> {
        fs::remove_file(path).map_err(|e| FileSystemError::io("removing", path, e))
    }
}
