// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Session-level metadata persisted as `metadata.json`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::warn;

use crate::constants::METADATA_FILE;
use crate::error::FileSystemError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(default)]
    pub device: Value,
    #[serde(default)]
    pub executable: Value,
    /// Identifier assigned by the backend on registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_identifier: Option<String>,
}

impl Metadata {
    /// Metadata for a session starting now.
    #[must_use]
    pub fn new(device: Value, executable: Value) -> Self {
        Self {
            started_at: OffsetDateTime::now_utc(),
            device,
            executable,
            remote_identifier: None,
        }
    }

    /// Records the backend identifier. An identifier that is already set is
    /// kept; returns whether `remote_identifier` was stored.
    pub fn assign_remote_identifier(&mut self, remote_identifier: String) -> bool {
        match &self.remote_identifier {
            Some(existing) => {
                if *existing != remote_identifier {
                    warn!(
                        "Ignoring remote identifier {remote_identifier}, session is already registered as {existing}"
                    );
                }
                false
            }
            None => {
                self.remote_identifier = Some(remote_identifier);
                true
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    #[must_use]
    pub fn new(session_dir: &Path) -> Self {
        Self {
            path: session_dir.join(METADATA_FILE),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the record, or `None` if the session has none yet.
    pub fn load(&self) -> Result<Option<Metadata>, FileSystemError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FileSystemError::io("reading", &self.path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| FileSystemError::decode(&self.path, e))
    }

    /// Replaces the record atomically: the new content goes to a sibling
    /// temporary file which is then renamed over `metadata.json`.
    pub fn save(&self, metadata: &Metadata) -> Result<(), FileSystemError> {
        let bytes =
            serde_json::to_vec(metadata).map_err(|e| FileSystemError::encode(&self.path, e))?;

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| FileSystemError::io("creating", dir, e))?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        let mut file =
            fs::File::create(&tmp_path).map_err(|e| FileSystemError::io("creating", &tmp_path, e))?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_all())
            .map_err(|e| FileSystemError::io("writing", &tmp_path, e))?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
            .map_err(|e| FileSystemError::io("replacing", &self.path, e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> Metadata {
        Metadata {
            started_at: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
            device: json!({"os": "linux", "arch": "x86_64"}),
            executable: json!({"name": "app", "version": "1.2.3"}),
            remote_identifier: None,
        }
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let tmp = TempDir::new().unwrap();
        let store = MetadataStore::new(tmp.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let store = MetadataStore::new(&tmp.path().join("session"));
        let metadata = sample();

        store.save(&metadata).unwrap();

        assert_eq!(store.load().unwrap(), Some(metadata));
    }

    #[test]
    fn test_wire_field_names() {
        let mut metadata = sample();
        let raw = serde_json::to_value(&metadata).unwrap();
        assert_eq!(raw["startedAt"], "2023-11-14T22:13:20Z");
        assert_eq!(raw["device"]["os"], "linux");
        assert!(raw.get("remoteIdentifier").is_none());

        metadata.assign_remote_identifier("remote-1".to_string());
        let raw = serde_json::to_value(&metadata).unwrap();
        assert_eq!(raw["remoteIdentifier"], "remote-1");
    }

    #[test]
    fn test_rewrite_leaves_no_temporary_file() {
        let tmp = TempDir::new().unwrap();
        let store = MetadataStore::new(tmp.path());
        let mut metadata = sample();
        store.save(&metadata).unwrap();

        metadata.assign_remote_identifier("remote-1".to_string());
        store.save(&metadata).unwrap();

        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["metadata.json".to_string()]);
        assert_eq!(
            store.load().unwrap().unwrap().remote_identifier.as_deref(),
            Some("remote-1")
        );
    }

    #[test]
    fn test_remote_identifier_is_never_replaced() {
        let mut metadata = sample();
        assert!(metadata.assign_remote_identifier("first".to_string()));
        assert!(!metadata.assign_remote_identifier("second".to_string()));
        assert_eq!(metadata.remote_identifier.as_deref(), Some("first"));
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let store = MetadataStore::new(tmp.path());
        fs::write(store.path(), "{\"startedAt\": 12").unwrap();

        assert!(matches!(
            store.load(),
            Err(FileSystemError::Decode { .. })
        ));
    }
}
