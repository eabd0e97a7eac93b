// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Sessions stored under `<root>/sessions/<local-id>/`.
//!
//! A directory name is the whole identity of a session: reopening a session
//! needs nothing but the parsed id. Directories whose name is not a UUID are
//! ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::SESSIONS_DIR;
use crate::error::{FileSystemError, SessionError};
use crate::metadata::Metadata;
use crate::service::{SessionHandle, SessionOptions, SessionService};
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions_dir: PathBuf,
    options: SessionOptions,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(root: &Path, options: SessionOptions) -> Self {
        Self {
            sessions_dir: root.join(SESSIONS_DIR),
            options,
        }
    }

    #[must_use]
    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    #[must_use]
    pub fn session_dir(&self, id: Uuid) -> PathBuf {
        self.sessions_dir.join(id.to_string())
    }

    /// Ids of every stored session, sorted. A missing root is empty.
    pub fn saved_ids(&self) -> Result<Vec<Uuid>, FileSystemError> {
        let read_dir = match fs::read_dir(&self.sessions_dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FileSystemError::io("listing", &self.sessions_dir, e)),
        };

        let mut ids = Vec::new();
        for dir_entry in read_dir {
            let path = dir_entry
                .map_err(|e| FileSystemError::io("listing", &self.sessions_dir, e))?
                .path();
            if !path.is_dir() {
                continue;
            }
            let name = path.file_name().and_then(|name| name.to_str());
            match name.map(Uuid::parse_str) {
                Some(Ok(id)) => ids.push(id),
                _ => warn!("Skipping unrecognized session directory {}", path.display()),
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Starts a worker for every stored session.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load_saved(
        &self,
        transport: &Arc<dyn Transport>,
    ) -> Result<Vec<SessionHandle>, FileSystemError> {
        let handles: Vec<_> = self
            .saved_ids()?
            .into_iter()
            .map(|id| self.spawn(id, Arc::clone(transport)))
            .collect();
        debug!("Loaded {} saved sessions", handles.len());
        Ok(handles)
    }

    /// Starts a worker for one stored session.
    pub fn open(
        &self,
        id: Uuid,
        transport: Arc<dyn Transport>,
    ) -> Result<SessionHandle, FileSystemError> {
        let dir = self.session_dir(id);
        if !dir.is_dir() {
            return Err(FileSystemError::MissingDirectory(dir));
        }
        Ok(self.spawn(id, transport))
    }

    /// Starts a new session and stores its metadata.
    pub async fn create(
        &self,
        transport: Arc<dyn Transport>,
        metadata: Metadata,
    ) -> Result<SessionHandle, SessionError> {
        let handle = self.spawn(Uuid::new_v4(), transport);
        handle.save_metadata(metadata).await?;
        debug!("Created session {}", handle.id());
        Ok(handle)
    }

    fn spawn(&self, id: Uuid, transport: Arc<dyn Transport>) -> SessionHandle {
        SessionService::spawn(id, &self.session_dir(id), transport, self.options)
    }
}
