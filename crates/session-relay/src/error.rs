// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the session pipeline.
//!
//! Filesystem failures are reported as [`FileSystemError`] and carry the path
//! they happened on. Delivery failures surface to callers of
//! [`crate::service::SessionHandle::send`] as [`SendError`], and storage-only
//! commands such as `purge` report [`SessionError`]. Transport failures
//! live next to the transport in [`crate::transport::TransportError`].

use std::path::{Path, PathBuf};

use crate::transport::TransportError;

/// Errors raised while reading or writing a session directory.
#[derive(Debug, thiserror::Error)]
pub enum FileSystemError {
    #[error("session directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("file does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FileSystemError {
    pub(crate) fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound if action == "reading" => {
                Self::MissingFile(path.to_path_buf())
            }
            _ => Self::Io {
                action,
                path: path.to_path_buf(),
                source,
            },
        }
    }

    pub(crate) fn encode(path: &Path, source: serde_json::Error) -> Self {
        Self::Encode {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn decode(path: &Path, source: serde_json::Error) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors returned by a delivery pass.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The session has no `metadata.json`, so it cannot be registered.
    #[error("session metadata is missing")]
    MetadataMissing,

    #[error("session storage error: {0}")]
    Storage(#[from] FileSystemError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    SessionClosed(#[from] SessionClosed),
}

/// Errors returned by session commands that touch storage.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Storage(#[from] FileSystemError),

    #[error(transparent)]
    Closed(#[from] SessionClosed),
}

/// Errors raised while building a [`crate::config::RelayConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to install log subscriber: {0}")]
    Logger(String),
}

/// The session worker has stopped and no longer accepts commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("session worker is not running")]
pub struct SessionClosed;
