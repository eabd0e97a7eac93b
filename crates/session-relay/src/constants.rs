// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! On-disk layout names and pipeline defaults.

use std::time::Duration;

/// Subdirectory of the relay root holding one directory per session.
pub const SESSIONS_DIR: &str = "sessions";

/// Per-session metadata record.
pub const METADATA_FILE: &str = "metadata.json";

/// Active, not-yet-rotated append-only log.
pub const ACTIVE_LOG_FILE: &str = "entries.json";

/// Outbox location relative to the session directory (`out/entries`).
pub const OUTBOX_DIR: [&str; 2] = ["out", "entries"];

/// Extension given to rotated outbox files.
pub const OUTFILE_EXTENSION: &str = "json";

/// Quiet period before buffered entries are written to disk.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_secs(5);

/// Active log size that triggers a rotation: exactly 1 MiB.
pub const DEFAULT_ROTATION_THRESHOLD_BYTES: u64 = 1024 * 1024;

/// Per-request timeout applied by the HTTP transport.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend route registering a session.
pub const SESSION_INIT_PATH: &str = "session/init";

/// Backend route receiving a batch of entries.
pub const SESSION_ENTRIES_PATH: &str = "session/entries";
