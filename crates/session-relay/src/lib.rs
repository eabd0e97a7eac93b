// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Session Relay
//!
//! Durable buffering and at-least-once delivery of client telemetry, grouped
//! into sessions.
//!
//! ## Pipeline
//!
//! ```text
//! add_entry -> EntryQueue -> (debounced flush) -> entries.json
//!           -> (size threshold or send) -> out/entries/<uuid-v7>.json
//!           -> DeliveryCoordinator -> Transport
//! ```
//!
//! Each session is a task owning its queue and files ([`service`]). Entries
//! are written to disk in arrival order, rotated into immutable outfiles, and
//! an outfile is only deleted once the backend accepted it.
//!
//! ## Modules
//!
//! - [`service`]: per-session worker and its handle
//! - [`registry`]: creating and reopening sessions on disk
//! - [`delivery`]: registration and outbox draining
//! - [`transport`]: backend contract and its HTTPS implementation
//! - [`config`]: environment-driven configuration

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_copy_implementations)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]

pub mod config;
pub mod constants;
pub mod debounce;
pub mod delivery;
pub mod entry;
pub mod entry_log;
pub mod error;
pub mod http;
pub mod logger;
pub mod metadata;
pub mod outbox;
pub mod queue;
pub mod registry;
pub mod relay;
pub mod service;
pub mod transport;

pub use config::RelayConfig;
pub use entry::Entry;
pub use error::{ConfigError, FileSystemError, SendError, SessionClosed, SessionError};
pub use metadata::Metadata;
pub use registry::SessionRegistry;
pub use relay::SessionRelay;
pub use service::{SessionHandle, SessionOptions};
pub use transport::{Transport, TransportError};
