// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log formatting for the relay.
//!
//! Lines are prefixed with `SESSION_RELAY` so they can be told apart from the
//! host application's own output:
//!
//! ```text
//! SESSION_RELAY | LEVEL | [span_name{span_fields}:] message {event_fields}
//! ```
//!
//! Every session worker runs inside a `session{id=...}` span, so anything it
//! logs is attributed to its session:
//!
//! ```text
//! SESSION_RELAY | WARN | session{id=7c0d...}: Skipping unparsable entry at .../out/entries/0190....json:3
//! ```

use std::fmt;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

const PREFIX: &str = "SESSION_RELAY";

#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(&mut writer, "{PREFIX} | {} | ", metadata.level())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Filter directives for `log_level`, with noisy HTTP internals silenced.
#[must_use]
pub fn env_filter_directives(log_level: &str) -> String {
    format!("h2=off,hyper=off,rustls=off,{log_level}")
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(log_level: &str) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_new(env_filter_directives(log_level))
        .map_err(|e| ConfigError::Logger(e.to_string()))?;
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .event_format(Formatter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ConfigError::Logger(e.to_string()))
}
