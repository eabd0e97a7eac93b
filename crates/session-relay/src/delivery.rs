// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! One delivery pass for a session.
//!
//! ```text
//! load metadata -> ensure registered -> ┌ rotate active log
//!                                       │ oldest outfile? ── none ──> done
//!                                       │ upload it
//!                                       └ delete it, repeat
//! ```
//!
//! An outfile is deleted only after the transport confirmed its upload. The
//! first failure ends the pass and leaves every remaining file in place.

use tracing::{debug, info, warn};

use crate::entry_log::EntryLog;
use crate::error::SendError;
use crate::metadata::MetadataStore;
use crate::outbox::Outbox;
use crate::transport::Transport;

/// What a successful pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub registered: bool,
    pub uploaded_files: usize,
    pub uploaded_entries: usize,
    /// Outfiles deleted because none of their lines could be read.
    pub discarded_files: usize,
}

pub struct DeliveryCoordinator<'a> {
    log: &'a EntryLog,
    outbox: &'a Outbox,
    metadata: &'a MetadataStore,
    transport: &'a dyn Transport,
}

impl<'a> DeliveryCoordinator<'a> {
    #[must_use]
    pub fn new(
        log: &'a EntryLog,
        outbox: &'a Outbox,
        metadata: &'a MetadataStore,
        transport: &'a dyn Transport,
    ) -> Self {
        Self {
            log,
            outbox,
            metadata,
            transport,
        }
    }

    pub async fn run(&self) -> Result<DeliveryReport, SendError> {
        let mut report = DeliveryReport::default();
        let remote_identifier = self.ensure_registered(&mut report).await?;

        loop {
            self.outbox.rotate(self.log.path())?;

            let Some(outfile) = self.outbox.list()?.into_iter().next() else {
                return Ok(report);
            };

            let entries = Outbox::read(&outfile)?;
            if entries.is_empty() {
                warn!(
                    "Discarding {} with no readable entries",
                    outfile.display()
                );
                self.outbox.remove(&outfile)?;
                report.discarded_files += 1;
                continue;
            }

            self.transport
                .upload_entries(&entries, &remote_identifier)
                .await?;
            self.outbox.remove(&outfile)?;
            debug!(
                "Delivered {} entries from {}",
                entries.len(),
                outfile.display()
            );
            report.uploaded_files += 1;
            report.uploaded_entries += entries.len();
        }
    }

    /// Returns the remote identifier, registering the session first if it has
    /// none. A new identifier is on disk before this returns.
    async fn ensure_registered(&self, report: &mut DeliveryReport) -> Result<String, SendError> {
        let mut metadata = self.metadata.load()?.ok_or(SendError::MetadataMissing)?;
        if let Some(remote_identifier) = &metadata.remote_identifier {
            return Ok(remote_identifier.clone());
        }

        let remote_identifier = self.transport.register_session(&metadata).await?;
        metadata.assign_remote_identifier(remote_identifier.clone());
        self.metadata.save(&metadata)?;
        info!("Session registered as {remote_identifier}");
        report.registered = true;
        Ok(remote_identifier)
    }
}
