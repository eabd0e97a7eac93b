// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-session worker.
//!
//! Every session owns one [`SessionService`] task. All of its state (the
//! in-memory queue, the flush timer, the on-disk files) is touched only from
//! that task, which handles [`SessionCommand`]s one at a time. Producers talk
//! to it through a cloneable [`SessionHandle`].
//!
//! The worker stops on `shutdown`, on `purge`, or when every handle has been
//! dropped. In the first and last case buffered entries are flushed first.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info_span, Instrument};
use uuid::Uuid;

use crate::constants::{DEFAULT_FLUSH_DELAY, DEFAULT_ROTATION_THRESHOLD_BYTES};
use crate::debounce::FlushTimer;
use crate::delivery::DeliveryCoordinator;
use crate::entry::Entry;
use crate::entry_log::EntryLog;
use crate::error::{FileSystemError, SendError, SessionClosed, SessionError};
use crate::metadata::{Metadata, MetadataStore};
use crate::outbox::Outbox;
use crate::queue::EntryQueue;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Quiet period between the first buffered entry and the write.
    pub flush_delay: Duration,
    pub rotation_threshold: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            flush_delay: DEFAULT_FLUSH_DELAY,
            rotation_threshold: DEFAULT_ROTATION_THRESHOLD_BYTES,
        }
    }
}

#[derive(Debug)]
pub enum SessionCommand {
    AddEntry(Entry),
    Flush(oneshot::Sender<()>),
    /// Sent by the flush timer with the generation it was scheduled under.
    ScheduledFlush(u64),
    Send(oneshot::Sender<Result<(), SendError>>),
    SaveMetadata(Metadata, oneshot::Sender<Result<(), FileSystemError>>),
    Purge(oneshot::Sender<Result<(), FileSystemError>>),
    Shutdown(oneshot::Sender<()>),
}

#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Buffers an entry. Never blocks and never touches the disk.
    pub fn add_entry(&self, entry: Entry) -> Result<(), SessionClosed> {
        self.tx
            .send(SessionCommand::AddEntry(entry))
            .map_err(|_| SessionClosed)
    }

    /// Writes everything buffered so far. A failed write is logged and the
    /// entries stay buffered for the next flush.
    pub async fn flush(&self) -> Result<(), SessionClosed> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Flush(response_tx))
            .map_err(|_| SessionClosed)?;
        response_rx.await.map_err(|_| SessionClosed)
    }

    /// Runs one delivery pass. Entries still buffered in memory are not part
    /// of it; call [`Self::flush`] first to include them.
    pub async fn send(&self) -> Result<(), SendError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Send(response_tx))
            .map_err(|_| SessionClosed)?;
        response_rx.await.map_err(|_| SessionClosed)?
    }

    pub async fn save_metadata(&self, metadata: Metadata) -> Result<(), SessionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::SaveMetadata(metadata, response_tx))
            .map_err(|_| SessionClosed)?;
        response_rx
            .await
            .map_err(|_| SessionClosed)?
            .map_err(SessionError::from)
    }

    /// Drops buffered entries, deletes the session directory and stops the
    /// worker.
    pub async fn purge(&self) -> Result<(), SessionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Purge(response_tx))
            .map_err(|_| SessionClosed)?;
        response_rx
            .await
            .map_err(|_| SessionClosed)?
            .map_err(SessionError::from)
    }

    /// Flushes buffered entries and stops the worker.
    pub async fn shutdown(&self) -> Result<(), SessionClosed> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Shutdown(response_tx))
            .map_err(|_| SessionClosed)?;
        response_rx.await.map_err(|_| SessionClosed)
    }

    /// Whether the worker has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct SessionService {
    id: Uuid,
    session_dir: PathBuf,
    queue: EntryQueue,
    timer: FlushTimer,
    log: EntryLog,
    outbox: Outbox,
    metadata: MetadataStore,
    transport: Arc<dyn Transport>,
    flush_delay: Duration,
    rx: mpsc::UnboundedReceiver<SessionCommand>,
    // Weak so that dropping every handle closes the channel.
    tx: mpsc::WeakUnboundedSender<SessionCommand>,
}

impl SessionService {
    /// Builds the worker for the session stored in `session_dir`. Nothing is
    /// read or written until the first command arrives.
    #[must_use]
    pub fn new(
        id: Uuid,
        session_dir: &Path,
        transport: Arc<dyn Transport>,
        options: SessionOptions,
    ) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Self {
            id,
            session_dir: session_dir.to_path_buf(),
            queue: EntryQueue::new(),
            timer: FlushTimer::new(),
            log: EntryLog::new(session_dir, options.rotation_threshold),
            outbox: Outbox::new(session_dir),
            metadata: MetadataStore::new(session_dir),
            transport,
            flush_delay: options.flush_delay,
            rx,
            tx: tx.downgrade(),
        };
        (service, SessionHandle { id, tx })
    }

    /// Spawns the worker on the current runtime inside a `session` span.
    #[must_use]
    pub fn spawn(
        id: Uuid,
        session_dir: &Path,
        transport: Arc<dyn Transport>,
        options: SessionOptions,
    ) -> SessionHandle {
        let (service, handle) = Self::new(id, session_dir, transport, options);
        tokio::spawn(service.run().instrument(info_span!("session", id = %id)));
        handle
    }

    pub async fn run(mut self) {
        debug!("Session worker started");

        while let Some(command) = self.rx.recv().await {
            match command {
                SessionCommand::AddEntry(entry) => {
                    self.queue.push(entry);
                    if !self.timer.is_pending() {
                        self.schedule_flush();
                    }
                }

                SessionCommand::Flush(response_tx) => {
                    self.flush();
                    if response_tx.send(()).is_err() {
                        debug!("Flush requester went away before the reply");
                    }
                }

                SessionCommand::ScheduledFlush(generation) => {
                    if self.timer.is_current(generation) {
                        self.flush();
                    } else {
                        debug!("Ignoring superseded flush timer {generation}");
                    }
                }

                SessionCommand::Send(response_tx) => {
                    let result = self.send().await;
                    if response_tx.send(result).is_err() {
                        debug!("Send requester went away before the reply");
                    }
                }

                SessionCommand::SaveMetadata(metadata, response_tx) => {
                    let result = self.metadata.save(&metadata);
                    if let Err(e) = &result {
                        error!("Failed to save session metadata: {e}");
                    }
                    if response_tx.send(result).is_err() {
                        debug!("Metadata requester went away before the reply");
                    }
                }

                SessionCommand::Purge(response_tx) => {
                    let result = self.purge();
                    if response_tx.send(result).is_err() {
                        debug!("Purge requester went away before the reply");
                    }
                    debug!("Session worker stopped after purge");
                    return;
                }

                SessionCommand::Shutdown(response_tx) => {
                    self.flush();
                    if response_tx.send(()).is_err() {
                        debug!("Shutdown requester went away before the reply");
                    }
                    debug!("Session worker shutting down");
                    return;
                }
            }
        }

        self.flush();
        debug!("Session worker stopped, all handles dropped");
    }

    fn schedule_flush(&mut self) {
        let tx = self.tx.clone();
        self.timer.schedule(self.flush_delay, move |generation| {
            if let Some(tx) = tx.upgrade() {
                // A closed channel means the worker is already gone.
                let _ = tx.send(SessionCommand::ScheduledFlush(generation));
            }
        });
    }

    /// Moves the whole queue to disk. On failure the batch goes back to the
    /// front of the queue, ahead of anything added since.
    fn flush(&mut self) {
        self.timer.cancel();
        let batch = self.queue.drain();
        if batch.is_empty() {
            return;
        }

        match self.log.persist(&batch, &self.outbox) {
            Ok(outcome) => {
                debug!("Flushed {} entries", outcome.written);
                if let Some(rotated) = outcome.rotated {
                    debug!("Active log rotated into {}", rotated.display());
                }
            }
            Err(e) => {
                error!("Failed to persist {} entries: {e}", batch.len());
                self.queue.requeue(batch);
            }
        }
    }

    async fn send(&self) -> Result<(), SendError> {
        let report = DeliveryCoordinator::new(
            &self.log,
            &self.outbox,
            &self.metadata,
            self.transport.as_ref(),
        )
        .run()
        .await
        .inspect_err(|e| error!("Delivery failed: {e}"))?;

        debug!(
            "Delivery finished: {} files, {} entries uploaded, {} discarded",
            report.uploaded_files, report.uploaded_entries, report.discarded_files
        );
        Ok(())
    }

    fn purge(&mut self) -> Result<(), FileSystemError> {
        self.timer.cancel();
        let dropped = self.queue.drain().len();
        if let Err(e) = std::fs::remove_dir_all(&self.session_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!("Failed to purge session {}: {e}", self.id);
                return Err(FileSystemError::io("removing", &self.session_dir, e));
            }
        }
        debug!("Purged session directory, dropped {dropped} buffered entries");
        Ok(())
    }
}
