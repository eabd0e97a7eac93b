// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Process-level entry point wiring configuration, transport and registry.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::error::{FileSystemError, SessionError};
use crate::metadata::Metadata;
use crate::registry::SessionRegistry;
use crate::service::SessionHandle;
use crate::transport::{HttpTransport, Transport, TransportError};

/// One backend, one root directory, any number of sessions.
#[derive(Clone)]
pub struct SessionRelay {
    registry: SessionRegistry,
    transport: Arc<dyn Transport>,
}

impl SessionRelay {
    #[must_use]
    pub fn new(config: &RelayConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry: SessionRegistry::new(&config.root, config.session_options()),
            transport,
        }
    }

    /// Relay talking to `config.endpoint` over HTTPS.
    pub fn from_config(config: &RelayConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Reopens every session left on disk, typically at process start so
    /// their outboxes can be delivered.
    pub fn load_saved(&self) -> Result<Vec<SessionHandle>, FileSystemError> {
        self.registry.load_saved(&self.transport)
    }

    pub async fn start_session(&self, metadata: Metadata) -> Result<SessionHandle, SessionError> {
        self.registry
            .create(Arc::clone(&self.transport), metadata)
            .await
    }
}
