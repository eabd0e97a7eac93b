// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Backend contract consumed by the delivery loop.
//!
//! The core only needs two calls: register a session and upload a batch of
//! entries for a registered session. [`http::HttpTransport`] implements them
//! over HTTPS; tests and embedders can supply their own [`Transport`].
//!
//! # Error classification
//!
//! - [`TransportError::MissingCredentials`]: no key/secret could be resolved
//! - [`TransportError::EncodingFailure`]: credentials or body could not be encoded
//! - [`TransportError::NetworkFailure`]: connect, timeout, or I/O failure
//! - [`TransportError::InvalidResponse`]: success status with an unusable body
//! - [`TransportError::UnexpectedStatus`]: any non-2xx status
//! - [`TransportError::Internal`]: client construction and anything else

pub mod credentials;
pub mod http;

use async_trait::async_trait;

use crate::entry::Entry;
use crate::metadata::Metadata;

pub use credentials::{Credentials, CredentialsFactory, CredentialsResolverFn};
pub use http::HttpTransport;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("failed to encode request: {0}")]
    EncodingFailure(String),

    #[error("network failure: {0}")]
    NetworkFailure(#[source] BoxError),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error("internal transport error: {0}")]
    Internal(#[source] BoxError),
}

impl TransportError {
    /// Whether the same request could succeed later without any change on
    /// the client side.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NetworkFailure(_) => true,
            Self::UnexpectedStatus(code) => *code == 408 || *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Registers a session and returns the backend-assigned identifier.
    async fn register_session(&self, metadata: &Metadata) -> Result<String, TransportError>;

    /// Uploads one batch for a registered session.
    async fn upload_entries(
        &self,
        entries: &[Entry],
        remote_identifier: &str,
    ) -> Result<(), TransportError>;
}
