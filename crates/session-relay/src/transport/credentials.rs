// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Debug;
use std::sync::Arc;
use std::{future::Future, pin::Pin};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::HeaderValue;
use tokio::sync::OnceCell;

use super::TransportError;

/// Key id and secret authenticating every backend request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key_id: String,
    secret: String,
}

impl Credentials {
    #[must_use]
    pub fn new(key_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            secret: secret.into(),
        }
    }

    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// `Basic base64(key_id:secret)`.
    pub fn authorization_header(&self) -> Result<HeaderValue, TransportError> {
        if self.key_id.is_empty() || self.secret.is_empty() {
            return Err(TransportError::MissingCredentials);
        }
        // A colon in the key id would make the pair ambiguous once joined.
        if self.key_id.contains(':') {
            return Err(TransportError::EncodingFailure(
                "credential key id must not contain ':'".to_string(),
            ));
        }
        let encoded = STANDARD.encode(format!("{}:{}", self.key_id, self.secret));
        let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|e| TransportError::EncodingFailure(e.to_string()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

pub type CredentialsResolverFn =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Option<Credentials>> + Send>> + Send + Sync>;

/// Process-wide source of [`Credentials`].
///
/// A dynamic factory defers resolution until the first request needs it and
/// caches the outcome for the lifetime of the process.
#[derive(Clone)]
pub enum CredentialsFactory {
    Static(Option<Credentials>),
    Dynamic {
        resolver_fn: CredentialsResolverFn,
        credentials: Arc<OnceCell<Option<Credentials>>>,
    },
}

impl CredentialsFactory {
    #[must_use]
    pub fn new_from_resolver(resolver_fn: CredentialsResolverFn) -> Self {
        Self::Dynamic {
            resolver_fn,
            credentials: Arc::new(OnceCell::new()),
        }
    }

    #[must_use]
    pub fn new_from_static(credentials: Option<Credentials>) -> Self {
        Self::Static(credentials)
    }

    pub async fn get_credentials(&self) -> Option<&Credentials> {
        match self {
            Self::Static(credentials) => credentials.as_ref(),
            Self::Dynamic {
                resolver_fn,
                credentials,
            } => credentials
                .get_or_init(|| async { (resolver_fn)().await })
                .await
                .as_ref(),
        }
    }
}

impl Debug for CredentialsFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CredentialsFactory")
    }
}
