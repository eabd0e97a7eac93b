// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTPS implementation of [`Transport`].
//!
//! ```text
//! POST {endpoint}/session/init     {"executable"?, "device"?, "startedAt"}  ->  {"sessionId"}
//! POST {endpoint}/session/entries  {"sessionId", "logs": [...], "events": [...]}
//! ```
//!
//! Every request carries `Authorization: Basic base64(keyId:secret)`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use super::{CredentialsFactory, Transport, TransportError};
use crate::config::RelayConfig;
use crate::constants::{SESSION_ENTRIES_PATH, SESSION_INIT_PATH};
use crate::entry::{self, Entry};
use crate::http::get_client;
use crate::metadata::Metadata;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    executable: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<&'a Value>,
    #[serde(with = "time::serde::rfc3339")]
    started_at: time::OffsetDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest<'a> {
    session_id: &'a str,
    logs: Vec<&'a Value>,
    events: Vec<&'a Value>,
}

fn non_null(value: &Value) -> Option<&Value> {
    (!value.is_null()).then_some(value)
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    credentials: Arc<CredentialsFactory>,
}

impl HttpTransport {
    /// `endpoint` is the backend base URL; routes are resolved relative to it.
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        credentials: Arc<CredentialsFactory>,
    ) -> Result<Self, TransportError> {
        let mut base = endpoint.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint = Url::parse(&base).map_err(|e| TransportError::Internal(Box::new(e)))?;
        Ok(Self {
            client,
            endpoint,
            credentials,
        })
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self, TransportError> {
        let client = get_client(config.request_timeout, config.https_proxy.as_deref());
        Self::new(
            client,
            &config.endpoint,
            Arc::new(CredentialsFactory::new_from_static(config.credentials())),
        )
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, TransportError> {
        let credentials = self
            .credentials
            .get_credentials()
            .await
            .ok_or(TransportError::MissingCredentials)?;
        let authorization = credentials.authorization_header()?;
        let body =
            serde_json::to_vec(body).map_err(|e| TransportError::EncodingFailure(e.to_string()))?;
        let url = self
            .endpoint
            .join(path)
            .map_err(|e| TransportError::Internal(Box::new(e)))?;

        debug!("POST {url} ({} bytes)", body.len());
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            error!(
                "{status}: Request to {path} was rejected: {:?}",
                response.text().await.unwrap_or_default()
            );
            return Err(TransportError::UnexpectedStatus(status.as_u16()));
        }
        Ok(response)
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::Internal(Box::new(e))
    } else {
        TransportError::NetworkFailure(Box::new(e))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn register_session(&self, metadata: &Metadata) -> Result<String, TransportError> {
        let request = RegisterRequest {
            executable: non_null(&metadata.executable),
            device: non_null(&metadata.device),
            started_at: metadata.started_at,
        };
        let body = self
            .post(SESSION_INIT_PATH, &request)
            .await?
            .bytes()
            .await
            .map_err(classify)?;

        let response: RegisterResponse = serde_json::from_slice(&body)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        if response.session_id.is_empty() {
            return Err(TransportError::InvalidResponse(
                "empty sessionId".to_string(),
            ));
        }
        Ok(response.session_id)
    }

    async fn upload_entries(
        &self,
        entries: &[Entry],
        remote_identifier: &str,
    ) -> Result<(), TransportError> {
        let (logs, events) = entry::partition(entries);
        let request = UploadRequest {
            session_id: remote_identifier,
            logs,
            events,
        };
        self.post(SESSION_ENTRIES_PATH, &request).await?;
        Ok(())
    }
}
