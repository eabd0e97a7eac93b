// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Environment-driven configuration.
//!
//! | Variable                         | Default   |
//! |----------------------------------|-----------|
//! | `SESSION_RELAY_DIR`              | required  |
//! | `SESSION_RELAY_ENDPOINT`         | required  |
//! | `SESSION_RELAY_KEY_ID`           | unset     |
//! | `SESSION_RELAY_SECRET`           | unset     |
//! | `SESSION_RELAY_FLUSH_DELAY_MS`   | `5000`    |
//! | `SESSION_RELAY_ROTATION_BYTES`   | `1048576` |
//! | `SESSION_RELAY_TIMEOUT_SECS`     | `10`      |
//! | `SESSION_RELAY_PROXY_HTTPS`      | `HTTPS_PROXY`, else unset |
//! | `SESSION_RELAY_LOG_LEVEL`        | `info`    |
//!
//! Missing credentials are not a configuration error: requests fail with
//! [`crate::transport::TransportError::MissingCredentials`] instead, so
//! entries keep being persisted until credentials are available.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_FLUSH_DELAY, DEFAULT_REQUEST_TIMEOUT, DEFAULT_ROTATION_THRESHOLD_BYTES,
};
use crate::error::ConfigError;
use crate::service::SessionOptions;
use crate::transport::Credentials;

const ENV_DIR: &str = "SESSION_RELAY_DIR";
const ENV_ENDPOINT: &str = "SESSION_RELAY_ENDPOINT";
const ENV_KEY_ID: &str = "SESSION_RELAY_KEY_ID";
const ENV_SECRET: &str = "SESSION_RELAY_SECRET";
const ENV_FLUSH_DELAY_MS: &str = "SESSION_RELAY_FLUSH_DELAY_MS";
const ENV_ROTATION_BYTES: &str = "SESSION_RELAY_ROTATION_BYTES";
const ENV_TIMEOUT_SECS: &str = "SESSION_RELAY_TIMEOUT_SECS";
const ENV_PROXY_HTTPS: &str = "SESSION_RELAY_PROXY_HTTPS";
const ENV_HTTPS_PROXY: &str = "HTTPS_PROXY";
const ENV_LOG_LEVEL: &str = "SESSION_RELAY_LOG_LEVEL";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Root telemetry directory; sessions live under `<root>/sessions`.
    pub root: PathBuf,
    /// Backend base URL.
    pub endpoint: String,
    pub key_id: Option<String>,
    pub secret: Option<String>,
    /// Quiet period before buffered entries are written.
    pub flush_delay: Duration,
    /// Active log size triggering a rotation.
    pub rotation_threshold: u64,
    pub request_timeout: Duration,
    pub https_proxy: Option<String>,
    pub log_level: String,
}

impl RelayConfig {
    /// Configuration with defaults for everything but the two required values.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, endpoint: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            endpoint: endpoint.into(),
            key_id: None,
            secret: None,
            flush_delay: DEFAULT_FLUSH_DELAY,
            rotation_threshold: DEFAULT_ROTATION_THRESHOLD_BYTES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            https_proxy: None,
            log_level: "info".to_string(),
        }
    }

    pub fn from_os_env() -> Result<Self, ConfigError> {
        Self::from_env_iter(env::vars())
    }

    /// Builds and validates a configuration from key/value pairs.
    pub fn from_env_iter<I, K, V>(iter: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let get = |key: &str| sanitize_non_empty(map.get(key).map(String::as_str));

        let root = get(ENV_DIR)
            .ok_or_else(|| ConfigError::Invalid(format!("{ENV_DIR} is required")))?;
        let endpoint = get(ENV_ENDPOINT)
            .ok_or_else(|| ConfigError::Invalid(format!("{ENV_ENDPOINT} is required")))?;

        let mut config = Self::new(root, endpoint);
        config.key_id = get(ENV_KEY_ID);
        config.secret = get(ENV_SECRET);
        if let Some(ms) = get(ENV_FLUSH_DELAY_MS).and_then(|v| v.parse::<u64>().ok()) {
            config.flush_delay = Duration::from_millis(ms);
        }
        if let Some(bytes) = get(ENV_ROTATION_BYTES).and_then(|v| v.parse::<u64>().ok()) {
            config.rotation_threshold = bytes;
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS).and_then(|v| v.parse::<u64>().ok()) {
            config.request_timeout = Duration::from_secs(secs);
        }
        config.https_proxy = get(ENV_PROXY_HTTPS).or_else(|| get(ENV_HTTPS_PROXY));
        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level.to_lowercase();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(format!("{ENV_DIR} cannot be empty")));
        }

        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "{ENV_ENDPOINT} must be an http(s) URL, got '{endpoint}'"
            )));
        }

        if self.rotation_threshold == 0 {
            return Err(ConfigError::Invalid(
                "rotation threshold must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Credentials when both halves are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.key_id, &self.secret) {
            (Some(key_id), Some(secret)) => Some(Credentials::new(key_id, secret)),
            _ => None,
        }
    }

    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            flush_delay: self.flush_delay,
            rotation_threshold: self.rotation_threshold,
        }
    }
}

fn sanitize_non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
