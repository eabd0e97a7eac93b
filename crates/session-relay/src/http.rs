// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client construction.
//!
//! The client applies the configured request timeout, keeps idle pooled
//! connections for 270s, enables TCP keep-alive, and routes through an HTTPS
//! proxy when one is configured. An unusable proxy URL is logged and the
//! client falls back to a direct connection rather than refusing to start.

use core::time::Duration;

use tracing::error;

/// Builds the client used by [`crate::transport::HttpTransport`].
#[must_use]
pub fn get_client(timeout: Duration, https_proxy: Option<&str>) -> reqwest::Client {
    match build_client(timeout, https_proxy) {
        Ok(client) => client,
        Err(e) => {
            error!("Unable to parse proxy configuration: {e}, falling back to direct connection");
            match build_client(timeout, None) {
                Ok(client) => client,
                Err(inner) => {
                    error!(
                        "Failed to build HTTP client without proxy: {inner}, using reqwest defaults"
                    );
                    reqwest::Client::new()
                }
            }
        }
    }
}

fn build_client(
    timeout: Duration,
    https_proxy: Option<&str>,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut client = reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Some(Duration::from_secs(270)))
        .tcp_keepalive(Some(Duration::from_secs(120)));

    if let Some(https_uri) = https_proxy {
        client = client.proxy(reqwest::Proxy::https(https_uri)?);
    }

    client.build()
}
