// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for the LIFX cloud API.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::command::Command;
use crate::error::ProtocolError;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.lifx.com/v1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the HTTP transport.
///
/// # Examples
///
/// ```
/// use lifx_remote::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("c87c73a896b554367fac61f71dd3656af8d93a525a4e87df5952c6078a89d192")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    token: String,
    base_url: String,
    timeout: Duration,
}

impl HttpConfig {
    /// Creates a configuration for the given app token against the
    /// production API.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the API base URL. Mainly useful for tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates an [`HttpClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying client cannot be created or the
    /// token is not a valid header value.
    pub fn into_client(self) -> Result<HttpClient, ProtocolError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::try_from(format!("Bearer {}", self.token))
            .map_err(|_| ProtocolError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .default_headers(headers)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HttpClient {
            base_url: self.base_url,
            client,
        })
    }
}

/// HTTP client for the LIFX cloud.
///
/// Stateless aside from connection pooling: each command is an independent
/// request carrying the bearer token.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Returns the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a command and returns the raw status code and body text.
    ///
    /// GET requests carry no body; everything else sends the command's
    /// JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Http` if the request fails before a
    /// response is received.
    pub async fn send(&self, command: &Command) -> Result<(u16, String), ProtocolError> {
        let method = command.method();
        let url = command.url(&self.base_url);

        tracing::debug!(%method, %url, kind = %command.kind(), "sending request");

        let mut request = self.client.request(method.clone(), &url);
        if method != reqwest::Method::GET {
            request = request.json(&command.body());
        }

        let response = request.send().await.map_err(ProtocolError::Http)?;
        let code = response.status().as_u16();
        let body = response.text().await.map_err(ProtocolError::Http)?;

        tracing::debug!(code, body = %body, "received response");

        Ok((code, body))
    }
}
