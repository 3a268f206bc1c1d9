// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Minimal HTTP client for poking at servers a test started.
//!
//! ```text
//! http_get(url) ------------------> body
//!
//! send_request(Request {
//!     method, url, headers, body
//! }) ---> Response { status, headers, body }
//!
//! Any status is a Response; only transport failures are errors.
//! Global client: OnceLock, connection pool
//! ```

use bon::Builder;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{debug, trace};

use crate::error::{NetworkError, TestbedResult};

/// Shared client, built on first use.
fn global_client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .user_agent(format!("testbed-rs/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// An HTTP request.
///
/// # Example
///
/// ```
/// use testbed_rs::http::Request;
///
/// let request = Request::builder()
///     .method("POST")
///     .url("http://127.0.0.1:8080/echo")
///     .body("Hello World!")
///     .build();
/// assert_eq!(request.method, "POST");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct Request {
    /// HTTP method, e.g. `GET` or `POST`
    #[builder(into, default = "GET".to_string())]
    pub method: String,
    /// Absolute URL
    #[builder(into)]
    pub url: String,
    /// Request headers
    #[builder(default)]
    pub headers: BTreeMap<String, String>,
    /// Request body
    #[builder(into)]
    pub body: Option<String>,
}

impl Request {
    /// A `GET` request for `url` with no headers.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::builder().url(url).build()
    }
}

/// An HTTP response, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: u16,
    /// Response headers, names lowercased; repeated headers are joined with `, `
    pub headers: BTreeMap<String, String>,
    /// Body decoded as text
    pub body: String,
}

impl Response {
    /// `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, 200..=299)
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Sends a `GET` to `url` and returns the body.
///
/// # Errors
///
/// Returns `NetworkError::Request` if the request cannot be sent or the
/// body cannot be read. Non-2xx statuses are not errors.
pub async fn http_get(url: impl Into<String>) -> TestbedResult<String> {
    Ok(send_request(Request::get(url)).await?.body)
}

/// Sends `request` and returns the response.
///
/// # Errors
///
/// - `NetworkError::InvalidMethod` if `method` is not a valid token.
/// - `NetworkError::Request` on connection, header or body failures.
pub async fn send_request(request: Request) -> TestbedResult<Response> {
    let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| NetworkError::InvalidMethod(request.method.clone()))?;
    debug!(method = %method, url = %request.url, "http request");

    let mut builder = global_client().request(method, &request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = request.body {
        builder = builder.body(body);
    }

    let to_error = |source: reqwest::Error| NetworkError::Request {
        url: request.url.clone(),
        source,
    };

    let response = builder.send().await.map_err(to_error)?;
    let status = response.status().as_u16();

    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in response.headers() {
        let value = String::from_utf8_lossy(value.as_bytes());
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }

    let body = response.text().await.map_err(to_error)?;
    trace!(status, bytes = body.len(), "http response");

    Ok(Response {
        status,
        headers,
        body,
    })
}
