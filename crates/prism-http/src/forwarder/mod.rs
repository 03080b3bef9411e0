//! Forwarding to a live server.
//!
//! The target is the request's base URL, or the operation's first declared
//! server with its variables set to their defaults. Path, query, headers and
//! body are copied from the incoming request; `Host` and `Content-Length`
//! are left to the client.

mod client;

pub use client::{create_http_client, DEFAULT_UPSTREAM_TIMEOUT};

use crate::config::HttpConfig;
use crate::errors::{FORWARDING_ERROR, NO_BASE_URL_ERROR};
use crate::headers::Headers;
use crate::negotiator::media_type::is_json;
use crate::router::resolve_server_url;
use crate::types::{HttpOperation, HttpQuery, HttpRequest, HttpResponse};
use async_trait::async_trait;
use prism_core::{CancellationToken, Forwarder, PrismInput, ProblemDetail, REQUEST_CANCELLED};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

/// `User-Agent` sent when the caller supplies none.
pub fn default_user_agent() -> String {
    format!("Prism/{}", env!("CARGO_PKG_VERSION"))
}

/// Forwarder backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl Default for HttpForwarder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpForwarder {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_UPSTREAM_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: create_http_client(timeout),
        }
    }

    fn build_request(
        &self,
        url: &str,
        request: &HttpRequest,
        config: &HttpConfig,
    ) -> Result<reqwest::RequestBuilder, ProblemDetail> {
        let method = reqwest::Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|_| {
                ProblemDetail::from_template(
                    &FORWARDING_ERROR,
                    format!("Unsupported method '{}'", request.method),
                )
            })?;

        let mut builder = self.client.request(method, url);
        if let Some(timeout) = config.upstream_timeout() {
            builder = builder.timeout(timeout);
        }

        // Copy headers (excluding host)
        let mut has_user_agent = false;
        let mut has_content_type = false;
        if let Some(headers) = &request.headers {
            for (name, value) in headers.iter() {
                let lower = name.to_ascii_lowercase();
                if lower == "host" || lower == "content-length" {
                    continue;
                }
                has_user_agent |= lower == "user-agent";
                has_content_type |= lower == "content-type";
                for value in value.values() {
                    builder = builder.header(name, value);
                }
            }
        }
        if !has_user_agent {
            builder = builder.header("User-Agent", default_user_agent());
        }

        match &request.body {
            None => {}
            Some(Value::String(text)) => builder = builder.body(text.clone()),
            Some(body) => {
                if !has_content_type {
                    builder = builder.header("Content-Type", "application/json");
                }
                builder = builder.body(body.to_string());
            }
        }

        Ok(builder)
    }
}

#[async_trait]
impl Forwarder<HttpOperation, HttpRequest, HttpResponse, HttpConfig> for HttpForwarder {
    async fn forward(
        &self,
        operation: Option<&HttpOperation>,
        input: &PrismInput<HttpRequest>,
        config: &HttpConfig,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, ProblemDetail> {
        let request = &input.data;
        let base_url = target_base_url(operation, request)?;
        let url = build_url(&base_url, &request.url.path, request.url.query.as_ref());
        debug!("Forwarding to: {}", url);

        let builder = self.build_request(&url, request, config)?;

        let response = tokio::select! {
            result = builder.send() => result.map_err(|e| forwarding_error(&url, e))?,
            _ = cancel.cancelled() => {
                warn!("Forwarding to {} cancelled", url);
                return Err(ProblemDetail::from_template(&REQUEST_CANCELLED, ""));
            }
        };

        let status_code = response.status().as_u16();
        let headers = collect_headers(response.headers());

        let text = tokio::select! {
            result = response.text() => result.map_err(|e| forwarding_error(&url, e))?,
            _ = cancel.cancelled() => {
                return Err(ProblemDetail::from_template(&REQUEST_CANCELLED, ""));
            }
        };

        debug!(status = status_code, "Upstream responded");
        let body = parse_body(headers.get_str("content-type"), text);
        Ok(HttpResponse {
            status_code,
            headers,
            body,
        })
    }
}

fn forwarding_error(url: &str, error: reqwest::Error) -> ProblemDetail {
    error!("Failed to forward request to {}: {}", url, error);
    ProblemDetail::from_template(&FORWARDING_ERROR, error.to_string())
}

/// The request's base URL, else the operation's first server.
fn target_base_url(
    operation: Option<&HttpOperation>,
    request: &HttpRequest,
) -> Result<String, ProblemDetail> {
    if let Some(base_url) = &request.url.base_url {
        return Ok(base_url.trim_end_matches('/').to_string());
    }
    operation
        .and_then(|operation| operation.servers.first())
        .map(resolve_server_url)
        .ok_or_else(|| {
            ProblemDetail::from_template(
                &NO_BASE_URL_ERROR,
                "No base url to forward the request to. Set the request base url or declare a server for the operation.",
            )
        })
}

fn build_url(base_url: &str, path: &str, query: Option<&HttpQuery>) -> String {
    let mut url = format!("{base_url}{path}");
    let pairs: Vec<String> = query
        .into_iter()
        .flatten()
        .flat_map(|(name, value)| {
            value.values().into_iter().map(move |value| {
                format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
            })
        })
        .collect();
    if !pairs.is_empty() {
        url.push('?');
        url.push_str(&pairs.join("&"));
    }
    url
}

/// Upstream headers, repeated names kept. Non-ASCII bytes are decoded lossily.
fn collect_headers(upstream: &reqwest::header::HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in upstream {
        headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }
    headers
}

/// JSON bodies are parsed; anything else stays text. An empty body is none.
fn parse_body(content_type: Option<&str>, text: String) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    if content_type.is_some_and(is_json) {
        if let Ok(value) = serde_json::from_str(&text) {
            return Some(value);
        }
    }
    Some(Value::String(text))
}
