use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Request};
use std::time::Duration;

use crate::error::{AdapterError, Result};
use crate::models::{Headers, RequestDescriptor, RequestPayload, TransportResponse};

/// Performs the network call for an authentication attempt
///
/// Yields exactly one response or one error per call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, url: &str, request: RequestDescriptor) -> Result<TransportResponse>;
}

/// Upper bound for a single backoff delay (milliseconds)
const MAX_BACKOFF_MS: u64 = 30_000;

/// reqwest-backed transport with optional retry logic
pub struct ReqwestTransport {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Maximum number of retries
    max_retries: u32,

    /// Base delay for exponential backoff (milliseconds)
    base_delay_ms: u64,
}

impl ReqwestTransport {
    /// Create a new transport
    pub fn new(
        max_connections: usize,
        connect_timeout: u64,
        request_timeout: u64,
        max_retries: u32,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(max_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_retries,
            base_delay_ms: 1000, // 1 second base delay
        })
    }

    /// Wrap an existing client, without retries
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            max_retries: 0,
            base_delay_ms: 1000,
        }
    }

    /// Override the backoff base delay
    pub fn with_base_delay(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Translate a request descriptor into a reqwest request
    fn build_request(&self, url: &str, descriptor: RequestDescriptor) -> Result<Request> {
        let method = Method::from_bytes(descriptor.method.as_bytes()).map_err(|_| {
            AdapterError::ConfigError(format!("Invalid HTTP method: {}", descriptor.method))
        })?;

        let mut builder = self.client.request(method, url);

        for (name, value) in &descriptor.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AdapterError::ConfigError(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AdapterError::ConfigError(format!("Invalid value for header '{}': {}", name, e)))?;
            builder = builder.header(name, value);
        }

        match &descriptor.query {
            // Raw query strings are appended once the URL is final
            None | Some(RequestPayload::Raw(_)) => {}
            Some(payload) => match payload.to_query_params() {
                Some(pairs) => builder = builder.query(pairs.pairs()),
                None => {
                    return Err(AdapterError::ConfigError(
                        "GET payload must be query pairs or a JSON object".to_string(),
                    ))
                }
            },
        }

        let has_content_type = descriptor.header(CONTENT_TYPE.as_str()).is_some();
        if let Some(body) = descriptor.body {
            builder = match body {
                RequestPayload::Query(pairs) => {
                    let builder = if has_content_type {
                        builder
                    } else {
                        builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    };
                    builder.body(pairs.to_query_string())
                }
                RequestPayload::Json(value) => {
                    if has_content_type {
                        builder.body(value.to_string())
                    } else {
                        builder.json(&value)
                    }
                }
                RequestPayload::Raw(raw) => builder.body(raw),
            };
        }

        // Environment overrides arrive as strings
        let timeout = descriptor
            .options
            .get("timeout")
            .and_then(|v| v.as_f64().or_else(|| v.as_str()?.trim().parse().ok()));
        if let Some(timeout) = timeout {
            if timeout > 0.0 {
                builder = builder.timeout(Duration::from_secs_f64(timeout));
            }
        }

        let mut request = builder
            .build()
            .map_err(|e| AdapterError::ConfigError(format!("Invalid request: {}", e)))?;

        if let Some(RequestPayload::Raw(raw)) = &descriptor.query {
            let raw = raw.trim_start_matches('?');
            if !raw.is_empty() {
                let url = request.url_mut();
                let combined = match url.query() {
                    Some(existing) if !existing.is_empty() => format!("{}&{}", existing, raw),
                    _ => raw.to_string(),
                };
                url.set_query(Some(&combined));
            }
        }

        Ok(request)
    }

    /// Execute a request, retrying 429/5xx responses and network errors
    async fn execute(&self, request: Request) -> Result<TransportResponse> {
        let max_retries = self.max_retries;
        let mut attempt = 0;

        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!(
            method = %method,
            url = %url,
            "Sending HTTP request"
        );

        loop {
            // Clone the request for this attempt
            let req = request.try_clone().ok_or_else(|| {
                AdapterError::Internal(anyhow::anyhow!("Request body is not cloneable"))
            })?;

            tracing::debug!(
                attempt = attempt + 1,
                max_retries = max_retries,
                "Executing request attempt"
            );

            match self.client.execute(req).await {
                Ok(response) => {
                    let status = response.status();

                    tracing::debug!(
                        status = %status,
                        "Received HTTP response"
                    );

                    if status.is_success() {
                        let headers = collect_headers(response.headers());
                        let body = response.bytes().await.map_err(|e| AdapterError::Transport {
                            kind: "body_error".to_string(),
                            message: e.to_string(),
                        })?;
                        return Ok(TransportResponse::new(status.as_u16(), headers, body));
                    }

                    // 429 or 5xx: Exponential backoff
                    if matches!(status.as_u16(), 429 | 500..=599) && attempt < max_retries {
                        let delay = self.calculate_backoff_delay(attempt);
                        tracing::warn!(
                            "Received {}, retrying after {}ms (attempt {}/{})",
                            status,
                            delay,
                            attempt + 1,
                            max_retries
                        );

                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        attempt += 1;
                        continue;
                    }

                    // Non-retryable error or max retries exceeded
                    let error_text = response.text().await.unwrap_or_default();

                    tracing::warn!(
                        status = status.as_u16(),
                        url = %url,
                        response_body = %error_text,
                        attempt = attempt + 1,
                        "HTTP request failed with error response"
                    );
                    return Err(AdapterError::HttpStatus {
                        status: status.as_u16(),
                        message: error_text,
                    });
                }

                Err(e) => {
                    let error_kind = categorize(&e);

                    tracing::warn!(
                        error_kind = error_kind,
                        error = %e,
                        url = %url,
                        attempt = attempt + 1,
                        "HTTP request error"
                    );

                    // Network error - retry with backoff
                    if attempt < max_retries {
                        let delay = self.calculate_backoff_delay(attempt);
                        tracing::warn!(
                            "Request failed: {}, retrying after {}ms (attempt {}/{})",
                            e,
                            delay,
                            attempt + 1,
                            max_retries
                        );

                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        attempt += 1;
                        continue;
                    }

                    tracing::error!(
                        error_kind = error_kind,
                        error = %e,
                        url = %url,
                        total_attempts = attempt + 1,
                        "HTTP request failed after all retries"
                    );

                    return Err(AdapterError::Transport {
                        kind: error_kind.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    /// Calculate exponential backoff delay
    fn calculate_backoff_delay(&self, attempt: u32) -> u64 {
        // base_delay * 2^attempt plus up to 10% jitter, capped
        let delay = 2_u64
            .checked_pow(attempt)
            .and_then(|factor| self.base_delay_ms.checked_mul(factor))
            .unwrap_or(MAX_BACKOFF_MS)
            .min(MAX_BACKOFF_MS);
        let jitter = (delay as f64 * 0.1 * jitter_fraction()) as u64;
        delay + jitter
    }

    /// Get the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, url: &str, request: RequestDescriptor) -> Result<TransportResponse> {
        let request = self.build_request(url, request)?;
        self.execute(request).await
    }
}

/// Categorize a reqwest error for logs and results
fn categorize(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection_failed"
    } else if e.is_request() {
        "request_error"
    } else if e.is_body() {
        "body_error"
    } else if e.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> Headers {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// Fraction in [0, 1) drawn from a v4 UUID
fn jitter_fraction() -> f64 {
    (uuid::Uuid::new_v4().as_u128() % 1000) as f64 / 1000.0
}
