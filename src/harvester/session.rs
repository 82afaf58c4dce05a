//! Per-source HTTP fetch session
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients carrying a source's full header profile
//! - A fixed politeness delay between requests to the same host
//! - Retry with exponential backoff for transient failures
//! - Classification of deliberate blocking, which is never retried

use crate::config::{HeaderProfile, IngestConfig, SourceConfig};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Errors surfaced by a fetch session
///
/// `Blocked` is deliberately distinct from the transient variants: it means
/// the remote signalled access denial (403/429) and the caller should
/// escalate to a fallback access method instead of hammering the source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("source blocked request to {url} (HTTP {status})")]
    Blocked { url: String, status: u16 },

    #[error("transient failure fetching {url} after {attempts} attempts: {message}")]
    Exhausted {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("HTTP {status} fetching {url}")]
    Http { url: String, status: u16 },

    #[error("request error fetching {url}: {message}")]
    Request { url: String, message: String },
}

impl FetchError {
    /// Whether this failure is a deliberate denial rather than bad luck
    pub fn is_blocked(&self) -> bool {
        matches!(self, FetchError::Blocked { .. })
    }
}

/// One persistent connection context for one source
///
/// Holds the reqwest client (connection pooling, cookies-free), the header
/// profile, and the politeness clock. All page and feed fetches for a source
/// go through its session, so the inter-request delay is enforced no matter
/// which access method is driving.
pub struct FetchSession {
    client: Client,
    delay: Duration,
    max_retries: u32,
    backoff: Duration,
    last_request: Option<Instant>,
}

impl FetchSession {
    /// Creates a session for one source
    ///
    /// # Arguments
    ///
    /// * `source` - The source whose header profile and delay override apply
    /// * `ingest` - Global ingestion settings (delay, retries, backoff)
    pub fn new(source: &SourceConfig, ingest: &IngestConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&source.headers)?;
        let delay_ms = source.request_delay_ms.unwrap_or(ingest.request_delay_ms);

        Ok(Self {
            client,
            delay: Duration::from_millis(delay_ms),
            max_retries: ingest.max_retries,
            backoff: Duration::from_millis(ingest.retry_backoff_ms),
            last_request: None,
        })
    }

    /// Fetches a URL, returning the response body
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 403 / 429 | Immediate `Blocked`, no retry |
    /// | HTTP 5xx | Retry with backoff, then `Exhausted` |
    /// | Timeout / connect error | Retry with backoff, then `Exhausted` |
    /// | Other HTTP error | Immediate `Http` |
    /// | Other request error | Immediate `Request` |
    pub async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            self.respect_delay().await;
            attempt += 1;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                        return Err(FetchError::Blocked {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }

                    if status.is_server_error() {
                        if attempt > self.max_retries {
                            return Err(FetchError::Exhausted {
                                url: url.to_string(),
                                attempts: attempt,
                                message: format!("HTTP {}", status.as_u16()),
                            });
                        }
                        self.backoff_sleep(attempt).await;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(FetchError::Http {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }

                    match response.text().await {
                        Ok(body) => return Ok(body),
                        Err(e) => {
                            if attempt > self.max_retries {
                                return Err(FetchError::Exhausted {
                                    url: url.to_string(),
                                    attempts: attempt,
                                    message: e.to_string(),
                                });
                            }
                            self.backoff_sleep(attempt).await;
                        }
                    }
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    if attempt > self.max_retries {
                        return Err(FetchError::Exhausted {
                            url: url.to_string(),
                            attempts: attempt,
                            message: e.to_string(),
                        });
                    }
                    tracing::debug!("Transient error fetching {} (attempt {}): {}", url, attempt, e);
                    self.backoff_sleep(attempt).await;
                }
                Err(e) => {
                    return Err(FetchError::Request {
                        url: url.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    /// Sleeps until the politeness delay since the last request has passed
    async fn respect_delay(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                tokio::time::sleep(self.delay - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// Exponential backoff: base * 2^(attempt-1)
    async fn backoff_sleep(&self, attempt: u32) {
        let factor = 1u32 << (attempt - 1).min(5);
        tokio::time::sleep(self.backoff * factor).await;
    }
}

/// Builds an HTTP client carrying a source's header profile
///
/// Sources reject requests lacking a complete, internally consistent header
/// set, so everything configured in the profile is sent as default headers
/// on every request.
pub fn build_http_client(profile: &HeaderProfile) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();

    let mut push = |name: &str, value: &str| {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        } else {
            tracing::warn!("Skipping invalid header '{}'", name);
        }
    };

    if let Some(accept) = &profile.accept {
        push("accept", accept);
    }
    if let Some(language) = &profile.accept_language {
        push("accept-language", language);
    }
    if let Some(encoding) = &profile.accept_encoding {
        push("accept-encoding", encoding);
    }
    if let Some(referer) = &profile.referer {
        push("referer", referer);
    }
    if let Some(cache_control) = &profile.cache_control {
        push("cache-control", cache_control);
    }
    for (name, value) in &profile.extra {
        push(name, value);
    }

    Client::builder()
        .user_agent(profile.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}
