// src/resource/http.rs
// =============================================================================
// This module downloads a single resource over HTTP.
//
// Key functionality:
// - Makes one HTTP GET request with a per-request timeout
// - Honors the crawl-wide cancellation token while the request is in flight
// - Treats anything other than 200 OK as a failure
// - Reduces the Content-Type header to its bare MIME type
//
// Nothing here retries. A failed URL is reported to the caller, which logs it
// and moves on.
//
// Rust concepts:
// - async/await: For network I/O
// - tokio::select!: Race the request against cancellation
// - thiserror: Typed error enums with readable messages
// =============================================================================

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

// Every way a single download can fail
//
// All variants carry the URL so a log line or report entry is self-contained.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("failed to download {url}: status code {status}")]
    Status { url: String, status: StatusCode },

    #[error("request to {url} was cancelled")]
    Cancelled { url: String },
}

// A downloaded body plus its MIME type
//
// Lives only for one fetch -> rewrite -> save cycle.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub body: Vec<u8>,
    /// Content-Type without parameters, e.g. "text/html"
    pub mime_type: String,
}

impl FetchedResource {
    pub fn is_html(&self) -> bool {
        self.mime_type == "text/html"
    }
}

// HTTP fetcher shared by all workers
//
// reqwest::Client is reference counted internally, so cloning the fetcher
// shares one connection pool across every task.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Builds a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("site-mirror/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, timeout })
    }

    /// Downloads `url`, giving up early if `cancel` fires.
    pub async fn fetch(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<FetchedResource, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled { url: url.to_string() }),
            result = self.download(url) => result,
        }
    }

    async fn download(&self, url: &Url) -> Result<FetchedResource, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.categorize_error(url, e))?;

        // Only an exact 200 counts. 204, 206 and friends are skipped too.
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let mime_type = mime_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );

        let body = response
            .bytes()
            .await
            .map_err(|e| self.categorize_error(url, e))?;

        Ok(FetchedResource {
            body: body.to_vec(),
            mime_type,
        })
    }

    // Splits timeouts out from other transport errors so the log says why
    fn categorize_error(&self, url: &Url, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

// Reduces a Content-Type header value to its MIME type
//
// Example:
//   "text/html; charset=utf-8" -> "text/html"
//   missing header             -> ""
pub fn mime_type(content_type: Option<&str>) -> String {
    content_type
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().to_ascii_lowercase())
        .unwrap_or_default()
}
