//! Outbound network layer for the cache engine.
//!
//! The engine never surfaces non-2xx statuses as errors here: strategies
//! need to see redirect and error responses to decide cacheability, so a
//! `FetchResponse` is returned for every completed exchange and `Error` is
//! reserved for transport-level failures (refused, timed out, redirect cap,
//! oversized body).

pub mod url;

use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, canonicalize, same_origin};

use umbra_core::{EngineConfig, Error, StoredResponse};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "umbra/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "umbra/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&EngineConfig> for FetchConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// Response from a completed fetch, body fully read.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Whether the exchange ended in a 2xx status.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Convert into the engine's storable response shape.
    ///
    /// Header values that are not valid UTF-8 are dropped.
    pub fn to_stored(&self) -> StoredResponse {
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
            .collect();
        StoredResponse {
            status: self.status.as_u16(),
            content_type: self.content_type.clone(),
            headers,
            body: self.bytes.to_vec(),
        }
    }
}

/// The network as seen by the cache engine.
///
/// `fetch` issues the request verbatim; `fetch_uncached` asks intermediary
/// caches to revalidate, which install-time precaching uses so a fresh
/// deploy never precaches a stale copy of its own shell.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error>;
    async fn fetch_uncached(&self, url: &Url) -> Result<FetchResponse, Error>;
}

/// HTTP fetch client backing the `Network` trait in production.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn get(&self, url: &Url, bypass_cache: bool) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let mut request = self.http.get(url.as_str());
        if bypass_cache {
            request = request
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(format!("fetch {url} failed: {e}")))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response body: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} {} in {}ms ({} bytes)",
            url,
            final_url,
            status.as_u16(),
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse { url: url.clone(), final_url, status, content_type, bytes, headers, fetch_ms })
    }
}

#[async_trait::async_trait]
impl Network for FetchClient {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error> {
        self.get(url, false).await
    }

    async fn fetch_uncached(&self, url: &Url) -> Result<FetchResponse, Error> {
        self.get(url, true).await
    }
}
