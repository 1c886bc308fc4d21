use crate::error::TransferError;
use crate::models::TransferUnit;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER, USER_AGENT};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;

/// User agents to rotate through for image requests
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";

/// Raw image as retrieved from the host
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Retrieves page images from the reader's image host
#[allow(async_fn_in_trait)]
pub trait ImageFetcher {
    async fn fetch_image(&self, url: &str, referer: Option<&str>) -> Result<FetchedImage, TransferError>;
}

/// The local service pages are delivered to
#[allow(async_fn_in_trait)]
pub trait PageStore {
    /// Liveness check; true only for a 200 within the liveness timeout
    async fn ping(&self) -> bool;

    /// Deliver one page; anything but a 200 is a failure
    async fn save_page(&self, unit: &TransferUnit) -> Result<(), TransferError>;
}

/// Configuration for the bridge HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub server_url: String,
    pub save_url: String,
    pub liveness_timeout: Duration,
    /// Overall per-request timeout; `None` leaves requests unbounded
    pub request_timeout: Option<Duration>,
    pub enable_cookies: bool,
    pub enable_gzip: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let config = crate::config::Config::default();
        Self::from(&config)
    }
}

impl From<&crate::config::Config> for HttpClientConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            server_url: config.server_url.clone(),
            save_url: config.save_url(),
            liveness_timeout: config.liveness_timeout(),
            request_timeout: config.request_timeout(),
            enable_cookies: true,
            enable_gzip: true,
        }
    }
}

/// HTTP side of the bridge: image host retrieval plus the page store
pub struct BridgeClient {
    client: Client,
    config: HttpClientConfig,
}

impl BridgeClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = ClientBuilder::new()
            .cookie_store(config.enable_cookies)
            .gzip(config.enable_gzip)
            .brotli(true)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        builder = builder.default_headers(headers);

        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Get a random user agent from the pool
    fn random_user_agent() -> &'static str {
        let mut rng = rand::thread_rng();
        let index = rng.gen_range(0..USER_AGENTS.len());
        USER_AGENTS[index]
    }

    fn image_headers(referer: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(IMAGE_ACCEPT));
        headers.insert(USER_AGENT, HeaderValue::from_static(Self::random_user_agent()));
        if let Some(value) = referer.and_then(|r| HeaderValue::from_str(r).ok()) {
            headers.insert(REFERER, value);
        }
        headers
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

impl ImageFetcher for BridgeClient {
    async fn fetch_image(&self, url: &str, referer: Option<&str>) -> Result<FetchedImage, TransferError> {
        let fetch_err = |source| TransferError::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .headers(Self::image_headers(referer))
            .send()
            .await
            .map_err(fetch_err)?;

        if response.status() != StatusCode::OK {
            return Err(TransferError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response.bytes().await.map_err(fetch_err)?;

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

impl PageStore for BridgeClient {
    async fn ping(&self) -> bool {
        let result = self
            .client
            .get(&self.config.server_url)
            .timeout(self.config.liveness_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                log::warn!("Page store answered liveness check with {}", response.status());
                false
            }
            Err(e) => {
                log::warn!("Page store liveness check failed: {}", e);
                false
            }
        }
    }

    async fn save_page(&self, unit: &TransferUnit) -> Result<(), TransferError> {
        let response = self
            .client
            .post(&self.config.save_url)
            .json(unit)
            .send()
            .await
            .map_err(TransferError::Save)?;

        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(TransferError::Rejected {
                status: response.status().as_u16(),
            })
        }
    }
}
