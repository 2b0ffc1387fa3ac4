//! HTTP client wrapper with rate limiting

use crate::error::{Error, Result};
use governor::{Quota, RateLimiter};
use reqwest::header::HeaderMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Rate limiter for a specific registry
pub type RegistryRateLimiter = Arc<
    RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
>;

/// HTTP client wrapper for making registry and API requests with rate limiting
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    rate_limiter: Option<RegistryRateLimiter>,
}

impl HttpClient {
    fn build_client() -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .user_agent(format!("heft/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?)
    }

    /// Create a new HTTP client with default configuration (no rate limiting)
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Self::build_client()?,
            rate_limiter: None,
        })
    }

    /// Create a new HTTP client with rate limiting
    ///
    /// # Arguments
    ///
    /// * `requests_per_second` - Maximum requests per second (0 is treated as 1)
    pub fn with_rate_limit(requests_per_second: u32) -> Result<Self> {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(rate)));

        Ok(Self {
            client: Self::build_client()?,
            rate_limiter: Some(rate_limiter),
        })
    }

    /// Wait for rate limiter if enabled
    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    async fn check(response: reqwest::Response, url: &str) -> Result<reqwest::Response> {
        // Handle rate limiting (HTTP 429)
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimitExceeded(url.to_string()));
        }

        if !response.status().is_success() {
            return Err(Error::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    /// Make a GET request and deserialize JSON response
    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json_with_headers(url, HeaderMap::new()).await
    }

    /// Make a GET request with custom headers and deserialize JSON response
    pub async fn get_json_with_headers<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<T> {
        self.wait_for_rate_limit().await;

        let response = self.client.get(url).headers(headers).send().await?;
        let response = Self::check(response, url).await?;

        Ok(response.json().await?)
    }

    /// Make a POST request with a JSON body and deserialize JSON response
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        self.wait_for_rate_limit().await;

        let response = self.client.post(url).json(body).send().await?;
        let response = Self::check(response, url).await?;

        Ok(response.json().await?)
    }
}
