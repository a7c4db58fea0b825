use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use tokio::sync::Mutex;
use tokio::time::Instant;

use catalog_core::CatalogError;
use catalog_logging::{catalog_debug, catalog_trace};

use crate::decode::decode_body;
use crate::{FailureKind, FetchError, FetchedPage};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            user_agent: concat!("catalog-sampler/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Plain HTTP GET. Implementations report transport failures only; the status
/// code is the caller's business.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<FetchedPage, FetchError>;
}

/// Appends `query` pairs to `url`.
pub fn build_url(url: &str, query: &[(&str, &str)]) -> Result<Url, FetchError> {
    let mut parsed = Url::parse(url)
        .map_err(|err| FetchError::new(FailureKind::InvalidUrl, format!("{url}: {err}")))?;
    if !query.is_empty() {
        parsed.query_pairs_mut().extend_pairs(query.iter().copied());
    }
    Ok(parsed)
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, settings })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<FetchedPage, FetchError> {
        let target = build_url(url, query)?;
        catalog_debug!("GET {}", target);

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        catalog_trace!("{} -> {} ({} bytes)", final_url, status, bytes.len());
        Ok(FetchedPage {
            status,
            body: decode_body(&bytes, content_type.as_deref()),
            final_url,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

/// Fixed-delay throttle: a call starts no sooner than `1 / requests_per_second`
/// after the previous call started. Idle time earns no credit.
#[derive(Debug)]
pub struct RateLimitedFetcher<F> {
    inner: F,
    min_interval: Duration,
    last_issued: Mutex<Option<Instant>>,
}

impl<F: Fetcher> RateLimitedFetcher<F> {
    pub fn new(inner: F, requests_per_second: f64) -> Result<Self, CatalogError> {
        if !(requests_per_second.is_finite() && requests_per_second > 0.0) {
            return Err(CatalogError::InvalidConfig(format!(
                "requests per second must be positive, got {requests_per_second}"
            )));
        }
        Ok(Self::with_interval(
            inner,
            Duration::from_secs_f64(1.0 / requests_per_second),
        ))
    }

    pub fn with_interval(inner: F, min_interval: Duration) -> Self {
        Self {
            inner,
            min_interval,
            last_issued: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<F: Fetcher> Fetcher for RateLimitedFetcher<F> {
    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<FetchedPage, FetchError> {
        {
            // Held across the sleep so concurrent callers queue up behind it.
            let mut last = self.last_issued.lock().await;
            if let Some(previous) = *last {
                let ready_at = previous + self.min_interval;
                if ready_at > Instant::now() {
                    catalog_trace!("throttling {} until slot opens", url);
                    tokio::time::sleep_until(ready_at).await;
                }
            }
            *last = Some(Instant::now());
        }
        self.inner.fetch(url, query).await
    }
}
