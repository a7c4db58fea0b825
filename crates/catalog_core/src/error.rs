use thiserror::Error;

/// Every failure the sampler distinguishes. Structural variants always carry
/// the offending URL so a drifted page can be inspected by hand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("request to {url} timed out: {message}")]
    TransportTimeout { url: String, message: String },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("failed to get catalog: status {status}, url {url}")]
    CatalogFetch { url: String, status: u16 },
    #[error("{section}: page {page} request failed with {status}, url {url}")]
    SectionPage {
        section: String,
        page: u32,
        status: u16,
        url: String,
    },
    #[error("{section}: page {page} malformed, no listing container, url {url}")]
    MalformedSectionPage {
        section: String,
        page: u32,
        url: String,
    },
    #[error("contact request failed with {status}, url {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("matched contacts layout with missing {missing}: {url}")]
    MalformedLayoutB { url: String, missing: String },
    #[error("unknown contact page layout for {url}")]
    UnknownPageLayout { url: String },
    #[error("no company name on {url}")]
    MissingCompanyName { url: String },
    #[error("page search for {section} gave up after {fetches} fetches, stuck on [{lo}, {hi}]")]
    SearchDivergence {
        section: String,
        fetches: u32,
        lo: u32,
        hi: u32,
    },
    #[error("failed in all {attempts} sampling attempts, last error: {last_error}")]
    SamplingExhausted { attempts: u32, last_error: String },
    #[error("failed to write page count cache {path}: {message}")]
    CacheWrite { path: String, message: String },
    #[error("failed to write samples: {0}")]
    Output(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CatalogError {
    /// Timeouts are retried after a backoff and never charged to a retry budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CatalogError::TransportTimeout { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            CatalogError::TransportTimeout { url, .. }
            | CatalogError::Transport { url, .. }
            | CatalogError::CatalogFetch { url, .. }
            | CatalogError::SectionPage { url, .. }
            | CatalogError::MalformedSectionPage { url, .. }
            | CatalogError::HttpStatus { url, .. }
            | CatalogError::MalformedLayoutB { url, .. }
            | CatalogError::UnknownPageLayout { url }
            | CatalogError::MissingCompanyName { url } => Some(url),
            CatalogError::SearchDivergence { .. }
            | CatalogError::SamplingExhausted { .. }
            | CatalogError::CacheWrite { .. }
            | CatalogError::Output(_)
            | CatalogError::InvalidConfig(_) => None,
        }
    }
}
