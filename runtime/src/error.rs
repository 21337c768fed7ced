//! Error taxonomy for discovery, fetching, rendering, and oracle calls.

use thiserror::Error;

/// Page fetch failures.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("request failed: {0}")]
    Network(String),
}

impl FetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            return Self::Timeout(timeout_secs);
        }
        if let Some(status) = err.status() {
            return Self::Status {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            };
        }
        Self::Network(err.to_string())
    }
}

/// Screenshot capture failures.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render timed out after {0}s")]
    Timeout(u64),

    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("capture failed: {0}")]
    Capture(String),
}

/// Classification oracle failures.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle disabled (offline mode)")]
    Disabled,

    #[error("oracle request failed: {0}")]
    Network(String),

    #[error("oracle API error: {0}")]
    Api(String),

    #[error("malformed oracle response: {0}")]
    Parse(String),

    #[error("oracle returned an empty label")]
    EmptyReply,
}

/// Sitemap discovery failures. Collected in the discovery report, never fatal.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("sitemap {url} unreachable: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("sitemap {url} malformed: {reason}")]
    Malformed { url: String, reason: String },
}

/// URL source resolution failures that stop the pipeline before classification.
#[derive(Debug, Error)]
pub enum UrlSourceError {
    #[error("no URLs to classify")]
    Empty,

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse table: {0}")]
    Table(#[from] csv::Error),
}

/// Rule set loading failures.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unknown built-in rule set: {0}")]
    UnknownRuleSet(String),

    #[error("invalid rule file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid pattern {pattern:?} for {category}: {source}")]
    Pattern {
        category: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Any failure inside the per-URL cascade.
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("screenshot failed: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}
