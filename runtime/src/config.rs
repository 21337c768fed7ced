//! Run configuration: fixed limits plus environment and CLI overrides.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Network fetch timeout for pages and sitemaps.
pub const FETCH_TIMEOUT_SECS: u64 = 15;

/// Screenshot capture timeout.
pub const RENDER_TIMEOUT_SECS: u64 = 60;

/// Maximum characters of main text handed to the oracle.
pub const EXCERPT_MAX_CHARS: usize = 1000;

/// Below this many excerpt characters a page counts as text-sparse.
pub const SPARSE_TEXT_THRESHOLD: usize = 200;

/// Browser-identifying header sent with every fetch.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_OUTPUT: &str = "seitentyp-analyse.csv";

/// When to attach a rendered screenshot to the oracle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotPolicy {
    /// Text signals only.
    #[default]
    Never,
    /// Every oracle call carries a screenshot.
    Always,
    /// Only pages whose text excerpt is shorter than [`SPARSE_TEXT_THRESHOLD`].
    Sparse,
}

impl ScreenshotPolicy {
    pub fn wants_capture(self, excerpt: &str) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::Sparse => excerpt.chars().count() < SPARSE_TEXT_THRESHOLD,
        }
    }
}

/// How content-relevant categories receive their subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SubtypePolicy {
    /// Single-level classification, no subtype column.
    Disabled,
    /// Every content-relevant category is refined by the oracle.
    Oracle,
    /// Directly mapped categories skip the oracle; the rest use it.
    #[default]
    Direct,
}

impl SubtypePolicy {
    pub fn is_enabled(self) -> bool {
        self != Self::Disabled
    }
}

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    pub excerpt_max_chars: usize,
    pub user_agent: String,
    pub model: String,
    pub api_base: String,
    /// Credential for the oracle, scoped to this run.
    pub api_key: Option<String>,
    pub screenshot: ScreenshotPolicy,
    pub subtypes: SubtypePolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            render_timeout: Duration::from_secs(RENDER_TIMEOUT_SECS),
            excerpt_max_chars: EXCERPT_MAX_CHARS,
            user_agent: USER_AGENT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            screenshot: ScreenshotPolicy::default(),
            subtypes: SubtypePolicy::default(),
        }
    }
}

impl RunConfig {
    /// Defaults overlaid with `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `PAGETYPE_MODEL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                config.api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(base) = std::env::var("OPENAI_BASE_URL") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("PAGETYPE_MODEL") {
            config.model = model;
        }
        config
    }
}
