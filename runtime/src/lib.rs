//! Page-type classification for lists of URLs.
//!
//! Each URL is fetched once and classified by the first signal that decides:
//! structured data types, then URL patterns, then a classification oracle fed
//! with the page text and an optional screenshot. Content pages additionally
//! receive a subtype. URLs come from a list, a CSV table, or a sitemap tree.

pub mod acquisition;
pub mod cartography;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod intelligence;
pub mod renderer;

pub use acquisition::url_source::{CandidateUrl, UrlSource};
pub use cartography::page_classifier::{PageClassifier, PageRecord, Signal};
pub use cartography::rules::RuleSet;
pub use config::{RunConfig, ScreenshotPolicy, SubtypePolicy};
