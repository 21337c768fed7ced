//! Per-URL classification cascade.
//!
//! For each candidate: fetch, extract structured data, then take the first
//! decision of markup → URL pattern → oracle. Content-relevant categories are
//! refined with a subtype. Any failure along the way becomes an error record
//! for that URL and the batch moves on.

use crate::acquisition::http_client::Fetcher;
use crate::acquisition::structured_data;
use crate::acquisition::url_source::CandidateUrl;
use crate::cartography::markup_classifier::classify_markup;
use crate::cartography::rules::RuleSet;
use crate::cartography::url_classifier::classify_url;
use crate::config::{RunConfig, ScreenshotPolicy, SubtypePolicy};
use crate::error::{CascadeError, OracleError, UrlSourceError};
use crate::extraction::content::{self, PageContent};
use crate::intelligence::oracle::Oracle;
use crate::intelligence::prompts::{user_message, PageEvidence};
use crate::intelligence::subtype;
use crate::renderer::Renderer;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which cascade stage decided the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Markup,
    Pattern,
    Oracle,
}

/// The result for one URL. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    /// Final URL after redirects; the input URL when the cascade failed.
    pub url: String,
    pub category: String,
    pub subtype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<Signal>,
}

impl PageRecord {
    fn failed(url: &str, error_label: &str, err: &CascadeError) -> Self {
        let description = err.to_string();
        Self {
            url: url.to_string(),
            category: format!("{error_label}: {description}"),
            subtype: String::new(),
            error: Some(description),
            signal: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

struct Decision {
    url: String,
    category: String,
    subtype: String,
    signal: Signal,
}

/// Runs the cascade over candidate URLs, one at a time.
pub struct PageClassifier {
    fetcher: Arc<dyn Fetcher>,
    renderer: Option<Arc<dyn Renderer>>,
    oracle: Arc<dyn Oracle>,
    rules: Arc<RuleSet>,
    screenshot: ScreenshotPolicy,
    subtypes: SubtypePolicy,
    excerpt_max_chars: usize,
}

impl PageClassifier {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        oracle: Arc<dyn Oracle>,
        rules: Arc<RuleSet>,
        config: &RunConfig,
    ) -> Self {
        Self {
            fetcher,
            renderer: None,
            oracle,
            rules,
            screenshot: config.screenshot,
            subtypes: config.subtypes,
            excerpt_max_chars: config.excerpt_max_chars,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn subtype_policy(&self) -> SubtypePolicy {
        self.subtypes
    }

    /// Classify every candidate in order. `on_record` sees each record as it
    /// is produced.
    pub async fn classify_all(
        &self,
        candidates: &[CandidateUrl],
        mut on_record: impl FnMut(&PageRecord),
    ) -> Result<Vec<PageRecord>, UrlSourceError> {
        if candidates.is_empty() {
            return Err(UrlSourceError::Empty);
        }

        let mut records = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let record = self.classify(candidate).await;
            on_record(&record);
            records.push(record);
        }

        let failed = records.iter().filter(|r| r.is_error()).count();
        info!(total = records.len(), failed, "classification finished");
        Ok(records)
    }

    /// Classify one URL. Never fails: errors become an error record.
    pub async fn classify(&self, candidate: &CandidateUrl) -> PageRecord {
        debug!(position = candidate.position, url = %candidate.url, "classifying");

        match self.run_cascade(&candidate.url).await {
            Ok(decision) => {
                info!(
                    url = %decision.url,
                    category = %decision.category,
                    subtype = %decision.subtype,
                    signal = ?decision.signal,
                    "classified"
                );
                PageRecord {
                    url: decision.url,
                    category: decision.category,
                    subtype: decision.subtype,
                    error: None,
                    signal: Some(decision.signal),
                }
            }
            Err(e) => {
                warn!(url = %candidate.url, error = %e, "classification failed");
                PageRecord::failed(&candidate.url, &self.rules.error_label, &e)
            }
        }
    }

    async fn run_cascade(&self, url: &str) -> Result<Decision, CascadeError> {
        let page = self.fetcher.get(url).await?;
        let final_url = page.final_url.as_str();
        debug!(url, final_url, status = page.status, "fetched");

        let bundle = structured_data::parse(&page.body, final_url);
        let mut page_content: Option<PageContent> = None;

        let (category, signal) = if let Some(label) = classify_markup(&bundle, &self.rules.markup) {
            debug!(final_url, category = label, "markup decision");
            (label.to_string(), Signal::Markup)
        } else if let Some(label) = classify_url(final_url, &self.rules.url_patterns) {
            debug!(final_url, category = label, "pattern decision");
            (label.to_string(), Signal::Pattern)
        } else {
            debug!(final_url, "no markup or pattern decision, asking oracle");
            let extracted = content::extract(&page.body, self.excerpt_max_chars);
            let image = self.capture_if_wanted(final_url, &extracted.excerpt).await?;
            let evidence = PageEvidence {
                url: final_url,
                content: &extracted,
                structured_data: &bundle,
            };
            let reply = self
                .oracle
                .classify(
                    &self.rules.classify_prompt(),
                    &user_message(&evidence, &self.rules),
                    image.as_deref(),
                )
                .await?;
            if reply.is_empty() {
                return Err(OracleError::EmptyReply.into());
            }
            page_content = Some(extracted);
            (reply, Signal::Oracle)
        };

        let extracted = page_content
            .unwrap_or_else(|| content::extract(&page.body, self.excerpt_max_chars));
        let evidence = PageEvidence {
            url: final_url,
            content: &extracted,
            structured_data: &bundle,
        };
        let subtype = subtype::refine(
            &category,
            &evidence,
            &self.rules,
            self.subtypes,
            self.oracle.as_ref(),
        )
        .await?
        .into_label();

        Ok(Decision {
            url: page.final_url.clone(),
            category,
            subtype,
            signal,
        })
    }

    async fn capture_if_wanted(
        &self,
        url: &str,
        excerpt: &str,
    ) -> Result<Option<Vec<u8>>, CascadeError> {
        if !self.screenshot.wants_capture(excerpt) {
            return Ok(None);
        }
        let Some(renderer) = &self.renderer else {
            debug!(url, "screenshot wanted but no renderer configured");
            return Ok(None);
        };
        Ok(Some(renderer.screenshot(url).await?))
    }
}
