//! Sitemap discovery.
//!
//! Fetches a sitemap, follows sitemap indexes depth-first, and collects page
//! URLs in document order. Sitemaps already visited are skipped, so cyclic
//! or repeated references terminate. A sitemap that cannot be fetched or
//! parsed is recorded in the report and discovery carries on with the rest.

use super::http_client::Fetcher;
use crate::error::DiscoveryError;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Marker that distinguishes a sitemap index from a leaf urlset.
const INDEX_MARKER: &str = "<sitemapindex";

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapNode {
    /// Child sitemap URLs.
    Index(Vec<String>),
    /// Page URLs.
    Leaf(Vec<String>),
}

/// Include/exclude directory substrings applied after collection.
#[derive(Debug, Clone, Default)]
pub struct DirectoryFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl DirectoryFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        let clean = |v: Vec<String>| {
            v.into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            include: clean(include),
            exclude: clean(exclude),
        }
    }

    /// Drop URLs containing any exclude substring, then keep only URLs
    /// containing at least one include substring (all, if none are given).
    pub fn apply(&self, urls: Vec<String>) -> Vec<String> {
        urls.into_iter()
            .filter(|url| !self.exclude.iter().any(|ex| url.contains(ex.as_str())))
            .filter(|url| {
                self.include.is_empty() || self.include.iter().any(|inc| url.contains(inc.as_str()))
            })
            .collect()
    }
}

/// Outcome of sitemap discovery.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Page URLs after de-duplication and filtering, in discovery order.
    pub urls: Vec<String>,
    /// Sitemaps that failed along the way.
    pub errors: Vec<DiscoveryError>,
    /// Number of sitemap documents fetched successfully.
    pub sitemaps_visited: usize,
}

/// Resolve `root` and all nested sitemaps into a filtered page URL list.
pub async fn discover(
    root: &str,
    fetcher: &dyn Fetcher,
    filter: &DirectoryFilter,
) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();
    let mut visited: HashSet<String> = HashSet::new();
    let mut seen_pages: HashSet<String> = HashSet::new();
    let mut pages = Vec::new();
    let mut stack = vec![root.trim().to_string()];

    while let Some(sitemap_url) = stack.pop() {
        if !visited.insert(sitemap_url.clone()) {
            debug!(url = %sitemap_url, "sitemap already visited, skipping");
            continue;
        }

        let resp = match fetcher.get(&sitemap_url).await {
            Ok(resp) => resp,
            Err(source) => {
                warn!(url = %sitemap_url, error = %source, "sitemap fetch failed");
                report.errors.push(DiscoveryError::Unreachable {
                    url: sitemap_url,
                    source,
                });
                continue;
            }
        };

        match parse_sitemap(&resp.body) {
            Ok(SitemapNode::Index(children)) => {
                report.sitemaps_visited += 1;
                debug!(url = %sitemap_url, children = children.len(), "sitemap index");
                // Reverse so children are visited in document order.
                for child in children.into_iter().rev() {
                    let child = resolve_loc(&resp.final_url, child);
                    if !visited.contains(&child) {
                        stack.push(child);
                    }
                }
            }
            Ok(SitemapNode::Leaf(urls)) => {
                report.sitemaps_visited += 1;
                debug!(url = %sitemap_url, pages = urls.len(), "sitemap urlset");
                for url in urls {
                    let url = resolve_loc(&resp.final_url, url);
                    if seen_pages.insert(url.clone()) {
                        pages.push(url);
                    }
                }
            }
            Err(reason) => {
                warn!(url = %sitemap_url, %reason, "sitemap malformed");
                report.errors.push(DiscoveryError::Malformed {
                    url: sitemap_url,
                    reason,
                });
            }
        }
    }

    let total = pages.len();
    report.urls = filter.apply(pages);
    info!(
        sitemaps = report.sitemaps_visited,
        found = total,
        kept = report.urls.len(),
        failed = report.errors.len(),
        "sitemap discovery finished"
    );
    report
}

/// Parse a sitemap or sitemap index, returning every `<loc>` value.
pub fn parse_sitemap(xml: &str) -> Result<SitemapNode, String> {
    let locs = extract_locs(xml)?;
    if xml.contains(INDEX_MARKER) {
        Ok(SitemapNode::Index(locs))
    } else {
        Ok(SitemapNode::Leaf(locs))
    }
}

/// Resolve a relative `<loc>` against the sitemap's own URL.
fn resolve_loc(base: &str, loc: String) -> String {
    if loc.starts_with("http://") || loc.starts_with("https://") {
        return loc;
    }
    match url::Url::parse(base).and_then(|b| b.join(&loc)) {
        Ok(abs) => abs.to_string(),
        Err(_) => loc,
    }
}

fn extract_locs(xml: &str) -> Result<Vec<String>, String> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut locs = Vec::new();
    let mut in_loc = false;
    let mut current = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"loc" => {
                in_loc = true;
                current.clear();
            }
            Ok(Event::Text(ref e)) if in_loc => {
                let text = e.unescape().map_err(|err| err.to_string())?;
                current.push_str(&text);
            }
            Ok(Event::CData(e)) if in_loc => {
                current.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"loc" => {
                in_loc = false;
                let loc = current.trim();
                if !loc.is_empty() {
                    locs.push(loc.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {e}",
                    reader.error_position()
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(locs)
}
