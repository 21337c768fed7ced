//! Resolve the three URL inputs into an ordered candidate list.

use super::http_client::Fetcher;
use super::sitemap::{self, DirectoryFilter};
use crate::error::{DiscoveryError, UrlSourceError};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// A URL queued for classification, with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateUrl {
    pub position: usize,
    pub url: String,
}

/// Where the URLs come from.
#[derive(Debug, Clone)]
pub enum UrlSource {
    /// Newline-separated URL block.
    Explicit(String),
    /// CSV file, URLs in the first column below the header row.
    Table(std::path::PathBuf),
    /// Sitemap root plus directory filters.
    Sitemap { root: String, filter: DirectoryFilter },
}

/// Resolved candidates plus any sitemap failures encountered on the way.
#[derive(Debug, Default)]
pub struct ResolvedUrls {
    pub candidates: Vec<CandidateUrl>,
    pub discovery_errors: Vec<DiscoveryError>,
}

/// Resolve a source into candidates. Fails with [`UrlSourceError::Empty`]
/// when nothing is left to classify.
pub async fn resolve(source: &UrlSource, fetcher: &dyn Fetcher) -> Result<ResolvedUrls, UrlSourceError> {
    let (urls, discovery_errors) = match source {
        UrlSource::Explicit(block) => (parse_url_block(block), Vec::new()),
        UrlSource::Table(path) => (read_url_table(path)?, Vec::new()),
        UrlSource::Sitemap { root, filter } => {
            let report = sitemap::discover(root, fetcher, filter).await;
            (report.urls, report.errors)
        }
    };

    let candidates = to_candidates(urls);
    if candidates.is_empty() {
        return Err(UrlSourceError::Empty);
    }
    Ok(ResolvedUrls {
        candidates,
        discovery_errors,
    })
}

/// Split a pasted block into URLs: trimmed, blank lines dropped.
pub fn parse_url_block(block: &str) -> Vec<String> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Read the first column of a CSV file, skipping the header row.
pub fn read_url_table(path: &Path) -> Result<Vec<String>, UrlSourceError> {
    let file = std::fs::File::open(path).map_err(|source| UrlSourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_url_table_from(file)
}

fn read_url_table_from<R: std::io::Read>(reader: R) -> Result<Vec<String>, UrlSourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut urls = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(first) = record.get(0) {
            let url = first.trim();
            if !url.is_empty() {
                urls.push(url.to_string());
            }
        }
    }
    Ok(urls)
}

/// Trim, drop empties, de-duplicate by exact string, and number in order.
pub fn to_candidates<I>(urls: I) -> Vec<CandidateUrl>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .filter(|u| seen.insert(u.clone()))
        .enumerate()
        .map(|(position, url)| CandidateUrl { position, url })
        .collect()
}
