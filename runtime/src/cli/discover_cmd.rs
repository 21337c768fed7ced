//! `pagetype discover`: list the page URLs a sitemap tree yields.

use crate::acquisition::http_client::HttpClient;
use crate::acquisition::sitemap::{self, DirectoryFilter};
use crate::cli::output::{self, Styled};
use crate::cli::progress;
use crate::config::RunConfig;
use anyhow::{Context, Result};

/// Run the discover command. Page URLs go to stdout, one per line.
pub async fn run(root: &str, filter: DirectoryFilter, config: &RunConfig) -> Result<()> {
    let s = Styled::new();
    let fetcher = HttpClient::from_config(config).context("failed to build HTTP client")?;

    let spinner = progress::create_spinner(
        &format!("Reading {root}"),
        !output::is_quiet() && !output::is_json(),
    );
    let report = sitemap::discover(root, &fetcher, &filter).await;
    spinner.finish_and_clear();

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "root": root,
            "sitemaps": report.sitemaps_visited,
            "urls": report.urls,
            "errors": report.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    for url in &report.urls {
        println!("{url}");
    }

    if !output::is_quiet() {
        for err in &report.errors {
            eprintln!("  {} {err}", s.warn_sym());
        }
        eprintln!(
            "  {} {} URLs from {} sitemaps",
            if report.urls.is_empty() { s.fail_sym() } else { s.ok_sym() },
            report.urls.len(),
            report.sitemaps_visited
        );
    }
    Ok(())
}
