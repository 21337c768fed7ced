//! `pagetype classify`: run the cascade over a URL list and export the results.

use crate::acquisition::http_client::{Fetcher, HttpClient};
use crate::acquisition::url_source::{self, UrlSource};
use crate::cartography::page_classifier::{PageClassifier, PageRecord};
use crate::cartography::rules::RuleSet;
use crate::cli::export;
use crate::cli::output::{self, Styled};
use crate::cli::progress;
use crate::config::{RunConfig, ScreenshotPolicy};
use crate::intelligence::oracle::{DisabledOracle, OpenAiOracle, Oracle};
use crate::renderer::{ChromiumRenderer, Renderer};
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Options for one classify run.
#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    pub rules: String,
    pub output: PathBuf,
    /// Run without an oracle; undecided URLs become error records.
    pub offline: bool,
    pub config: RunConfig,
}

/// Run the classify command.
pub async fn run(source: UrlSource, opts: ClassifyOptions) -> Result<()> {
    let s = Styled::new();
    let start = Instant::now();
    let chatty = !output::is_quiet() && !output::is_json();

    let rules = Arc::new(
        RuleSet::load(&opts.rules).with_context(|| format!("failed to load rule set {}", opts.rules))?,
    );

    let oracle: Arc<dyn Oracle> = if opts.offline {
        Arc::new(DisabledOracle)
    } else {
        match OpenAiOracle::from_config(&opts.config) {
            Some(oracle) => Arc::new(oracle),
            None => bail!("no API key: set OPENAI_API_KEY, pass --api-key, or use --offline"),
        }
    };

    let fetcher: Arc<dyn Fetcher> =
        Arc::new(HttpClient::from_config(&opts.config).context("failed to build HTTP client")?);

    if chatty {
        output::print_header(&s);
    }

    let spinner = progress::create_spinner("Resolving URLs", chatty);
    let resolved = url_source::resolve(&source, fetcher.as_ref()).await;
    spinner.finish_and_clear();
    let resolved = resolved.context("no URLs to classify")?;

    if !output::is_quiet() {
        for err in &resolved.discovery_errors {
            eprintln!("  {} {err}", s.warn_sym());
        }
    }

    let renderer: Option<Arc<dyn Renderer>> =
        if opts.config.screenshot != ScreenshotPolicy::Never && !opts.offline {
            Some(Arc::new(ChromiumRenderer::new(
                opts.config.render_timeout,
                opts.config.user_agent.clone(),
            )))
        } else {
            None
        };

    let mut classifier = PageClassifier::new(fetcher, oracle, rules.clone(), &opts.config);
    if let Some(renderer) = &renderer {
        classifier = classifier.with_renderer(renderer.clone());
    }

    let total = resolved.candidates.len();
    let bar = progress::create_batch_progress(total, chatty);
    let records = classifier
        .classify_all(&resolved.candidates, |record| {
            bar.set_message(record.url.clone());
            bar.inc(1);
            if output::is_verbose() {
                bar.println(format!("  {}", record_line(&s, record)));
            }
        })
        .await?;
    bar.finish_and_clear();

    if let Some(renderer) = renderer {
        renderer.shutdown().await;
    }

    let with_subtype = opts.config.subtypes.is_enabled();
    export::write_csv_file(&opts.output, &records, with_subtype)?;

    if output::is_json() {
        output::print_json(&export::records_json(&records));
        return Ok(());
    }
    if !output::is_quiet() {
        print_summary(&s, &records, &opts.output, start.elapsed().as_secs());
    }
    Ok(())
}

fn record_line(s: &Styled, record: &PageRecord) -> String {
    if record.is_error() {
        return format!("{} {}  {}", s.fail_sym(), record.url, s.red(&record.category));
    }
    let subtype = if record.subtype.is_empty() {
        String::new()
    } else {
        format!(" / {}", record.subtype)
    };
    format!(
        "{} {}  {}{}",
        s.ok_sym(),
        record.url,
        s.cyan(&record.category),
        s.dim(&subtype)
    )
}

fn print_summary(s: &Styled, records: &[PageRecord], path: &std::path::Path, secs: u64) {
    let failed = records.iter().filter(|r| r.is_error()).count();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records.iter().filter(|r| !r.is_error()) {
        *counts.entry(record.category.as_str()).or_default() += 1;
    }
    let mut counts: Vec<(&str, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    eprintln!(
        "  {} Classified {} URLs in {}",
        s.ok_sym(),
        records.len(),
        output::format_duration(secs)
    );
    if failed > 0 {
        eprintln!("  {} {failed} failed", s.warn_sym());
    }
    eprintln!();
    for (category, count) in counts.iter().take(10) {
        eprintln!("    {:<32} {:>6}", category, count);
    }
    eprintln!();
    eprintln!("  Results written to {}", s.bold(&path.display().to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_line_plain() {
        std::env::set_var("NO_COLOR", "1");
        let s = Styled::new();
        let ok = PageRecord {
            url: "https://example.com/".into(),
            category: "Startseite".into(),
            subtype: String::new(),
            error: None,
            signal: None,
        };
        assert_eq!(record_line(&s, &ok), "OK https://example.com/  Startseite");

        let failed = PageRecord {
            url: "https://example.com/x".into(),
            category: "Fehler: boom".into(),
            subtype: String::new(),
            error: Some("boom".into()),
            signal: None,
        };
        assert_eq!(record_line(&s, &failed), "!! https://example.com/x  Fehler: boom");
    }
}
