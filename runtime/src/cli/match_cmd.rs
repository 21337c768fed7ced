//! `pagetype match`: URL-pattern classification only, no network.

use crate::cartography::rules::RuleSet;
use crate::cartography::url_classifier::classify_url;
use crate::cli::output::{self, Styled};
use anyhow::{Context, Result};

/// Run the match command.
pub fn run(urls: &[String], rules: &str) -> Result<()> {
    let s = Styled::new();
    let rules = RuleSet::load(rules).with_context(|| format!("failed to load rule set {rules}"))?;
    let matches = match_all(urls, &rules);

    if output::is_json() {
        let rows: Vec<_> = matches
            .iter()
            .map(|(url, category)| serde_json::json!({ "url": url, "category": category }))
            .collect();
        output::print_json(&serde_json::Value::Array(rows));
        return Ok(());
    }

    for (url, category) in &matches {
        match category {
            Some(category) => println!("{} {url}\t{}", s.ok_sym(), s.cyan(category)),
            None => println!("{} {url}\t{}", s.info_sym(), s.dim("no match")),
        }
    }
    Ok(())
}

fn match_all<'a>(urls: &'a [String], rules: &'a RuleSet) -> Vec<(&'a str, Option<&'a str>)> {
    urls.iter()
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .map(|url| (url, classify_url(url, &rules.url_patterns)))
        .collect()
}
