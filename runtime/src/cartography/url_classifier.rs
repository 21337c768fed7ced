//! Classify URLs by pattern into a page type.
//!
//! Two table strategies are supported:
//!
//! - **homepage + substring**: a homepage regex on the URL path is checked
//!   first; otherwise the first category with a substring contained in the
//!   URL wins.
//! - **regex table**: the first category with a regex that matches anywhere
//!   in the URL wins. Homepage patterns are just an early table entry.
//!
//! Matching is case-insensitive and table order is priority order.

use regex::{Regex, RegexBuilder};

/// One table entry: a category and its patterns.
#[derive(Debug, Clone)]
pub struct CategoryRule<P> {
    pub category: String,
    pub patterns: Vec<P>,
}

/// An ordered URL pattern table.
#[derive(Debug, Clone)]
pub enum UrlPatternTable {
    HomepageSubstring {
        homepage_label: String,
        homepage: Regex,
        rules: Vec<CategoryRule<String>>,
    },
    RegexTable {
        rules: Vec<CategoryRule<Regex>>,
    },
}

impl UrlPatternTable {
    /// Build a substring table. Patterns are lower-cased.
    pub fn homepage_substring(
        homepage_label: &str,
        homepage_pattern: &str,
        rules: Vec<(String, Vec<String>)>,
    ) -> Result<Self, regex::Error> {
        Ok(Self::HomepageSubstring {
            homepage_label: homepage_label.to_string(),
            homepage: case_insensitive(homepage_pattern)?,
            rules: rules
                .into_iter()
                .map(|(category, patterns)| CategoryRule {
                    category,
                    patterns: patterns.into_iter().map(|p| p.to_lowercase()).collect(),
                })
                .collect(),
        })
    }

    /// Build a regex table. Returns the failing `(category, pattern)` on error.
    pub fn regex_table(
        rules: Vec<(String, Vec<String>)>,
    ) -> Result<Self, (String, String, regex::Error)> {
        let mut compiled = Vec::with_capacity(rules.len());
        for (category, patterns) in rules {
            let mut regexes = Vec::with_capacity(patterns.len());
            for p in patterns {
                match case_insensitive(&p) {
                    Ok(re) => regexes.push(re),
                    Err(e) => return Err((category, p, e)),
                }
            }
            compiled.push(CategoryRule {
                category,
                patterns: regexes,
            });
        }
        Ok(Self::RegexTable { rules: compiled })
    }

    /// Category labels in table order.
    pub fn categories(&self) -> Vec<&str> {
        match self {
            Self::HomepageSubstring {
                homepage_label,
                rules,
                ..
            } => std::iter::once(homepage_label.as_str())
                .chain(rules.iter().map(|r| r.category.as_str()))
                .collect(),
            Self::RegexTable { rules } => rules.iter().map(|r| r.category.as_str()).collect(),
        }
    }
}

/// Classify a URL, or `None` when no rule matches.
pub fn classify_url<'a>(url: &str, table: &'a UrlPatternTable) -> Option<&'a str> {
    let url = url.trim().to_lowercase();

    match table {
        UrlPatternTable::HomepageSubstring {
            homepage_label,
            homepage,
            rules,
        } => {
            if homepage.is_match(extract_path(&url)) {
                return Some(homepage_label.as_str());
            }
            rules
                .iter()
                .find(|rule| rule.patterns.iter().any(|p| url.contains(p.as_str())))
                .map(|rule| rule.category.as_str())
        }
        UrlPatternTable::RegexTable { rules } => rules
            .iter()
            .find(|rule| rule.patterns.iter().any(|re| re.is_match(&url)))
            .map(|rule| rule.category.as_str()),
    }
}

/// Whether the URL is a site root or a language root (`/`, `/en/`, `/en-us/`).
pub fn is_homepage(url: &str, table: &UrlPatternTable) -> bool {
    match table {
        UrlPatternTable::HomepageSubstring { homepage, .. } => {
            homepage.is_match(extract_path(&url.trim().to_lowercase()))
        }
        UrlPatternTable::RegexTable { rules } => rules
            .first()
            .is_some_and(|r| r.patterns.iter().any(|re| re.is_match(&url.trim().to_lowercase()))),
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Path after the host, without query or fragment; `/` when the URL has no path.
fn extract_path(url: &str) -> &str {
    let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    else {
        return url;
    };
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    match rest.find('/') {
        Some(slash_pos) => &rest[slash_pos..],
        None => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOMEPAGE: &str = r"^/([a-z]{2,3}(?:-[a-z]{2,3})?)?/?$";

    fn substring_table() -> UrlPatternTable {
        UrlPatternTable::homepage_substring(
            "Startseite",
            HOMEPAGE,
            vec![
                ("Produktdetailseite".into(), vec!["produkt".into(), "Item".into()]),
                ("Kategorieseite".into(), vec!["shop".into(), "kategorie".into()]),
                ("Blog/Artikel".into(), vec!["blog".into()]),
            ],
        )
        .unwrap()
    }

    fn regex_table() -> UrlPatternTable {
        UrlPatternTable::regex_table(vec![
            (
                "Homepage".into(),
                vec![r"^https?://[^/]+/?$".into(), r"^https?://[^/]+/[a-z]{2,3}(-[a-z]{2,3})?/?$".into()],
            ),
            ("Product".into(), vec![r"/products?/[^/]+".into()]),
            ("Category".into(), vec![r"/shop(/|$)".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn test_homepage_detection() {
        let table = substring_table();
        assert_eq!(classify_url("https://example.com/", &table), Some("Startseite"));
        assert_eq!(classify_url("https://example.com", &table), Some("Startseite"));
        assert_eq!(classify_url("https://example.com/en/", &table), Some("Startseite"));
        assert_eq!(classify_url("https://example.com/en-us/", &table), Some("Startseite"));
        assert_eq!(classify_url("https://example.com/DE", &table), Some("Startseite"));
        assert!(!is_homepage("https://example.com/en/about", &table));
        assert!(is_homepage("https://example.com?utm=1", &table));
        assert!(is_homepage("https://example.com/?utm=1", &table));
        assert!(is_homepage("https://example.com/de/#top", &table));
        assert!(!is_homepage("https://example.com/kontakt?ref=/", &table));
        assert_eq!(classify_url("https://example.com/en/about", &table), None);
    }

    #[test]
    fn test_substring_first_rule_wins() {
        let table = substring_table();
        // Host contains "shop", path contains "produkt": the earlier rule wins.
        assert_eq!(
            classify_url("https://shop.example/produkt/widget-123", &table),
            Some("Produktdetailseite")
        );
        assert_eq!(
            classify_url("https://example.com/Kategorie/garten", &table),
            Some("Kategorieseite")
        );
        assert_eq!(
            classify_url("https://example.com/ITEM/5", &table),
            Some("Produktdetailseite")
        );
    }

    #[test]
    fn test_regex_table() {
        let table = regex_table();
        assert_eq!(classify_url("https://example.com/", &table), Some("Homepage"));
        assert_eq!(classify_url("https://example.com/fr-ch/", &table), Some("Homepage"));
        assert!(is_homepage("https://example.com/en/", &table));
        assert!(!is_homepage("https://example.com/en/about", &table));
        assert_eq!(
            classify_url("https://example.com/Products/widget", &table),
            Some("Product")
        );
        // Partial match: "/shop/products/x" matches both; table order decides.
        assert_eq!(
            classify_url("https://example.com/shop/products/x", &table),
            Some("Product")
        );
        assert_eq!(classify_url("https://example.com/shop", &table), Some("Category"));
        assert_eq!(classify_url("https://example.com/en/about", &table), None);
    }

    #[test]
    fn test_deterministic() {
        let table = substring_table();
        let url = "https://shop.example/blog/produkt";
        let first = classify_url(url, &table);
        for _ in 0..5 {
            assert_eq!(classify_url(url, &table), first);
        }
        assert_eq!(first, Some("Produktdetailseite"));
    }

    #[test]
    fn test_invalid_regex_reports_rule() {
        let err = UrlPatternTable::regex_table(vec![("Broken".into(), vec!["(".into()])]).unwrap_err();
        assert_eq!(err.0, "Broken");
        assert_eq!(err.1, "(");
    }

    #[test]
    fn test_categories_in_order() {
        assert_eq!(
            substring_table().categories(),
            vec!["Startseite", "Produktdetailseite", "Kategorieseite", "Blog/Artikel"]
        );
    }
}
