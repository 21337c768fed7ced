//! Oracle messages: system prompts from the rule set, user message from page signals.

use crate::acquisition::structured_data::StructuredDataBundle;
use crate::cartography::rules::RuleSet;
use crate::extraction::content::PageContent;

/// Everything the oracle sees about one page.
#[derive(Debug, Clone)]
pub struct PageEvidence<'a> {
    pub url: &'a str,
    pub content: &'a PageContent,
    pub structured_data: &'a StructuredDataBundle,
}

/// The user message: one labelled line per signal.
pub fn user_message(evidence: &PageEvidence<'_>, rules: &RuleSet) -> String {
    let labels = &rules.field_labels;
    format!(
        "{}: {}\n{}: {}\n{}: {}\n{}: {}\n{}: {}\n",
        labels.url,
        evidence.url,
        labels.title,
        evidence.content.title,
        labels.description,
        evidence.content.description,
        labels.structured_data,
        evidence.structured_data.to_json(),
        labels.excerpt,
        evidence.content.excerpt,
    )
}

/// The subtype user message carries the decided category as well.
pub fn subtype_message(evidence: &PageEvidence<'_>, category: &str, rules: &RuleSet) -> String {
    format!(
        "{}{}: {}\n",
        user_message(evidence, rules),
        rules.field_labels.category,
        category
    )
}
