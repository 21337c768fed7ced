//! Second-level refinement: content subtype for content-relevant categories.

use super::oracle::Oracle;
use super::prompts::{subtype_message, PageEvidence};
use crate::cartography::rules::RuleSet;
use crate::config::SubtypePolicy;
use crate::error::OracleError;
use tracing::debug;

/// Where a subtype came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtypeDecision {
    /// Category is outside the content-relevant set, or refinement is off.
    NotApplicable,
    /// Fixed mapping, no oracle call.
    Direct(String),
    /// Oracle reply, or the fallback label for an empty reply.
    Oracle(String),
}

impl SubtypeDecision {
    pub fn label(&self) -> &str {
        match self {
            Self::NotApplicable => "",
            Self::Direct(s) | Self::Oracle(s) => s,
        }
    }

    pub fn into_label(self) -> String {
        match self {
            Self::NotApplicable => String::new(),
            Self::Direct(s) | Self::Oracle(s) => s,
        }
    }
}

/// Decide the subtype for `category`. The oracle is only called when the
/// policy and rule set require it.
pub async fn refine(
    category: &str,
    evidence: &PageEvidence<'_>,
    rules: &RuleSet,
    policy: SubtypePolicy,
    oracle: &dyn Oracle,
) -> Result<SubtypeDecision, OracleError> {
    if !policy.is_enabled() || !rules.is_content_relevant(category) {
        return Ok(SubtypeDecision::NotApplicable);
    }

    if policy == SubtypePolicy::Direct {
        if let Some(fixed) = rules.direct_subtype(category) {
            debug!(category, subtype = fixed, "direct subtype mapping");
            return Ok(SubtypeDecision::Direct(fixed.to_string()));
        }
    }

    let reply = oracle
        .classify(
            &rules.subtype_prompt(),
            &subtype_message(evidence, category, rules),
            None,
        )
        .await?;

    if reply.is_empty() {
        debug!(category, fallback = %rules.subtypes.fallback, "empty subtype reply");
        return Ok(SubtypeDecision::Oracle(rules.subtypes.fallback.clone()));
    }
    Ok(SubtypeDecision::Oracle(reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::structured_data::StructuredDataBundle;
    use crate::extraction::content::PageContent;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Oracle for Scripted {
        async fn classify(&self, _: &str, _: &str, _: Option<&[u8]>) -> Result<String, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    async fn run(category: &str, policy: SubtypePolicy, oracle: &Scripted) -> SubtypeDecision {
        let content = PageContent::default();
        let bundle = StructuredDataBundle::default();
        let evidence = PageEvidence {
            url: "https://example.com/x",
            content: &content,
            structured_data: &bundle,
        };
        refine(category, &evidence, RuleSet::default_rules(), policy, oracle)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_not_content_relevant() {
        let oracle = Scripted::new("Kaufberatung");
        let decision = run("Kontaktseite", SubtypePolicy::Oracle, &oracle).await;
        assert_eq!(decision, SubtypeDecision::NotApplicable);
        assert_eq!(decision.label(), "");
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_policy() {
        let oracle = Scripted::new("Kaufberatung");
        let decision = run("Blog/Artikel", SubtypePolicy::Disabled, &oracle).await;
        assert_eq!(decision, SubtypeDecision::NotApplicable);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_direct_mapping_skips_oracle() {
        let oracle = Scripted::new("Kaufberatung");
        let decision = run("Produktdetailseite", SubtypePolicy::Direct, &oracle).await;
        assert_eq!(decision, SubtypeDecision::Direct("PLC-Produktseite".into()));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oracle_policy_ignores_direct_mapping() {
        let oracle = Scripted::new("Kaufberatung");
        let decision = run("Produktdetailseite", SubtypePolicy::Oracle, &oracle).await;
        assert_eq!(decision, SubtypeDecision::Oracle("Kaufberatung".into()));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unmapped_category_uses_oracle() {
        let oracle = Scripted::new("Listicle");
        let decision = run("Blog/Artikel", SubtypePolicy::Direct, &oracle).await;
        assert_eq!(decision.into_label(), "Listicle");
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back() {
        let oracle = Scripted::new("");
        let decision = run("Blog/Artikel", SubtypePolicy::Oracle, &oracle).await;
        assert_eq!(decision.label(), "Unklar");
    }
}
