//! Rule sets: every table the cascade consults, loaded as data.
//!
//! Built-in rule sets are embedded JSON (`de`, `en`). A path to a JSON file
//! with the same shape can be given instead, so new languages or keyword
//! sets need no code changes.

use super::markup_classifier::MarkupTypeMap;
use super::url_classifier::UrlPatternTable;
use crate::error::RuleError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

const DE_RULES_JSON: &str = include_str!("rules/de.json");
const EN_RULES_JSON: &str = include_str!("rules/en.json");

/// Names of the embedded rule sets.
pub const BUILTIN_RULE_SETS: &[&str] = &["de", "en"];

/// Default rule set name.
pub const DEFAULT_RULE_SET: &str = "de";

// ── File format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RuleFile {
    name: String,
    #[serde(default = "default_error_label")]
    error_label: String,
    markup_types: HashMap<String, String>,
    url_patterns: PatternFile,
    categories: Vec<String>,
    content_relevant: Vec<String>,
    subtypes: SubtypeFile,
    prompts: PromptTemplates,
    #[serde(default)]
    field_labels: FieldLabels,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
enum PatternFile {
    HomepageSubstring {
        homepage_label: String,
        homepage_pattern: String,
        rules: Vec<RuleEntry>,
    },
    RegexTable {
        rules: Vec<RuleEntry>,
    },
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    category: String,
    patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SubtypeFile {
    vocabulary: Vec<String>,
    fallback: String,
    #[serde(default)]
    direct: HashMap<String, String>,
}

fn default_error_label() -> String {
    "Fehler".to_string()
}

// ── Compiled rule set ───────────────────────────────────────────────────────

/// System prompt templates. `{categories}` and `{subtypes}` are replaced by
/// the comma-separated vocabularies.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptTemplates {
    pub classify: String,
    pub subtype: String,
}

/// Field names used in the oracle's user message.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldLabels {
    pub url: String,
    pub title: String,
    pub description: String,
    pub structured_data: String,
    pub excerpt: String,
    pub category: String,
}

impl Default for FieldLabels {
    fn default() -> Self {
        Self {
            url: "URL".into(),
            title: "Title".into(),
            description: "Description".into(),
            structured_data: "Structured data".into(),
            excerpt: "Body (excerpt)".into(),
            category: "Page type".into(),
        }
    }
}

/// Subtype vocabulary plus the direct category → subtype mapping.
#[derive(Debug, Clone)]
pub struct SubtypeRules {
    pub vocabulary: Vec<String>,
    /// Used when the oracle answers with an empty subtype.
    pub fallback: String,
    pub direct: HashMap<String, String>,
}

/// All tables for one classification run. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub name: String,
    /// Prefix of the category field in error records.
    pub error_label: String,
    pub markup: MarkupTypeMap,
    pub url_patterns: UrlPatternTable,
    /// Closed vocabulary offered to the oracle.
    pub categories: Vec<String>,
    /// Categories that receive a subtype.
    pub content_relevant: Vec<String>,
    pub subtypes: SubtypeRules,
    pub prompts: PromptTemplates,
    pub field_labels: FieldLabels,
}

impl RuleSet {
    /// Load a built-in rule set by name, or a JSON file by path.
    pub fn load(name_or_path: &str) -> Result<Self, RuleError> {
        match name_or_path {
            "de" => Self::from_json(DE_RULES_JSON),
            "en" => Self::from_json(EN_RULES_JSON),
            other if Path::new(other).is_file() => Self::from_file(Path::new(other)),
            other => Err(RuleError::UnknownRuleSet(other.to_string())),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, RuleError> {
        let json = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let file: RuleFile = serde_json::from_str(json)?;
        Self::compile(file)
    }

    fn compile(file: RuleFile) -> Result<Self, RuleError> {
        let url_patterns = match file.url_patterns {
            PatternFile::HomepageSubstring {
                homepage_label,
                homepage_pattern,
                rules,
            } => UrlPatternTable::homepage_substring(
                &homepage_label,
                &homepage_pattern,
                rules.into_iter().map(|r| (r.category, r.patterns)).collect(),
            )
            .map_err(|source| RuleError::Pattern {
                category: homepage_label.clone(),
                pattern: homepage_pattern.clone(),
                source,
            })?,
            PatternFile::RegexTable { rules } => UrlPatternTable::regex_table(
                rules.into_iter().map(|r| (r.category, r.patterns)).collect(),
            )
            .map_err(|(category, pattern, source)| RuleError::Pattern {
                category,
                pattern,
                source,
            })?,
        };

        for category in file.subtypes.direct.keys() {
            if !file.content_relevant.contains(category) {
                tracing::warn!(
                    rule_set = %file.name,
                    %category,
                    "direct subtype mapping for a category outside the content-relevant set is ignored"
                );
            }
        }

        Ok(Self {
            name: file.name,
            error_label: file.error_label,
            markup: MarkupTypeMap::new(file.markup_types),
            url_patterns,
            categories: file.categories,
            content_relevant: file.content_relevant,
            subtypes: SubtypeRules {
                vocabulary: file.subtypes.vocabulary,
                fallback: file.subtypes.fallback,
                direct: file.subtypes.direct,
            },
            prompts: file.prompts,
            field_labels: file.field_labels,
        })
    }

    /// The default German rule set, parsed once.
    pub fn default_rules() -> &'static RuleSet {
        static DEFAULT: OnceLock<RuleSet> = OnceLock::new();
        DEFAULT.get_or_init(|| {
            Self::from_json(DE_RULES_JSON).expect("embedded de.json rule set is valid")
        })
    }

    pub fn is_content_relevant(&self, category: &str) -> bool {
        self.content_relevant.iter().any(|c| c == category)
    }

    /// Fixed subtype for a content-relevant category, if one is mapped.
    pub fn direct_subtype(&self, category: &str) -> Option<&str> {
        if !self.is_content_relevant(category) {
            return None;
        }
        self.subtypes.direct.get(category).map(String::as_str)
    }

    /// System prompt for main-category classification.
    pub fn classify_prompt(&self) -> String {
        self.prompts
            .classify
            .replace("{categories}", &self.categories.join(", "))
    }

    /// System prompt for subtype refinement.
    pub fn subtype_prompt(&self) -> String {
        self.prompts
            .subtype
            .replace("{subtypes}", &self.subtypes.vocabulary.join(", "))
    }
}
