//! Page-type classification: rule sets, the markup and URL-pattern
//! classifiers, and the per-URL cascade.

pub mod markup_classifier;
pub mod page_classifier;
pub mod rules;
pub mod url_classifier;
