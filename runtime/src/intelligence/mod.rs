//! Oracle-backed classification: prompts, the oracle client, and subtype refinement.

pub mod oracle;
pub mod prompts;
pub mod subtype;
