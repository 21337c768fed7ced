//! CLI subcommand implementations for the pagetype binary.

pub mod classify_cmd;
pub mod discover_cmd;
pub mod export;
pub mod match_cmd;
pub mod output;
pub mod progress;
