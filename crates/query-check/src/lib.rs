//! Command-line validation of JSON query documents.
//!
//! The `query-check` binary reads a document from disk, validates it as one
//! operation against one catalogue entity and prints either the validated
//! structure or the structured rejection. Limits come from
//! [`settings::CheckSettings`], so deployments can tighten the depth and
//! node budgets without recompiling.

pub mod check_cli;
pub mod settings;
