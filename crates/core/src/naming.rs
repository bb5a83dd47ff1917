//! Public identifier formatting for prompts and versions.
//!
//! Rows carry plain integers (`prompts.seq`, `prompt_versions.version`);
//! the API boundary renders and parses the `prompt{n}` / `v{n}` labels.
//! Number assignment itself happens inside the INSERT statements (see the
//! repositories), never by formatting here.

use crate::types::DbId;

/// Render a prompt's public identifier, e.g. `prompt3`.
pub fn prompt_public_id(seq: DbId) -> String {
    format!("prompt{seq}")
}

/// Parse a public prompt identifier back to its per-user sequence number.
pub fn parse_prompt_id(id: &str) -> Option<DbId> {
    let n: DbId = id.strip_prefix("prompt")?.parse().ok()?;
    (n > 0).then_some(n)
}

/// Render a version label, e.g. `v2`.
pub fn version_label(version: i32) -> String {
    format!("v{version}")
}

/// Parse a version label back to its number.
pub fn parse_version_label(label: &str) -> Option<i32> {
    let n: i32 = label.strip_prefix('v')?.parse().ok()?;
    (n > 0).then_some(n)
}
