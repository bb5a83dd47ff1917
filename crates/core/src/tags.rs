//! Tag collection editing.
//!
//! A prompt's tags are stored as one ordered JSON list and always rewritten
//! whole; these helpers produce the new collection for the repository to
//! persist.

use serde::{Deserialize, Serialize};

/// A display tag attached to a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTag {
    pub name: String,
    pub color: String,
}

/// Add a tag, or update the color of an existing tag with the same name.
/// Existing tags keep their position; new tags append.
pub fn upsert_tag(tags: &mut Vec<PromptTag>, tag: PromptTag) {
    match tags.iter_mut().find(|t| t.name == tag.name) {
        Some(existing) => existing.color = tag.color,
        None => tags.push(tag),
    }
}

/// Remove a tag by name. Returns `true` if a tag was removed; removing an
/// absent name leaves the list unchanged and is not an error.
pub fn remove_tag(tags: &mut Vec<PromptTag>, name: &str) -> bool {
    let before = tags.len();
    tags.retain(|t| t.name != name);
    tags.len() < before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, color: &str) -> PromptTag {
        PromptTag {
            name: name.into(),
            color: color.into(),
        }
    }

    #[test]
    fn upsert_appends_new_tag() {
        let mut tags = vec![tag("draft", "#999")];
        upsert_tag(&mut tags, tag("ready", "#0f0"));
        assert_eq!(tags, vec![tag("draft", "#999"), tag("ready", "#0f0")]);
    }

    #[test]
    fn upsert_updates_color_in_place() {
        let mut tags = vec![tag("draft", "#999"), tag("ready", "#0f0")];
        upsert_tag(&mut tags, tag("draft", "#f00"));
        assert_eq!(tags, vec![tag("draft", "#f00"), tag("ready", "#0f0")]);
    }

    #[test]
    fn remove_deletes_by_name() {
        let mut tags = vec![tag("draft", "#999"), tag("ready", "#0f0")];
        assert!(remove_tag(&mut tags, "draft"));
        assert_eq!(tags, vec![tag("ready", "#0f0")]);
    }

    #[test]
    fn remove_missing_name_is_a_noop() {
        let mut tags = vec![tag("draft", "#999")];
        assert!(!remove_tag(&mut tags, "missing"));
        assert_eq!(tags, vec![tag("draft", "#999")]);
    }
}
