use std::collections::BTreeSet;

use serde::Serialize;

use super::NoteId;

/// A persisted note with its parsed title, tags, and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    /// Identifier relative to the data directory.
    pub id: NoteId,
    /// Normalized title.
    pub title: String,
    /// Normalized tag set.
    pub tags: BTreeSet<String>,
    /// Free text from the `[CONTENT]` section.
    pub body: String,
}

impl Note {
    pub fn id(&self) -> &NoteId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the tags joined with `", "`, in sorted order.
    pub fn tag_line(&self) -> String {
        self.tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Note {
        Note {
            id: NoteId::new("20240301", "shopping_list"),
            title: "shopping_list".to_string(),
            tags: ["home", "errands"].iter().map(|t| t.to_string()).collect(),
            body: "milk\neggs\n".to_string(),
        }
    }

    #[test]
    fn tag_line_is_sorted() {
        assert_eq!(sample().tag_line(), "errands, home");
    }

    #[test]
    fn note_serializes_tags_as_array() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["id"], "20240301/shopping_list.md");
        assert_eq!(json["tags"], serde_json::json!(["errands", "home"]));
    }
}
