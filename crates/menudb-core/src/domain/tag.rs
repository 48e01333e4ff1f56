//! Tags.

use serde::{Deserialize, Serialize};

/// A `(key, value, author)` triplet scoped to a tag type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key, e.g. `diet`.
    pub key: String,
    /// Tag value, e.g. `vegan`.
    pub value: String,
    /// Author of the tag.
    pub author_id: String,
    /// Namespace; one per entity type.
    #[serde(rename = "type")]
    pub tag_type: String,
}

impl Tag {
    /// Create a tag.
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        author_id: impl Into<String>,
        tag_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            author_id: author_id.into(),
            tag_type: tag_type.into(),
        }
    }
}
