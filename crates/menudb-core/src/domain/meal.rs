//! Meals.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tag::Tag;

/// A meal, optionally part of a menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub menu_id: Option<String>,
    pub calories: Option<f64>,
    /// Author's rating; `None` when not rated.
    pub like: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub discarded: bool,
    pub tags: BTreeSet<Tag>,
}

impl Meal {
    /// Tag type of meal tags.
    pub const TAG_TYPE: &'static str = "meal";

    /// Create a live, unrated meal.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            author_id: author_id.into(),
            menu_id: None,
            calories: None,
            like: None,
            created_at: Utc::now(),
            discarded: false,
            tags: BTreeSet::new(),
        }
    }

    /// Add a meal tag.
    pub fn with_tag(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        self.tags.insert(Tag::new(key, value, author_id, Self::TAG_TYPE));
        self
    }
}
