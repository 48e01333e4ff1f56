//! Recipes.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tag::Tag;

/// Recipe visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Private,
    Public,
}

impl Privacy {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Private => "private",
            Privacy::Public => "public",
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Privacy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Privacy::Private),
            "public" => Ok(Privacy::Public),
            other => Err(format!("unknown privacy '{other}'")),
        }
    }
}

/// A recipe, optionally attached to a meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub meal_id: Option<String>,
    /// Preparation time in minutes.
    pub total_time: Option<i64>,
    pub calories: Option<f64>,
    pub privacy: Privacy,
    pub average_taste_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub discarded: bool,
    pub tags: BTreeSet<Tag>,
}

impl Recipe {
    /// Tag type of recipe tags.
    pub const TAG_TYPE: &'static str = "recipe";

    /// Create a live private recipe.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            author_id: author_id.into(),
            meal_id: None,
            total_time: None,
            calories: None,
            privacy: Privacy::default(),
            average_taste_rating: None,
            created_at: Utc::now(),
            discarded: false,
            tags: BTreeSet::new(),
        }
    }

    /// Add a recipe tag.
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
