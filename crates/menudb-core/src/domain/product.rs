//! Products.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tag::Tag;

/// A purchasable product, optionally a food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand_id: Option<String>,
    pub category_id: Option<String>,
    pub barcode: Option<String>,
    pub price: Option<f64>,
    pub calories: Option<f64>,
    pub is_food: bool,
    pub source_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub discarded: bool,
    pub tags: BTreeSet<Tag>,
}

impl Product {
    /// Tag type of product tags.
    pub const TAG_TYPE: &'static str = "product";

    /// Create a live food product with no optional attributes.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand_id: None,
            category_id: None,
            barcode: None,
            price: None,
            calories: None,
            is_food: true,
            source_id: None,
            created_at: Utc::now(),
            discarded: false,
            tags: BTreeSet::new(),
        }
    }

    /// Add a product tag.
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
