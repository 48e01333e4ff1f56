//! Filter specifications.
//!
//! A filter specification is an ordered mapping from filter key
//! (`<attribute>[_<operator>]`) to value, plus the reserved keys for
//! ordering and tag matching.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::query::OrderSpec;
use crate::value::Value;

/// Reserved key carrying sort tokens.
pub const SORT_KEY: &str = "sort";
/// Reserved key carrying tag triplets matched with AND semantics.
pub const TAGS_KEY: &str = "tags";
/// Reserved key carrying tag triplets matched with OR semantics.
pub const TAGS_ANY_KEY: &str = "tags_any";
/// Reserved key carrying tag triplets that must not be present.
pub const TAGS_NOT_EXISTS_KEY: &str = "tags_not_exists";

/// One tag association criterion.
///
/// An omitted value or author means "any value" / "any author" for the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagCriterion {
    /// Tag key.
    pub key: String,
    /// Tag value, if constrained.
    #[serde(default)]
    pub value: Option<String>,
    /// Tag author, if constrained.
    #[serde(default)]
    pub author_id: Option<String>,
}

impl TagCriterion {
    /// Criterion matching any value and any author for `key`.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            author_id: None,
        }
    }

    /// Criterion matching `key` = `value` by any author.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            author_id: None,
        }
    }

    /// Constrain the author.
    pub fn by(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    /// Decode a criterion from `[key, value?, author?]` or `{key, value?, author_id?}`.
    pub fn from_json(filter_key: &str, json: &serde_json::Value) -> Result<Self, Error> {
        match json {
            serde_json::Value::Array(parts) => {
                if parts.is_empty() || parts.len() > 3 {
                    return Err(Error::invalid_filter_value(
                        filter_key,
                        "tag triplet must have between 1 and 3 elements",
                    ));
                }
                let key = match &parts[0] {
                    serde_json::Value::String(s) => s.clone(),
                    _ => {
                        return Err(Error::invalid_filter_value(
                            filter_key,
                            "tag key must be a string",
                        ))
                    }
                };
                let value = optional_string(filter_key, parts.get(1))?;
                let author_id = optional_string(filter_key, parts.get(2))?;
                Ok(Self {
                    key,
                    value,
                    author_id,
                })
            }
            serde_json::Value::Object(_) => serde_json::from_value(json.clone())
                .map_err(|e| Error::invalid_filter_value(filter_key, e.to_string())),
            other => Err(Error::invalid_filter_value(
                filter_key,
                format!("expected tag triplet, got {other}"),
            )),
        }
    }
}

fn optional_string(
    filter_key: &str,
    json: Option<&serde_json::Value>,
) -> Result<Option<String>, Error> {
    match json {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::invalid_filter_value(
            filter_key,
            format!("tag value and author must be strings or null, got {other}"),
        )),
    }
}

/// How multiple tag criteria combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TagMatchMode {
    /// Entity must satisfy every criterion.
    #[default]
    All,
    /// Entity must satisfy at least one criterion.
    Any,
}

/// Tag matching request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagFilter {
    /// Requested criteria, deduplicated in first-seen order.
    pub criteria: Vec<TagCriterion>,
    /// Combination mode.
    pub mode: TagMatchMode,
    /// Match through soft-deleted tag links and tags as well.
    pub include_discarded_links: bool,
}

impl TagFilter {
    /// Criteria that must all be satisfied.
    pub fn all(criteria: impl IntoIterator<Item = TagCriterion>) -> Self {
        Self::with_mode(criteria, TagMatchMode::All)
    }

    /// Criteria of which at least one must be satisfied.
    pub fn any(criteria: impl IntoIterator<Item = TagCriterion>) -> Self {
        Self::with_mode(criteria, TagMatchMode::Any)
    }

    fn with_mode(criteria: impl IntoIterator<Item = TagCriterion>, mode: TagMatchMode) -> Self {
        let mut deduped: Vec<TagCriterion> = Vec::new();
        for criterion in criteria {
            if !deduped.contains(&criterion) {
                deduped.push(criterion);
            }
        }
        Self {
            criteria: deduped,
            mode,
            include_discarded_links: false,
        }
    }

    /// Also match soft-deleted tag links.
    pub fn including_discarded_links(mut self) -> Self {
        self.include_discarded_links = true;
        self
    }

    /// True when no criteria were supplied.
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

/// An ordered filter specification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSpec {
    /// Attribute filters in caller order. One entry per key.
    pub filters: Vec<(String, Value)>,
    /// Explicit ordering, applied left to right.
    pub sort: Vec<OrderSpec>,
    /// Inclusive tag matching.
    pub tags: Option<TagFilter>,
    /// Tags that must not be present on a returned entity.
    pub excluded_tags: Vec<TagCriterion>,
}

impl FilterSpec {
    /// Create an empty filter specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter. A repeated key replaces the earlier value in place.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a filter, replacing an existing entry for the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.filters.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.filters.push((key, value)),
        }
    }

    /// Add an ordering.
    pub fn sort(mut self, order: OrderSpec) -> Self {
        self.sort.push(order);
        self
    }

    /// Set the inclusive tag filter.
    pub fn tags(mut self, tags: TagFilter) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Add an excluded tag criterion.
    pub fn exclude_tag(mut self, criterion: TagCriterion) -> Self {
        if !self.excluded_tags.contains(&criterion) {
            self.excluded_tags.push(criterion);
        }
        self
    }

    /// True when the specification carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
            && self.sort.is_empty()
            && self.tags.as_ref().map_or(true, TagFilter::is_empty)
            && self.excluded_tags.is_empty()
    }

    /// Decode a filter specification from a JSON object.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, Error> {
        let object = json
            .as_object()
            .ok_or_else(|| Error::InvalidSpec("filter specification must be an object".into()))?;

        let mut spec = FilterSpec::new();
        for (key, value) in object {
            match key.as_str() {
                SORT_KEY => spec.sort.extend(parse_sort(key, value)?),
                TAGS_KEY | TAGS_ANY_KEY => {
                    if spec.tags.is_some() {
                        return Err(Error::invalid_filter_value(
                            key,
                            "only one of 'tags' and 'tags_any' may be given",
                        ));
                    }
                    let criteria = parse_criteria(key, value)?;
                    spec.tags = Some(if key == TAGS_KEY {
                        TagFilter::all(criteria)
                    } else {
                        TagFilter::any(criteria)
                    });
                }
                TAGS_NOT_EXISTS_KEY => {
                    for criterion in parse_criteria(key, value)? {
                        spec = spec.exclude_tag(criterion);
                    }
                }
                _ => {
                    let value = Value::from_json(value).map_err(|e| {
                        Error::invalid_filter_value(key.clone(), e.to_string())
                    })?;
                    spec.insert(key.clone(), value);
                }
            }
        }
        Ok(spec)
    }
}

fn parse_sort(key: &str, json: &serde_json::Value) -> Result<Vec<OrderSpec>, Error> {
    let tokens: Vec<&str> = match json {
        serde_json::Value::String(s) => s.split(',').collect(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| Error::invalid_filter_value(key, "sort entries must be strings"))
            })
            .collect::<Result<_, _>>()?,
        _ => {
            return Err(Error::invalid_filter_value(
                key,
                "sort must be a string or a list of strings",
            ))
        }
    };
    tokens
        .into_iter()
        .map(|token| {
            OrderSpec::parse(token)
                .ok_or_else(|| Error::invalid_filter_value(key, format!("bad sort token '{token}'")))
        })
        .collect()
}

fn parse_criteria(key: &str, json: &serde_json::Value) -> Result<Vec<TagCriterion>, Error> {
    let items = json
        .as_array()
        .ok_or_else(|| Error::invalid_filter_value(key, "expected a list of tag triplets"))?;
    items
        .iter()
        .map(|item| TagCriterion::from_json(key, item))
        .collect()
}
