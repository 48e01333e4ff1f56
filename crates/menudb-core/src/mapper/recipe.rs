//! Recipe mapper.

use menudb_proto::Value;

use super::{EntityMapper, Row, WritePayload};
use crate::catalog::menu::RECIPE;
use crate::domain::{Privacy, Recipe};
use crate::error::Error;

/// Maps [`Recipe`] to the `recipes` table.
pub struct RecipeMapper;

impl EntityMapper for RecipeMapper {
    type Entity = Recipe;

    const ENTITY: &'static str = RECIPE;

    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "author_id",
        "meal_id",
        "total_time",
        "calories",
        "privacy",
        "average_taste_rating",
        "created_at",
        "discarded",
    ];

    fn id(entity: &Recipe) -> &str {
        &entity.id
    }

    fn to_entity(row: &Row) -> Result<Recipe, Error> {
        let privacy: Privacy = row.string("privacy")?.parse().map_err(Error::Mapping)?;
        Ok(Recipe {
            id: row.string("id")?,
            name: row.string("name")?,
            author_id: row.string("author_id")?,
            meal_id: row.opt_string("meal_id")?,
            total_time: row.opt_i64("total_time")?,
            calories: row.opt_f64("calories")?,
            privacy,
            average_taste_rating: row.opt_f64("average_taste_rating")?,
            created_at: row.timestamp("created_at")?,
            discarded: row.bool("discarded")?,
            tags: row.tags()?,
        })
    }

    fn to_storage_row(r: &Recipe) -> WritePayload {
        WritePayload {
            id: r.id.clone(),
            columns: vec![
                ("id".into(), r.id.clone().into()),
                ("name".into(), r.name.clone().into()),
                ("author_id".into(), r.author_id.clone().into()),
                ("meal_id".into(), r.meal_id.clone().into()),
                ("total_time".into(), r.total_time.into()),
                ("calories".into(), r.calories.into()),
                ("privacy".into(), r.privacy.as_str().into()),
                ("average_taste_rating".into(), r.average_taste_rating.into()),
                ("created_at".into(), Value::Timestamp(r.created_at)),
                ("discarded".into(), Value::Bool(r.discarded)),
            ],
            tags: r.tags.iter().cloned().collect(),
        }
    }
}
