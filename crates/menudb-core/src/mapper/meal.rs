//! Meal mapper.

use menudb_proto::Value;

use super::{EntityMapper, Row, WritePayload};
use crate::catalog::menu::MEAL;
use crate::domain::Meal;
use crate::error::Error;

/// Maps [`Meal`] to the `meals` table.
pub struct MealMapper;

impl EntityMapper for MealMapper {
    type Entity = Meal;

    const ENTITY: &'static str = MEAL;

    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "author_id",
        "menu_id",
        "calories",
        "like",
        "created_at",
        "discarded",
    ];

    fn id(entity: &Meal) -> &str {
        &entity.id
    }

    fn to_entity(row: &Row) -> Result<Meal, Error> {
        Ok(Meal {
            id: row.string("id")?,
            name: row.string("name")?,
            author_id: row.string("author_id")?,
            menu_id: row.opt_string("menu_id")?,
            calories: row.opt_f64("calories")?,
            like: row.opt_bool("like")?,
            created_at: row.timestamp("created_at")?,
            discarded: row.bool("discarded")?,
            tags: row.tags()?,
        })
    }

    fn to_storage_row(m: &Meal) -> WritePayload {
        WritePayload {
            id: m.id.clone(),
            columns: vec![
                ("id".into(), m.id.clone().into()),
                ("name".into(), m.name.clone().into()),
                ("author_id".into(), m.author_id.clone().into()),
                ("menu_id".into(), m.menu_id.clone().into()),
                ("calories".into(), m.calories.into()),
                ("like".into(), m.like.into()),
                ("created_at".into(), Value::Timestamp(m.created_at)),
                ("discarded".into(), Value::Bool(m.discarded)),
            ],
            tags: m.tags.iter().cloned().collect(),
        }
    }
}
