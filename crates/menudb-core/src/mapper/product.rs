//! Product mapper.

use menudb_proto::Value;

use super::{EntityMapper, Row, WritePayload};
use crate::catalog::menu::PRODUCT;
use crate::domain::Product;
use crate::error::Error;

/// Maps [`Product`] to the `products` table.
pub struct ProductMapper;

impl EntityMapper for ProductMapper {
    type Entity = Product;

    const ENTITY: &'static str = PRODUCT;

    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "brand_id",
        "category_id",
        "barcode",
        "price",
        "calories",
        "is_food",
        "source_id",
        "created_at",
        "discarded",
    ];

    fn id(entity: &Product) -> &str {
        &entity.id
    }

    fn to_entity(row: &Row) -> Result<Product, Error> {
        Ok(Product {
            id: row.string("id")?,
            name: row.string("name")?,
            brand_id: row.opt_string("brand_id")?,
            category_id: row.opt_string("category_id")?,
            barcode: row.opt_string("barcode")?,
            price: row.opt_f64("price")?,
            calories: row.opt_f64("calories")?,
            is_food: row.bool("is_food")?,
            source_id: row.opt_string("source_id")?,
            created_at: row.timestamp("created_at")?,
            discarded: row.bool("discarded")?,
            tags: row.tags()?,
        })
    }

    fn to_storage_row(p: &Product) -> WritePayload {
        WritePayload {
            id: p.id.clone(),
            columns: vec![
                ("id".into(), p.id.clone().into()),
                ("name".into(), p.name.clone().into()),
                ("brand_id".into(), p.brand_id.clone().into()),
                ("category_id".into(), p.category_id.clone().into()),
                ("barcode".into(), p.barcode.clone().into()),
                ("price".into(), p.price.into()),
                ("calories".into(), p.calories.into()),
                ("is_food".into(), Value::Bool(p.is_food)),
                ("source_id".into(), p.source_id.clone().into()),
                ("created_at".into(), Value::Timestamp(p.created_at)),
                ("discarded".into(), Value::Bool(p.discarded)),
            ],
            tags: p.tags.iter().cloned().collect(),
        }
    }
}
