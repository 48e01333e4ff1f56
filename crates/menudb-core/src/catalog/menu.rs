//! Declarative mappings for the menu planning entities.

use super::column::ColumnMapping;
use super::entity::{EntityMapping, TagRelation};
use super::join::JoinDef;
use super::registry::ColumnRegistry;
use super::types::SemanticType;
use crate::error::Error;

/// Entity type name of products.
pub const PRODUCT: &str = "Product";
/// Entity type name of recipes.
pub const RECIPE: &str = "Recipe";
/// Entity type name of meals.
pub const MEAL: &str = "Meal";

/// Product mapping: brand and category lookups, with the parent category
/// reached through the category join.
pub fn product_mapping() -> EntityMapping {
    use SemanticType::*;
    EntityMapping::new(PRODUCT, "products")
        .with_join(JoinDef::left("brand", "brands", "products", "brand_id", "id"))
        .with_join(JoinDef::left(
            "category",
            "categories",
            "products",
            "category_id",
            "id",
        ))
        .with_join(JoinDef::left(
            "parent_category",
            "categories",
            "category",
            "parent_id",
            "id",
        ))
        .with_columns([
            ColumnMapping::root("id", Id),
            ColumnMapping::root("name", Text),
            ColumnMapping::root("brand_id", Id).nullable(),
            ColumnMapping::root("category_id", Id).nullable(),
            ColumnMapping::root("barcode", Text).nullable(),
            ColumnMapping::root("price", Float).nullable(),
            ColumnMapping::root("calories", Float).nullable(),
            ColumnMapping::root("is_food", Bool),
            ColumnMapping::root("source_id", Id).nullable(),
            ColumnMapping::root("created_at", Timestamp),
            ColumnMapping::root("discarded", Bool),
            ColumnMapping::joined("brand", "brand", "name", Text),
            ColumnMapping::joined("category", "category", "name", Text),
            ColumnMapping::joined("parent_category", "parent_category", "name", Text),
        ])
        .with_tags(TagRelation::new(
            "products_tags_association",
            "product_id",
            "product",
        ))
}

/// Recipe mapping: meal and menu attributes via `recipes -> meals -> menus`.
pub fn recipe_mapping() -> EntityMapping {
    use SemanticType::*;
    EntityMapping::new(RECIPE, "recipes")
        .with_join(JoinDef::left("meal", "meals", "recipes", "meal_id", "id"))
        .with_join(JoinDef::left("menu", "menus", "meal", "menu_id", "id"))
        .with_columns([
            ColumnMapping::root("id", Id),
            ColumnMapping::root("name", Text),
            ColumnMapping::root("author_id", Id),
            ColumnMapping::root("meal_id", Id).nullable(),
            ColumnMapping::root("total_time", Integer).nullable(),
            ColumnMapping::root("calories", Float).nullable(),
            ColumnMapping::root("privacy", Text),
            ColumnMapping::root("average_taste_rating", Float).nullable(),
            ColumnMapping::root("created_at", Timestamp),
            ColumnMapping::root("discarded", Bool),
            ColumnMapping::joined("meal_name", "meal", "name", Text),
            ColumnMapping::joined("menu_id", "meal", "menu_id", Id),
            ColumnMapping::joined("client_id", "menu", "client_id", Id),
        ])
        .with_tags(TagRelation::new(
            "recipes_tags_association",
            "recipe_id",
            "recipe",
        ))
}

/// Meal mapping: menu attributes via `meals -> menus`.
pub fn meal_mapping() -> EntityMapping {
    use SemanticType::*;
    EntityMapping::new(MEAL, "meals")
        .with_join(JoinDef::left("menu", "menus", "meals", "menu_id", "id"))
        .with_columns([
            ColumnMapping::root("id", Id),
            ColumnMapping::root("name", Text),
            ColumnMapping::root("author_id", Id),
            ColumnMapping::root("menu_id", Id).nullable(),
            ColumnMapping::root("calories", Float).nullable(),
            ColumnMapping::root("like", Bool).nullable(),
            ColumnMapping::root("created_at", Timestamp),
            ColumnMapping::root("discarded", Bool),
            ColumnMapping::joined("menu_name", "menu", "name", Text),
            ColumnMapping::joined("client_id", "menu", "client_id", Id),
        ])
        .with_tags(TagRelation::new("meals_tags_association", "meal_id", "meal"))
}

/// Registry holding every menu planning entity.
pub fn menu_registry() -> Result<ColumnRegistry, Error> {
    ColumnRegistry::new()
        .register(product_mapping())?
        .register(recipe_mapping())?
        .register(meal_mapping())
}
