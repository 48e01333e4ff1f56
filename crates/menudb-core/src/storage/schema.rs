//! Relational schema for the menu planning entities.

/// Tables created by [`super::Database::migrate`].
pub const TABLES: &[&str] = &[
    "brands",
    "categories",
    "menus",
    "products",
    "recipes",
    "meals",
    "tags",
    "products_tags_association",
    "recipes_tags_association",
    "meals_tags_association",
];

/// Idempotent schema bootstrap.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS brands (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    parent_id TEXT
);

CREATE TABLE IF NOT EXISTS menus (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    client_id TEXT,
    author_id TEXT NOT NULL,
    discarded INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS products (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    brand_id TEXT,
    category_id TEXT,
    barcode TEXT UNIQUE,
    price REAL,
    calories REAL,
    is_food INTEGER NOT NULL DEFAULT 1,
    source_id TEXT,
    created_at TEXT NOT NULL,
    discarded INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS recipes (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    author_id TEXT NOT NULL,
    meal_id TEXT,
    total_time INTEGER,
    calories REAL,
    privacy TEXT NOT NULL DEFAULT 'private',
    average_taste_rating REAL,
    created_at TEXT NOT NULL,
    discarded INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS meals (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    author_id TEXT NOT NULL,
    menu_id TEXT,
    calories REAL,
    "like" INTEGER,
    created_at TEXT NOT NULL,
    discarded INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    author_id TEXT NOT NULL,
    type TEXT NOT NULL,
    discarded INTEGER NOT NULL DEFAULT 0,
    UNIQUE (key, value, author_id, type)
);

CREATE TABLE IF NOT EXISTS products_tags_association (
    product_id TEXT NOT NULL,
    tag_id INTEGER NOT NULL,
    discarded INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (product_id, tag_id)
);

CREATE TABLE IF NOT EXISTS recipes_tags_association (
    recipe_id TEXT NOT NULL,
    tag_id INTEGER NOT NULL,
    discarded INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (recipe_id, tag_id)
);

CREATE TABLE IF NOT EXISTS meals_tags_association (
    meal_id TEXT NOT NULL,
    tag_id INTEGER NOT NULL,
    discarded INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (meal_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_products_discarded ON products(discarded);
CREATE INDEX IF NOT EXISTS idx_recipes_discarded ON recipes(discarded);
CREATE INDEX IF NOT EXISTS idx_recipes_meal ON recipes(meal_id);
CREATE INDEX IF NOT EXISTS idx_meals_discarded ON meals(discarded);
CREATE INDEX IF NOT EXISTS idx_meals_menu ON meals(menu_id);
CREATE INDEX IF NOT EXISTS idx_tags_type_key ON tags(type, key);
CREATE INDEX IF NOT EXISTS idx_products_tags_tag ON products_tags_association(tag_id);
CREATE INDEX IF NOT EXISTS idx_recipes_tags_tag ON recipes_tags_association(tag_id);
CREATE INDEX IF NOT EXISTS idx_meals_tags_tag ON meals_tags_association(tag_id);
"#;
