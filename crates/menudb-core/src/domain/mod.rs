//! Menu planning domain entities.
//!
//! Entities are plain data. They are read and written only through the
//! repository, which maps them to and from storage rows.

mod meal;
mod product;
mod recipe;
mod tag;

pub use meal::Meal;
pub use product::Product;
pub use recipe::{Privacy, Recipe};
pub use tag::Tag;
