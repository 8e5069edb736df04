//! Derive macro for pgqs
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod entity;

/// Derive `pgqs::Entity` plus the per-table query and update builders.
///
/// # Example
///
/// ```ignore
/// use pgqs::{Entity, RowState};
///
/// #[derive(Debug, Entity)]
/// #[orm(table = "post")]
/// #[orm(has_many(Comment, foreign_key = "post_id", method = "comments"))]
/// pub struct Post {
///     #[orm(id, auto)]
///     id: i64,
///     #[orm(foreign_key = Author)]
///     pub author_id: i64,
///     pub title: String,
///     pub published: bool,
///     pub tags: Option<Vec<String>>,
///     state: RowState,
/// }
/// ```
///
/// # Generated
///
/// - `impl pgqs::FromRow` and `impl pgqs::Entity` for the struct
/// - `PostQuery`: per-column filters (`title_eq`, `id_gt`, `tags_is_null`, ...),
///   ordering (`order_by_title`, `order_by_title_desc`), locking and the
///   `count` / `all` / `first` / `delete` / `update` terminals
/// - `PostUpdate`: per-column `set_*` assignments and `exec`
/// - `Post::new(..)` taking every column that is not autogenerated
/// - read-only getters for autogenerated columns
/// - `get_author` / `set_author` for foreign keys, `comments()` for `has_many`
/// - `Post::query()`, `save`, `delete`, `Post::save_all`
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - table name (required)
/// - `#[orm(has_many(Model, foreign_key = "column", method = "name"))]` - reverse relation;
///   `method` defaults to the pluralized snake-case model name
/// - `#[orm(id)]` - primary key (exactly one)
/// - `#[orm(auto)]` - value generated by the database, read back after insert
/// - `#[orm(column = "name")]` - column name when it differs from the field name
/// - `#[orm(foreign_key = Model)]` - references `Model`'s primary key
/// - `#[orm(type = "int64")]` - column domain type for field types that cannot be inferred
///
/// One field of type `RowState` holds the persisted flag.
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
