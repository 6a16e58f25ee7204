//! Derive macros for ormlite
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod entity;

/// Derive `Entity` and `TableMapping` for a struct.
///
/// # Example
///
/// ```ignore
/// use ormlite::Entity;
///
/// #[derive(Entity)]
/// #[orm(table = "users")]
/// struct User {
///     #[orm(id)]
///     user_id: i64,
///     username: String,
///     #[orm(column = "email_address")]
///     email: Option<String>,
///     #[orm(skip)]
///     cached_score: u32,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name (required)
/// - `#[orm(id)]` - Primary key field (exactly one)
/// - `#[orm(id, generated)]` - Primary key assigned by the database; left out
///   of INSERT and UPDATE SET
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(skip)]` - Not persisted; filled with `Default::default()` on read
///
/// Columns are written in field declaration order. Non-generic structs are
/// also registered for `MappingRegistry::from_registered()`.
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
