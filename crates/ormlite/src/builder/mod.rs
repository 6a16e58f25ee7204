//! Statement construction from a [`Mapping`](crate::Mapping).
//!
//! The builders here only produce SQL and parameters; they never touch a
//! connection. [`OrmLite`](crate::OrmLite) drives them and owns execution,
//! transactions and logging.
//!
//! - [`InsertBuilder`]: multi-row `INSERT ... VALUES (..), (..)` for one chunk.
//! - [`UpdateBuilder`]: `UPDATE ... SET .. WHERE pk = ?`, rendered once and
//!   re-bound per record.
//! - [`DeleteBuilder`]: `DELETE ... WHERE pk IN (<literals>)`.
//! - [`SelectBuilder`]: `SELECT <columns> FROM .. WHERE c = :field AND ..`.

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use delete::DeleteBuilder;
pub use insert::{InsertBuilder, chunk_count};
pub use select::{Criteria, SelectBuilder};
pub use update::UpdateBuilder;
