//! # ormlite
//!
//! Mapping-driven bulk persistence without a full ORM.
//!
//! ## Features
//!
//! - **Bulk insert**: multi-row `INSERT ... VALUES (..), (..)` in bounded chunks, one transaction
//! - **Bulk update**: one `UPDATE ... WHERE pk = ?` re-bound per record, one transaction
//! - **Delete by id**: a single `DELETE ... WHERE pk IN (...)` with safely quoted keys
//! - **Equality finds**: `find_by` / `find_all` / `find_one_by` with named parameters
//! - **Explicit mappings**: registered per type, or generated with `#[derive(Entity)]`
//! - **Blocking API**: SQLite via `rusqlite`, PostgreSQL via `tokio-postgres`
//!
//! ```ignore
//! use ormlite::prelude::*;
//!
//! #[derive(Debug, Entity)]
//! #[orm(table = "users")]
//! struct User {
//!     #[orm(id)]
//!     id: i64,
//!     name: String,
//!     #[orm(column = "email_address")]
//!     email: String,
//! }
//!
//! let mut conn = SqliteConnection::open_in_memory()?;
//! let orm = OrmLite::new(MappingRegistry::from_registered()?);
//!
//! orm.insert(&mut conn, &users)?;
//! let alice: Option<User> = orm.find_one_by(&mut conn, &criteria! { "name" => "alice" })?;
//! ```

pub mod builder;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod ident;
pub mod mapping;
pub mod monitor;
pub mod prelude;
pub mod row;
pub mod sql;
pub mod transaction;
pub mod value;

mod ormlite;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use builder::Criteria;
pub use config::OrmLiteConfig;
pub use connection::Connection;
pub use dialect::Dialect;
pub use entity::{Entity, FieldRow};
pub use error::{OrmError, OrmResult};
pub use ident::Ident;
pub use mapping::{
    ColumnMapping, EntityType, Mapping, MappingBuilder, MappingProvider, MappingRegistration,
    MappingRegistry, TableMapping,
};
pub use monitor::{NoopLogger, QueryContext, QueryLogger, QueryResult, QueryType, TracingLogger};
pub use ormlite::{OrmLite, UpdateReport};
pub use row::Row;
pub use sql::{Params, Sql, Statement};
pub use transaction::{Transaction, transaction};
pub use value::{FromValue, ToValue, Value};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;

#[cfg(feature = "postgres")]
pub use postgres::PgConnection;

#[cfg(feature = "derive")]
pub use ormlite_derive::Entity;

// Re-export inventory for use by derive macros
pub use inventory;
