//! Convenient imports for typical `ormlite` usage.
//!
//! ```ignore
//! use ormlite::prelude::*;
//! ```

pub use crate::{
    Connection, Criteria, Entity, FieldRow, Mapping, MappingRegistry, OrmError, OrmLite,
    OrmLiteConfig, OrmResult, ToValue, UpdateReport, Value, criteria,
};

#[cfg(feature = "sqlite")]
pub use crate::SqliteConnection;

#[cfg(feature = "postgres")]
pub use crate::PgConnection;
