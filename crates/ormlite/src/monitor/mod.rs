//! Query logging for statements issued by [`OrmLite`](crate::OrmLite).
//!
//! Every statement is described by a [`QueryContext`] and handed to a
//! [`QueryLogger`] before and after it runs. Bulk writes tag their statements
//! (see [`OrmLiteConfig::bulk_tag`](crate::OrmLiteConfig::bulk_tag)) so the
//! logger can decide how loudly to report them; nothing toggles global logging
//! state.
//!
//! ```rust,ignore
//! use ormlite::monitor::TracingLogger;
//! use tracing::Level;
//!
//! // Log bulk statements at DEBUG instead of the default TRACE.
//! let orm = OrmLite::new(registry).with_logger(TracingLogger::new().bulk_level(Level::DEBUG));
//! ```

mod loggers;
mod types;

pub use loggers::{NoopLogger, TracingLogger};
pub use types::{QueryContext, QueryLogger, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
