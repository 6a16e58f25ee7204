use super::truncate_sql_bytes;
use super::types::{QueryContext, QueryLogger, QueryResult};
use std::time::Duration;
use tracing::Level;

/// A logger that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl QueryLogger for NoopLogger {}

/// A `tracing`-based logger emitting on target `ormlite.sql`.
///
/// Statements tagged with [`TracingLogger::bulk_tag`] are emitted at
/// `bulk_level` (default `TRACE`) so that a thousand-row insert does not flood
/// a `DEBUG` log; everything else goes out at `level` (default `DEBUG`).
/// Failures are always emitted at `WARN`.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    /// Level for ordinary statements.
    pub level: Level,
    /// Level for statements carrying the bulk tag.
    pub bulk_level: Level,
    /// Tag that selects `bulk_level`.
    pub bulk_tag: String,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            bulk_level: Level::TRACE,
            bulk_tag: crate::config::DEFAULT_BULK_TAG.to_string(),
            max_sql_length: Some(200),
        }
    }
}

impl TracingLogger {
    /// Create a new logger with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the level for ordinary statements.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Override the level for bulk-tagged statements.
    pub fn bulk_level(mut self, level: Level) -> Self {
        self.bulk_level = level;
        self
    }

    /// Change which tag counts as bulk.
    pub fn bulk_tag(mut self, tag: impl Into<String>) -> Self {
        self.bulk_tag = tag.into();
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Level a statement will be logged at.
    pub fn level_for(&self, ctx: &QueryContext) -> Level {
        if ctx.has_tag(&self.bulk_tag) {
            self.bulk_level
        } else {
            self.level
        }
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl QueryLogger for TracingLogger {
    fn before_query(&self, ctx: &QueryContext) {
        let sql = self.truncate_sql(&ctx.sql);
        let tag = ctx.tag.as_deref().unwrap_or("-");
        emit_at_level!(
            self.level_for(ctx),
            target: "ormlite.sql",
            query_type = ?ctx.query_type,
            tag,
            param_count = ctx.param_count,
            fields = ?ctx.fields,
            sql = %sql,
        );
    }

    fn after_query(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let tag = ctx.tag.as_deref().unwrap_or("-");
        if let QueryResult::Error(message) = result {
            tracing::warn!(
                target: "ormlite.sql",
                query_type = ?ctx.query_type,
                tag,
                ?duration,
                error = %message,
                sql = %self.truncate_sql(&ctx.sql),
                "statement failed",
            );
            return;
        }
        emit_at_level!(
            self.level_for(ctx),
            target: "ormlite.sql",
            query_type = ?ctx.query_type,
            tag,
            ?duration,
            result = %result,
        );
    }
}
