use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// SELECT query
    Select,
    /// INSERT statement
    Insert,
    /// UPDATE statement
    Update,
    /// DELETE statement
    Delete,
    /// Anything else
    Other,
}

impl QueryType {
    /// Detect query type from the leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start()
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or_default();
        if keyword.eq_ignore_ascii_case("SELECT") {
            QueryType::Select
        } else if keyword.eq_ignore_ascii_case("INSERT") {
            QueryType::Insert
        } else if keyword.eq_ignore_ascii_case("UPDATE") {
            QueryType::Update
        } else if keyword.eq_ignore_ascii_case("DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

/// Context information about the statement being executed.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// The SQL text sent to the connection.
    pub sql: String,
    /// Number of bound parameters.
    pub param_count: usize,
    /// Detected query type.
    pub query_type: QueryType,
    /// Optional tag, e.g. the bulk tag for batched writes.
    pub tag: Option<String>,
    /// Structured fields for observability (low-cardinality).
    pub fields: BTreeMap<String, String>,
}

impl QueryContext {
    /// Create a new query context.
    pub fn new(sql: &str, param_count: usize) -> Self {
        Self {
            sql: sql.to_string(),
            param_count,
            query_type: QueryType::from_sql(sql),
            tag: None,
            fields: BTreeMap::new(),
        }
    }

    /// Add a tag to identify this statement.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Add a structured field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Whether the statement carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }
}

/// Maximum length for error messages in `QueryResult::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Outcome of a statement, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    /// Query returned rows.
    Rows(usize),
    /// Statement affected rows.
    Affected(u64),
    /// Statement failed (message truncated to 512 bytes).
    Error(String),
}

impl QueryResult {
    /// Create an error result, truncating long messages.
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.len() <= MAX_ERROR_LEN {
            return Self::Error(msg);
        }
        let truncated = super::truncate_sql_bytes(&msg, MAX_ERROR_LEN);
        Self::Error(format!("{truncated}..."))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Receives every statement [`OrmLite`](crate::OrmLite) issues.
///
/// Both methods default to doing nothing.
pub trait QueryLogger: Send + Sync {
    /// Called before the statement is sent.
    fn before_query(&self, ctx: &QueryContext) {
        let _ = ctx;
    }

    /// Called after the statement completes (success or failure).
    fn after_query(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let _ = (ctx, duration, result);
    }
}
