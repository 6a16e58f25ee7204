//! PostgreSQL backend built on `tokio-postgres`.
//!
//! [`PgConnection`] owns a current-thread `tokio` runtime and blocks on it for
//! every call, so it satisfies the blocking [`Connection`] trait. Don't use it
//! from inside another runtime's async context; `block_on` panics there.

use crate::connection::Connection;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::sql::Params;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_postgres::{Client, NoTls, Statement};

/// Default number of prepared statements kept per connection.
pub const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 64;

type BoxError = Box<dyn Error + Sync + Send>;

fn encode<T: ToSql>(value: &T, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if !T::accepts(ty) {
        return Err(format!("cannot bind {} to a {ty} parameter", std::any::type_name::<T>()).into());
    }
    value.to_sql(ty, out)
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => encode(b, ty, out),
            Value::Int(i) => match *ty {
                Type::INT2 => encode(&i16::try_from(*i)?, ty, out),
                Type::INT4 => encode(&i32::try_from(*i)?, ty, out),
                Type::FLOAT8 => encode(&(*i as f64), ty, out),
                _ => encode(i, ty, out),
            },
            Value::Float(f) => match *ty {
                Type::FLOAT4 => encode(&(*f as f32), ty, out),
                _ => encode(f, ty, out),
            },
            Value::Text(s) => encode(s, ty, out),
            Value::Bytes(b) => encode(b, ty, out),
            Value::Timestamp(ts) => match *ty {
                Type::TIMESTAMPTZ => encode(&ts.and_utc(), ty, out),
                _ => encode(ts, ty, out),
            },
            Value::Uuid(u) => encode(u, ty, out),
            Value::Json(j) => encode(j, ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Checked per variant in `to_sql`.
        true
    }

    to_sql_checked!();
}

fn extract_value(row: &tokio_postgres::Row, idx: usize) -> OrmResult<Value> {
    let column = &row.columns()[idx];
    let ty = column.type_();
    let decode = |e: tokio_postgres::Error| OrmError::decode(column.name(), e.to_string());

    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx).map_err(decode)?.map(Value::Bool),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .map_err(decode)?
            .map(|v| Value::Int(i64::from(v))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .map_err(decode)?
            .map(|v| Value::Int(i64::from(v))),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx).map_err(decode)?.map(Value::Int),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .map_err(decode)?
            .map(|v| Value::Float(f64::from(v))),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx).map_err(decode)?.map(Value::Float),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)
            .map_err(decode)?
            .map(Value::Timestamp),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)
            .map_err(decode)?
            .map(|v| Value::Timestamp(v.naive_utc())),
        Type::UUID => row.try_get::<_, Option<uuid::Uuid>>(idx).map_err(decode)?.map(Value::Uuid),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)
            .map_err(decode)?
            .map(Value::Json),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx).map_err(decode)?.map(Value::Bytes),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
            .try_get::<_, Option<String>>(idx)
            .map_err(decode)?
            .map(Value::Text),
        _ => {
            return Err(OrmError::decode(
                column.name(),
                format!("unsupported column type {ty}"),
            ));
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Per-connection LRU of prepared statements.
#[derive(Debug)]
struct StatementCache {
    capacity: usize,
    map: HashMap<String, Statement>,
    order: VecDeque<String>,
}

impl StatementCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&mut self, key: &str) -> Option<Statement> {
        let stmt = self.map.get(key).cloned()?;
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
        Some(stmt)
    }

    fn insert(&mut self, key: String, stmt: Statement) {
        if self.capacity == 0 {
            return;
        }
        while self.map.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.map.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.map.insert(key, stmt);
    }
}

/// A blocking PostgreSQL connection.
pub struct PgConnection {
    runtime: Runtime,
    client: Client,
    statements: StatementCache,
    in_transaction: bool,
}

impl PgConnection {
    /// Connect with a libpq-style URL or key/value string, without TLS.
    pub fn connect(url: &str) -> OrmResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| OrmError::Connection(format!("failed to start runtime: {e}")))?;
        let (client, connection) = runtime
            .block_on(tokio_postgres::connect(url, NoTls))
            .map_err(|e| OrmError::Connection(e.to_string()))?;
        // Driven whenever the runtime is blocked on.
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "ormlite.pg", error = %e, "postgres connection error");
            }
        });
        Ok(Self {
            runtime,
            client,
            statements: StatementCache::new(DEFAULT_STATEMENT_CACHE_CAPACITY),
            in_transaction: false,
        })
    }

    /// Change how many prepared statements are kept (0 disables caching).
    pub fn with_statement_cache(mut self, capacity: usize) -> Self {
        self.statements = StatementCache::new(capacity);
        self
    }

    /// Run one or more `;`-separated statements without parameters, e.g. DDL.
    pub fn batch_execute(&mut self, sql: &str) -> OrmResult<()> {
        self.runtime
            .block_on(self.client.batch_execute(sql))
            .map_err(OrmError::from_db_error)
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Borrow the underlying async client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn positional<'a>(params: &'a Params) -> OrmResult<Vec<&'a (dyn ToSql + Sync)>> {
        match params {
            Params::Positional(values) => {
                Ok(values.iter().map(|v| v as &(dyn ToSql + Sync)).collect())
            }
            Params::Named(_) => Err(OrmError::validation(
                "PostgreSQL takes positional parameters; render the statement with Dialect::Postgres",
            )),
        }
    }

    fn prepare(&mut self, sql: &str) -> OrmResult<Statement> {
        if let Some(stmt) = self.statements.get(sql) {
            return Ok(stmt);
        }
        let stmt = self
            .runtime
            .block_on(self.client.prepare(sql))
            .map_err(OrmError::from_db_error)?;
        self.statements.insert(sql.to_string(), stmt.clone());
        Ok(stmt)
    }
}

impl Connection for PgConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn begin(&mut self) -> OrmResult<()> {
        if self.in_transaction {
            return Err(OrmError::Transaction(
                "PostgreSQL transaction already in progress".into(),
            ));
        }
        self.batch_execute("BEGIN")?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> OrmResult<()> {
        if !self.in_transaction {
            return Err(OrmError::Transaction("PostgreSQL transaction not active".into()));
        }
        let result = self.batch_execute("COMMIT");
        self.in_transaction = false;
        result
    }

    fn rollback(&mut self) -> OrmResult<()> {
        if !self.in_transaction {
            return Err(OrmError::Transaction("PostgreSQL transaction not active".into()));
        }
        let result = self.batch_execute("ROLLBACK");
        self.in_transaction = false;
        result
    }

    fn execute(&mut self, sql: &str, params: &Params) -> OrmResult<u64> {
        let refs = Self::positional(params)?;
        if refs.is_empty() {
            return self
                .runtime
                .block_on(self.client.execute(sql, &[]))
                .map_err(OrmError::from_db_error);
        }
        let stmt = self.prepare(sql)?;
        self.runtime
            .block_on(self.client.execute(&stmt, &refs))
            .map_err(OrmError::from_db_error)
    }

    fn query(&mut self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        let refs = Self::positional(params)?;
        let stmt = self.prepare(sql)?;
        let rows = self
            .runtime
            .block_on(self.client.query(&stmt, &refs))
            .map_err(OrmError::from_db_error)?;

        let columns: Arc<[String]> = stmt.columns().iter().map(|c| c.name().to_string()).collect();
        rows.iter()
            .map(|row| {
                let values = (0..columns.len())
                    .map(|idx| extract_value(row, idx))
                    .collect::<OrmResult<Vec<_>>>()?;
                Ok(Row::new(Arc::clone(&columns), values))
            })
            .collect()
    }
}

impl fmt::Debug for PgConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnection")
            .field("cached_statements", &self.statements.map.len())
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_narrow_to_parameter_type() {
        let mut out = BytesMut::new();
        assert!(matches!(
            Value::Int(7).to_sql(&Type::INT4, &mut out),
            Ok(IsNull::No)
        ));
        assert_eq!(out.len(), 4);

        let mut out = BytesMut::new();
        assert!(Value::Int(i64::from(i32::MAX) + 1)
            .to_sql(&Type::INT4, &mut out)
            .is_err());
    }

    #[test]
    fn mismatched_types_are_rejected() {
        let mut out = BytesMut::new();
        assert!(Value::Text("x".into()).to_sql(&Type::INT8, &mut out).is_err());
        assert!(Value::Int(1).to_sql(&Type::TEXT, &mut out).is_err());
        assert!(matches!(Value::Null.to_sql(&Type::INT8, &mut out), Ok(IsNull::Yes)));
    }
}
