//! SQLite backend built on `rusqlite`.
//!
//! Values without a native SQLite storage class travel as text or integers:
//! booleans as `0`/`1`, timestamps as `YYYY-MM-DD HH:MM:SS.f`, UUIDs in
//! hyphenated form and JSON as its serialized text. The read side converts
//! them back through [`FromValue`](crate::FromValue).

use crate::connection::Connection;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::sql::Params;
use crate::value::{TIMESTAMP_FORMAT, Value};
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sqlite;

        Ok(match self {
            Value::Null => ToSqlOutput::Owned(Sqlite::Null),
            Value::Bool(b) => ToSqlOutput::Owned(Sqlite::Integer(i64::from(*b))),
            Value::Int(i) => ToSqlOutput::Owned(Sqlite::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(Sqlite::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Timestamp(ts) => {
                ToSqlOutput::Owned(Sqlite::Text(ts.format(TIMESTAMP_FORMAT).to_string()))
            }
            Value::Uuid(u) => ToSqlOutput::Owned(Sqlite::Text(u.hyphenated().to_string())),
            Value::Json(j) => ToSqlOutput::Owned(Sqlite::Text(j.to_string())),
        })
    }
}

fn from_value_ref(column: &str, value: ValueRef<'_>) -> OrmResult<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::Text(
            std::str::from_utf8(t)
                .map_err(|e| OrmError::decode(column, e.to_string()))?
                .to_string(),
        ),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    })
}

/// A blocking SQLite connection.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    in_transaction: bool,
}

impl SqliteConnection {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        let conn = rusqlite::Connection::open(path.as_ref()).map_err(|e| {
            OrmError::Connection(format!("failed to open {}: {e}", path.as_ref().display()))
        })?;
        Ok(Self::from_rusqlite(conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> OrmResult<Self> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| OrmError::Connection(format!("failed to open in-memory database: {e}")))?;
        Ok(Self::from_rusqlite(conn))
    }

    /// Wrap an existing `rusqlite` connection.
    pub fn from_rusqlite(conn: rusqlite::Connection) -> Self {
        Self {
            conn,
            in_transaction: false,
        }
    }

    /// Run one or more `;`-separated statements without parameters, e.g. DDL.
    pub fn execute_batch(&mut self, sql: &str) -> OrmResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(OrmError::from_sqlite_error)
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Borrow the underlying `rusqlite` connection.
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }

    pub fn into_inner(self) -> rusqlite::Connection {
        self.conn
    }
}

fn prefixed_names(values: &[(String, Value)]) -> Vec<String> {
    values.iter().map(|(name, _)| format!(":{name}")).collect()
}

fn named_refs<'a>(names: &'a [String], values: &'a [(String, Value)]) -> Vec<(&'a str, &'a dyn ToSql)> {
    names
        .iter()
        .zip(values)
        .map(|(name, (_, value))| (name.as_str(), value as &dyn ToSql))
        .collect()
}

impl Connection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn begin(&mut self) -> OrmResult<()> {
        if self.in_transaction {
            return Err(OrmError::Transaction(
                "SQLite transaction already in progress".into(),
            ));
        }
        self.execute_batch("BEGIN")?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> OrmResult<()> {
        if !self.in_transaction {
            return Err(OrmError::Transaction("SQLite transaction not active".into()));
        }
        self.execute_batch("COMMIT")?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> OrmResult<()> {
        if !self.in_transaction {
            return Err(OrmError::Transaction("SQLite transaction not active".into()));
        }
        // SQLite may already have rolled back on its own (e.g. after SQLITE_FULL).
        let result = if self.conn.is_autocommit() {
            Ok(())
        } else {
            self.execute_batch("ROLLBACK")
        };
        self.in_transaction = false;
        result
    }

    fn execute(&mut self, sql: &str, params: &Params) -> OrmResult<u64> {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(OrmError::from_sqlite_error)?;
        let changed = match params {
            Params::Positional(values) => stmt.execute(rusqlite::params_from_iter(values.iter())),
            Params::Named(values) => {
                let names = prefixed_names(values);
                stmt.execute(named_refs(&names, values).as_slice())
            }
        }
        .map_err(OrmError::from_sqlite_error)?;
        Ok(changed as u64)
    }

    fn query(&mut self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(OrmError::from_sqlite_error)?;
        let columns: Arc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = match params {
            Params::Positional(values) => stmt.query(rusqlite::params_from_iter(values.iter())),
            Params::Named(values) => {
                let names = prefixed_names(values);
                stmt.query(named_refs(&names, values).as_slice())
            }
        }
        .map_err(OrmError::from_sqlite_error)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(OrmError::from_sqlite_error)? {
            let mut values = Vec::with_capacity(columns.len());
            for (idx, column) in columns.iter().enumerate() {
                let value = row.get_ref(idx).map_err(OrmError::from_sqlite_error)?;
                values.push(from_value_ref(column, value)?);
            }
            out.push(Row::new(Arc::clone(&columns), values));
        }
        Ok(out)
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.conn.path())
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}
