//! The database seam.
//!
//! Everything ormlite sends to a database goes through [`Connection`]. The
//! crate ships implementations for SQLite (`sqlite` feature) and PostgreSQL
//! (`postgres` feature); implement it yourself to plug in another driver or a
//! test double.

use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::row::Row;
use crate::sql::Params;
use crate::value::Value;

/// A blocking, transactional database connection.
pub trait Connection {
    /// SQL flavour used to render placeholders and literals for this connection.
    fn dialect(&self) -> Dialect;

    /// Start a transaction.
    fn begin(&mut self) -> OrmResult<()>;

    /// Commit the open transaction.
    fn commit(&mut self) -> OrmResult<()>;

    /// Roll back the open transaction.
    fn rollback(&mut self) -> OrmResult<()>;

    /// Execute a statement and return the number of affected rows.
    fn execute(&mut self, sql: &str, params: &Params) -> OrmResult<u64>;

    /// Execute a query and return all rows.
    fn query(&mut self, sql: &str, params: &Params) -> OrmResult<Vec<Row>>;

    /// Render `value` as a literal that is safe to embed in SQL text.
    ///
    /// The default follows [`Dialect::quote_literal`]; drivers with their own
    /// escaping routine should override it.
    fn quote_literal(&self, value: &Value) -> OrmResult<String> {
        self.dialect().quote_literal(value)
    }
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn begin(&mut self) -> OrmResult<()> {
        (**self).begin()
    }

    fn commit(&mut self) -> OrmResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> OrmResult<()> {
        (**self).rollback()
    }

    fn execute(&mut self, sql: &str, params: &Params) -> OrmResult<u64> {
        (**self).execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn quote_literal(&self, value: &Value) -> OrmResult<String> {
        (**self).quote_literal(value)
    }
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn begin(&mut self) -> OrmResult<()> {
        (**self).begin()
    }

    fn commit(&mut self) -> OrmResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> OrmResult<()> {
        (**self).rollback()
    }

    fn execute(&mut self, sql: &str, params: &Params) -> OrmResult<u64> {
        (**self).execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn quote_literal(&self, value: &Value) -> OrmResult<String> {
        (**self).quote_literal(value)
    }
}
