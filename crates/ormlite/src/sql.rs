//! Dialect-neutral SQL composition.
//!
//! [`Sql`] stores SQL fragments and bound values separately and only decides
//! on placeholder syntax when rendered for a [`Dialect`]:
//!
//! ```ignore
//! let mut q = Sql::new("UPDATE users SET name = ");
//! q.push_bind("alice");
//! q.push(" WHERE id = ").push_bind(7_i64);
//!
//! let stmt = q.render(Dialect::Postgres)?;
//! assert_eq!(stmt.sql, "UPDATE users SET name = $1 WHERE id = $2");
//! ```

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::value::Value;

#[derive(Debug, Clone)]
enum SqlPart {
    Raw(String),
    Param,
    Named(String),
}

/// Parameters to go with a rendered statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Bound by position, in placeholder order.
    Positional(Vec<Value>),
    /// Bound by name (without the leading `:`), in first-use order.
    Named(Vec<(String, Value)>),
}

impl Params {
    /// No parameters.
    pub fn none() -> Self {
        Params::Positional(Vec::new())
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Positional(v) => v.len(),
            Params::Named(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The values in binding order, ignoring names.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Params::Positional(v) => v.iter().collect(),
            Params::Named(v) => v.iter().map(|(_, value)| value).collect(),
        }
    }
}

/// A rendered statement: final SQL text plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Params,
}

/// Parameter-safe SQL builder.
#[derive(Debug, Clone, Default)]
pub struct Sql {
    parts: Vec<SqlPart>,
    values: Vec<Value>,
    named: bool,
}

impl Sql {
    /// Create a new builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            parts: vec![SqlPart::Raw(initial_sql.into())],
            values: Vec::new(),
            named: false,
        }
    }

    /// Create an empty builder.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }
        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a validated identifier.
    pub fn push_ident(&mut self, ident: &Ident) -> &mut Self {
        self.push(ident.as_sql())
    }

    /// Append a positional placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.values.push(value.into());
        self
    }

    /// Append a named placeholder and bind its value.
    ///
    /// A statement uses either positional or named placeholders, never both;
    /// mixing is reported by [`Sql::render`].
    pub fn push_bind_named(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.named = true;
        self.parts.push(SqlPart::Named(name.to_string()));
        self.values.push(value.into());
        self
    }

    /// Append `(?, ?, ...)` binding each value in order.
    pub fn push_bind_group(&mut self, values: impl IntoIterator<Item = Value>) -> &mut Self {
        self.push("(");
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_bind(value);
        }
        self.push(")")
    }

    /// Number of bound values.
    pub fn param_count(&self) -> usize {
        self.values.len()
    }

    /// Bound values in push order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Render SQL text and parameters for `dialect`.
    pub fn render(&self, dialect: Dialect) -> OrmResult<Statement> {
        let positional = self.parts.iter().any(|p| matches!(p, SqlPart::Param));
        if self.named && positional {
            return Err(OrmError::validation(
                "Sql mixes positional and named parameters",
            ));
        }

        let mut sql = String::new();
        if !self.named {
            let mut idx = 0;
            for part in &self.parts {
                match part {
                    SqlPart::Raw(s) => sql.push_str(s),
                    SqlPart::Param => {
                        idx += 1;
                        dialect.write_positional(&mut sql, idx);
                    }
                    SqlPart::Named(_) => unreachable!("checked above"),
                }
            }
            return Ok(Statement {
                sql,
                params: Params::Positional(self.values.clone()),
            });
        }

        // Each distinct name is bound once; repeats reuse the first value.
        let mut names: Vec<(String, Value)> = Vec::new();
        let mut values = self.values.iter();
        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => sql.push_str(s),
                SqlPart::Named(name) => {
                    let value = values.next().cloned().unwrap_or(Value::Null);
                    let slot = match names.iter().position(|(n, _)| n == name) {
                        Some(i) => i,
                        None => {
                            names.push((name.clone(), value));
                            names.len() - 1
                        }
                    };
                    match dialect {
                        Dialect::Postgres => dialect.write_positional(&mut sql, slot + 1),
                        Dialect::Sqlite => {
                            sql.push(':');
                            sql.push_str(name);
                        }
                    }
                }
                SqlPart::Param => unreachable!("checked above"),
            }
        }

        let params = match dialect {
            Dialect::Postgres => Params::Positional(names.into_iter().map(|(_, v)| v).collect()),
            Dialect::Sqlite => Params::Named(names),
        };
        Ok(Statement { sql, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_rendering_per_dialect() {
        let mut q = Sql::new("UPDATE t SET a = ");
        q.push_bind(1_i64).push(", b = ").push_bind("x");
        q.push(" WHERE id = ").push_bind(9_i64);

        let pg = q.render(Dialect::Postgres).unwrap();
        assert_eq!(pg.sql, "UPDATE t SET a = $1, b = $2 WHERE id = $3");
        let lite = q.render(Dialect::Sqlite).unwrap();
        assert_eq!(lite.sql, "UPDATE t SET a = ?, b = ? WHERE id = ?");
        assert_eq!(
            lite.params,
            Params::Positional(vec![Value::Int(1), Value::Text("x".into()), Value::Int(9)])
        );
    }

    #[test]
    fn bind_group() {
        let mut q = Sql::new("VALUES ");
        q.push_bind_group([Value::Int(1), Value::Null]);
        q.push(",");
        q.push_bind_group([Value::Int(2), Value::Bool(true)]);
        assert_eq!(
            q.render(Dialect::Postgres).unwrap().sql,
            "VALUES ($1, $2),($3, $4)"
        );
        assert_eq!(q.param_count(), 4);
    }

    #[test]
    fn named_rendering_per_dialect() {
        let mut q = Sql::new("SELECT a FROM t WHERE a = ");
        q.push_bind_named("first", 1_i64);
        q.push(" AND b = ").push_bind_named("second", "x");

        let lite = q.render(Dialect::Sqlite).unwrap();
        assert_eq!(lite.sql, "SELECT a FROM t WHERE a = :first AND b = :second");
        assert_eq!(
            lite.params,
            Params::Named(vec![
                ("first".into(), Value::Int(1)),
                ("second".into(), Value::Text("x".into())),
            ])
        );

        let pg = q.render(Dialect::Postgres).unwrap();
        assert_eq!(pg.sql, "SELECT a FROM t WHERE a = $1 AND b = $2");
        assert_eq!(pg.params.len(), 2);
    }

    #[test]
    fn repeated_name_binds_once() {
        let mut q = Sql::new("SELECT 1 WHERE a = ");
        q.push_bind_named("v", 5_i64).push(" OR b = ").push_bind_named("v", 5_i64);
        let pg = q.render(Dialect::Postgres).unwrap();
        assert_eq!(pg.sql, "SELECT 1 WHERE a = $1 OR b = $1");
        assert_eq!(pg.params.len(), 1);
    }

    #[test]
    fn mixing_styles_is_rejected() {
        let mut q = Sql::new("SELECT 1 WHERE a = ");
        q.push_bind(1_i64).push(" AND b = ").push_bind_named("b", 2_i64);
        assert!(q.render(Dialect::Sqlite).is_err());
    }
}
