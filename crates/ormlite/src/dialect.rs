//! SQL dialect differences: placeholder syntax and literal quoting.

use crate::error::{OrmError, OrmResult};
use crate::value::{TIMESTAMP_FORMAT, Value};
use std::fmt::Write;

/// SQL flavour a [`Connection`](crate::Connection) speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `$1, $2, ...` placeholders; named parameters are rewritten to numbered ones.
    Postgres,
    /// `?` positional and `:name` named placeholders.
    Sqlite,
}

impl Dialect {
    /// Write the placeholder for the `index`-th (1-based) positional parameter.
    pub(crate) fn write_positional(self, out: &mut String, index: usize) {
        match self {
            Dialect::Postgres => {
                let _ = write!(out, "${index}");
            }
            Dialect::Sqlite => out.push('?'),
        }
    }

    /// Render a value as a SQL literal that is safe to embed in statement text.
    ///
    /// Used where binding cannot express the statement, e.g. a variable-length
    /// `IN (...)` list built once as text.
    pub fn quote_literal(self, value: &Value) -> OrmResult<String> {
        match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Int(v) => Ok(v.to_string()),
            Value::Float(v) => self.quote_float(*v),
            Value::Bool(v) => Ok(match (self, v) {
                (Dialect::Postgres, true) => "TRUE".to_string(),
                (Dialect::Postgres, false) => "FALSE".to_string(),
                (Dialect::Sqlite, true) => "1".to_string(),
                (Dialect::Sqlite, false) => "0".to_string(),
            }),
            Value::Text(s) => self.quote_text(s),
            Value::Bytes(b) => Ok(self.quote_bytes(b)),
            Value::Timestamp(ts) => self.quote_text(&ts.format(TIMESTAMP_FORMAT).to_string()),
            Value::Uuid(u) => self.quote_text(&u.hyphenated().to_string()),
            Value::Json(j) => self.quote_text(&j.to_string()),
        }
    }

    fn quote_float(self, v: f64) -> OrmResult<String> {
        if v.is_finite() {
            // `{:?}` keeps a decimal point so the literal stays a float.
            return Ok(format!("{v:?}"));
        }
        match self {
            Dialect::Postgres => {
                let word = if v.is_nan() {
                    "NaN"
                } else if v.is_sign_positive() {
                    "Infinity"
                } else {
                    "-Infinity"
                };
                Ok(format!("'{word}'::float8"))
            }
            Dialect::Sqlite => Err(OrmError::validation(format!(
                "Cannot quote non-finite float {v} for SQLite"
            ))),
        }
    }

    fn quote_text(self, s: &str) -> OrmResult<String> {
        if s.contains('\0') {
            return Err(OrmError::validation(
                "Literal cannot contain NUL character",
            ));
        }
        let mut out = String::with_capacity(s.len() + 3);
        // With standard_conforming_strings on, backslashes are only special
        // inside E'' strings; using E'' whenever one appears keeps the
        // literal correct under either server setting.
        let escape_backslash = self == Dialect::Postgres && s.contains('\\');
        if escape_backslash {
            out.push('E');
        }
        out.push('\'');
        for ch in s.chars() {
            match ch {
                '\'' => out.push_str("''"),
                '\\' if escape_backslash => out.push_str("\\\\"),
                _ => out.push(ch),
            }
        }
        out.push('\'');
        Ok(out)
    }

    fn quote_bytes(self, b: &[u8]) -> String {
        let mut hex = String::with_capacity(b.len() * 2);
        for byte in b {
            let _ = write!(hex, "{byte:02x}");
        }
        match self {
            Dialect::Postgres => format!("'\\x{hex}'::bytea"),
            Dialect::Sqlite => format!("X'{hex}'"),
        }
    }
}
