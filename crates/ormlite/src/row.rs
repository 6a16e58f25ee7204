//! Driver-neutral result rows.

use crate::value::Value;
use std::sync::Arc;

/// One row returned by [`Connection::query`](crate::Connection::query).
///
/// Column names are shared between all rows of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// `values` must line up with `columns`.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value by column name.
    ///
    /// Exact match wins; otherwise the first ASCII case-insensitive match, since
    /// PostgreSQL folds unquoted names to lower case.
    pub fn get(&self, column: &str) -> Option<&Value> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(column))
            })?;
        self.values.get(idx)
    }

    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }
}
