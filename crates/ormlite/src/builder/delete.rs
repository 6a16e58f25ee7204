use crate::entity::{Entity, primary_key_value};
use crate::error::{OrmError, OrmResult};
use crate::mapping::Mapping;
use crate::value::Value;

/// DELETE-by-id builder.
///
/// Keys are embedded as quoted literals rather than bound, so one statement
/// covers any number of records without a variable-length placeholder list.
#[derive(Debug, Clone, Copy)]
pub struct DeleteBuilder<'m> {
    mapping: &'m Mapping,
}

impl<'m> DeleteBuilder<'m> {
    pub fn new(mapping: &'m Mapping) -> Self {
        Self { mapping }
    }

    /// `DELETE FROM <table> WHERE <pk> IN (<lit>, ...)`, quoting each key
    /// with `quote`.
    pub fn build<T, Q>(&self, records: &[T], quote: Q) -> OrmResult<String>
    where
        T: Entity,
        Q: Fn(&Value) -> OrmResult<String>,
    {
        if records.is_empty() {
            return Err(OrmError::validation("DELETE requires at least one record"));
        }
        let literals = records
            .iter()
            .map(|record| quote(&primary_key_value(self.mapping, record)?))
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(format!(
            "DELETE FROM {} WHERE {} IN ({})",
            self.mapping.table(),
            self.mapping.primary_key().column(),
            literals.join(", ")
        ))
    }
}
