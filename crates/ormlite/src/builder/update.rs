use crate::dialect::Dialect;
use crate::entity::{Entity, field_value_of, primary_key_value};
use crate::error::{OrmError, OrmResult};
use crate::mapping::{ColumnMapping, Mapping};
use crate::sql::{Params, Sql};
use crate::value::Value;

/// UPDATE-by-primary-key builder.
///
/// Every record in a batch shares one statement text,
/// `UPDATE <table> SET c1 = ?, c2 = ? WHERE <pk> = ?`; only the parameters
/// change per record.
#[derive(Debug, Clone)]
pub struct UpdateBuilder<'m> {
    mapping: &'m Mapping,
    set: Vec<&'m ColumnMapping>,
}

impl<'m> UpdateBuilder<'m> {
    /// Build for `mapping`. With `include_primary_key` false the primary-key
    /// column is left out of SET even when it is a mapped column.
    pub fn new(mapping: &'m Mapping, include_primary_key: bool) -> OrmResult<Self> {
        let pk_field = mapping.primary_key_field();
        let set: Vec<&ColumnMapping> = mapping
            .columns()
            .iter()
            .filter(|c| include_primary_key || c.field() != pk_field)
            .collect();
        if set.is_empty() {
            return Err(OrmError::validation(format!(
                "UPDATE on '{}' has no columns to set",
                mapping.table()
            )));
        }
        Ok(Self { mapping, set })
    }

    /// Columns in SET order.
    pub fn set_columns(&self) -> impl Iterator<Item = &ColumnMapping> + '_ {
        self.set.iter().copied()
    }

    /// Render the shared statement text.
    pub fn render(&self, dialect: Dialect) -> OrmResult<String> {
        let mut sql = Sql::new("UPDATE ");
        sql.push_ident(self.mapping.table()).push(" SET ");
        for (i, column) in self.set.iter().enumerate() {
            if i > 0 {
                sql.push(", ");
            }
            sql.push_ident(column.column()).push(" = ").push_bind(Value::Null);
        }
        sql.push(" WHERE ")
            .push_ident(self.mapping.primary_key().column())
            .push(" = ")
            .push_bind(Value::Null);
        Ok(sql.render(dialect)?.sql)
    }

    /// Parameters for one record: SET values in order, then the key.
    pub fn params<T: Entity>(&self, record: &T) -> OrmResult<Params> {
        let mut values = Vec::with_capacity(self.set.len() + 1);
        for column in &self.set {
            values.push(field_value_of(record, column.field())?);
        }
        values.push(primary_key_value(self.mapping, record)?);
        Ok(Params::Positional(values))
    }
}
