use crate::error::{OrmError, OrmResult};
use crate::mapping::Mapping;
use crate::sql::Sql;
use crate::value::Value;
use std::collections::BTreeMap;

/// Equality criteria: field name to required value, combined with AND.
pub type Criteria = BTreeMap<String, Value>;

/// Build [`Criteria`] from `field => value` pairs.
///
/// ```ignore
/// let users: Vec<User> = orm.find_by(&mut conn, &criteria! { "status" => "active", "age" => 30 })?;
/// ```
#[macro_export]
macro_rules! criteria {
    () => {
        $crate::Criteria::new()
    };
    ($($field:expr => $value:expr),+ $(,)?) => {{
        let mut criteria = $crate::Criteria::new();
        $(
            criteria.insert(::std::string::String::from($field), $crate::Value::from($value));
        )+
        criteria
    }};
}

/// SELECT builder over a mapping's read columns.
#[derive(Debug, Clone, Copy)]
pub struct SelectBuilder<'m> {
    mapping: &'m Mapping,
    entity: &'static str,
}

impl<'m> SelectBuilder<'m> {
    /// `entity` names the record type in [`OrmError::InvalidField`].
    pub fn new(mapping: &'m Mapping, entity: &'static str) -> Self {
        Self { mapping, entity }
    }

    /// `SELECT <cols> FROM <table> [WHERE c = :field AND ...]`.
    ///
    /// Every criteria key must name a mapped field; the check runs before any
    /// SQL is produced.
    pub fn build(&self, criteria: &Criteria) -> OrmResult<Sql> {
        let mut clauses = Vec::with_capacity(criteria.len());
        for (field, value) in criteria {
            let column = self
                .mapping
                .column_for_field(field)
                .ok_or_else(|| OrmError::invalid_field(self.entity, field.as_str()))?;
            clauses.push((column.column(), field.as_str(), value));
        }

        let columns: Vec<&str> = self.mapping.read_columns().map(|c| c.column().as_sql()).collect();
        let mut sql = Sql::new(format!("SELECT {} FROM ", columns.join(", ")));
        sql.push_ident(self.mapping.table());
        for (i, (column, field, value)) in clauses.into_iter().enumerate() {
            sql.push(if i == 0 { " WHERE " } else { " AND " });
            sql.push_ident(column).push(" = ").push_bind_named(field, value.clone());
        }
        Ok(sql)
    }
}
