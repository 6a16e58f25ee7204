//! The record side of a mapping.

use crate::error::{OrmError, OrmResult};
use crate::mapping::Mapping;
use crate::row::Row;
use crate::value::{FromValue, Value};

/// A record type that can be written and read through a [`Mapping`].
///
/// Implemented by `#[derive(Entity)]`. A manual implementation looks like:
///
/// ```ignore
/// impl Entity for User {
///     fn field_value(&self, field: &str) -> Option<Value> {
///         match field {
///             "id" => Some(self.id.to_value()),
///             "name" => Some(self.name.to_value()),
///             _ => None,
///         }
///     }
///
///     fn from_row(row: &FieldRow<'_>) -> OrmResult<Self> {
///         Ok(Self { id: row.get("id")?, name: row.get("name")? })
///     }
/// }
/// ```
pub trait Entity: Sized + 'static {
    /// Value of the named field, or `None` if the type has no such field.
    ///
    /// Writers call this once per mapped column, in mapping order; the order
    /// fields are declared in the struct plays no part.
    fn field_value(&self, field: &str) -> Option<Value>;

    /// Build a record from a result row.
    fn from_row(row: &FieldRow<'_>) -> OrmResult<Self>;
}

/// Read the values of `mapping`'s write columns from `record`, in order.
pub fn column_values<T: Entity>(mapping: &Mapping, record: &T) -> OrmResult<Vec<Value>> {
    mapping
        .columns()
        .iter()
        .map(|column| field_value_of(record, column.field()))
        .collect()
}

/// The primary-key value of `record`.
pub fn primary_key_value<T: Entity>(mapping: &Mapping, record: &T) -> OrmResult<Value> {
    field_value_of(record, mapping.primary_key_field())
}

pub(crate) fn field_value_of<T: Entity>(record: &T, field: &str) -> OrmResult<Value> {
    record
        .field_value(field)
        .ok_or_else(|| OrmError::invalid_field(std::any::type_name::<T>(), field))
}

/// A result row viewed through a mapping, so values are fetched by field name.
#[derive(Debug, Clone, Copy)]
pub struct FieldRow<'a> {
    row: &'a Row,
    mapping: &'a Mapping,
}

impl<'a> FieldRow<'a> {
    pub fn new(row: &'a Row, mapping: &'a Mapping) -> Self {
        Self { row, mapping }
    }

    pub fn row(&self) -> &'a Row {
        self.row
    }

    pub fn mapping(&self) -> &'a Mapping {
        self.mapping
    }

    /// Raw value for a field.
    pub fn value(&self, field: &str) -> OrmResult<&'a Value> {
        let column = self.mapping.column_for_field(field).ok_or_else(|| {
            OrmError::invalid_field(self.mapping.table_name(), field)
        })?;
        let name = column.column().name();
        self.row
            .get(name)
            .ok_or_else(|| OrmError::decode(name, "column missing from result row"))
    }

    /// Converted value for a field.
    pub fn get<T: FromValue>(&self, field: &str) -> OrmResult<T> {
        let value = self.value(field)?;
        T::from_value(value).map_err(|message| {
            let column = self
                .mapping
                .column_for_field(field)
                .map(|c| c.column().name().to_string())
                .unwrap_or_else(|| field.to_string());
            OrmError::decode(column, message)
        })
    }
}
