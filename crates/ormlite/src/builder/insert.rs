use crate::entity::{Entity, column_values};
use crate::error::{OrmError, OrmResult};
use crate::mapping::Mapping;
use crate::sql::Sql;

/// Number of INSERT statements needed for `len` records at `chunk_size` per
/// statement.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    len.div_ceil(chunk_size)
}

/// Multi-row INSERT builder for one mapping.
///
/// The `INSERT INTO <table> (<columns>) VALUES ` head is rendered once; each
/// call to [`InsertBuilder::build`] appends one placeholder group per record.
#[derive(Debug, Clone)]
pub struct InsertBuilder<'m> {
    mapping: &'m Mapping,
    head: String,
}

impl<'m> InsertBuilder<'m> {
    pub fn new(mapping: &'m Mapping) -> Self {
        let columns: Vec<&str> = mapping.column_names().collect();
        let head = format!(
            "INSERT INTO {} ({}) VALUES ",
            mapping.table(),
            columns.join(", ")
        );
        Self { mapping, head }
    }

    /// Statement text up to and including `VALUES `.
    pub fn head(&self) -> &str {
        &self.head
    }

    /// Parameters per record.
    pub fn row_width(&self) -> usize {
        self.mapping.columns().len()
    }

    /// Build the INSERT for one chunk of records.
    ///
    /// Parameters are laid out record by record, each record's values in
    /// mapping column order.
    pub fn build<T: Entity>(&self, records: &[T]) -> OrmResult<Sql> {
        if records.is_empty() {
            return Err(OrmError::validation("INSERT requires at least one record"));
        }
        let mut sql = Sql::new(self.head.as_str());
        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                sql.push(", ");
            }
            sql.push_bind_group(column_values(self.mapping, record)?);
        }
        Ok(sql)
    }
}
