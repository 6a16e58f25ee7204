//! Table mappings and the providers that resolve them.
//!
//! A [`Mapping`] says which table a record type lives in, which columns its
//! fields map to (in a fixed order), and which field is the primary key. The
//! column order is the order values are read from a record when building
//! INSERT and UPDATE parameter lists.
//!
//! Mappings are resolved through a [`MappingProvider`]. [`MappingRegistry`] is
//! the built-in provider: register mappings explicitly, or collect every type
//! that used `#[derive(Entity)]` with [`MappingRegistry::from_registered`].

use crate::error::{OrmError, OrmResult};
use crate::ident::{Ident, validate_field_name};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One field-to-column pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    field: String,
    column: Ident,
}

impl ColumnMapping {
    pub fn new(field: impl Into<String>, column: &str) -> OrmResult<Self> {
        let field = field.into();
        validate_field_name(&field)?;
        Ok(Self {
            field,
            column: Ident::parse(column)?,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn column(&self) -> &Ident {
        &self.column
    }
}

/// Immutable table mapping for one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    table: Ident,
    columns: Vec<ColumnMapping>,
    primary_key: ColumnMapping,
    primary_key_is_column: bool,
}

impl Mapping {
    /// Start building a mapping for `table`.
    pub fn builder(table: &str) -> MappingBuilder {
        MappingBuilder {
            table: table.to_string(),
            columns: Vec::new(),
            primary_key: None,
        }
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        self.table.as_sql()
    }

    /// Mapped columns in write order.
    pub fn columns(&self) -> &[ColumnMapping] {
        &self.columns
    }

    /// Column names in write order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.column.as_sql())
    }

    pub fn primary_key(&self) -> &ColumnMapping {
        &self.primary_key
    }

    pub fn primary_key_column(&self) -> &str {
        self.primary_key.column.as_sql()
    }

    pub fn primary_key_field(&self) -> &str {
        &self.primary_key.field
    }

    /// Whether the primary key is also one of the write columns.
    pub fn primary_key_is_column(&self) -> bool {
        self.primary_key_is_column
    }

    /// Look up the column a field maps to, including the primary key.
    pub fn column_for_field(&self, field: &str) -> Option<&ColumnMapping> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .or_else(|| (self.primary_key.field == field).then_some(&self.primary_key))
    }

    /// Every column a read should select: the write columns plus the primary
    /// key when it is mapped as identifier only.
    pub fn read_columns(&self) -> impl Iterator<Item = &ColumnMapping> + '_ {
        let extra = (!self.primary_key_is_column).then_some(&self.primary_key);
        extra.into_iter().chain(self.columns.iter())
    }
}

/// Builder for [`Mapping`].
#[derive(Debug, Clone)]
#[must_use]
pub struct MappingBuilder {
    table: String,
    columns: Vec<(String, String)>,
    primary_key: Option<(String, Option<String>)>,
}

impl MappingBuilder {
    /// Append a field/column pair. Order of calls is write order.
    pub fn column(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.columns.push((field.into(), column.into()));
        self
    }

    /// Mark an already-declared column field as the primary key.
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = Some((field.into(), None));
        self
    }

    /// Declare a primary key that is not a write column (e.g. generated by
    /// the database). It is selected on reads and used by update/delete.
    pub fn generated_primary_key(
        mut self,
        field: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        self.primary_key = Some((field.into(), Some(column.into())));
        self
    }

    pub fn build(self) -> OrmResult<Mapping> {
        let table = Ident::parse(&self.table)?;
        if self.columns.is_empty() {
            return Err(OrmError::validation(format!(
                "Mapping for '{table}' has no columns"
            )));
        }

        let mut columns = Vec::with_capacity(self.columns.len());
        let mut seen_fields = HashSet::new();
        let mut seen_columns = HashSet::new();
        for (field, column) in &self.columns {
            let mapped = ColumnMapping::new(field.as_str(), column)?;
            if !seen_fields.insert(mapped.field.clone()) {
                return Err(OrmError::validation(format!(
                    "Field '{field}' mapped twice in '{table}'"
                )));
            }
            if !seen_columns.insert(mapped.column.clone()) {
                return Err(OrmError::validation(format!(
                    "Column '{column}' mapped twice in '{table}'"
                )));
            }
            columns.push(mapped);
        }

        let (pk_field, pk_column) = self.primary_key.ok_or_else(|| {
            OrmError::validation(format!("Mapping for '{table}' has no primary key"))
        })?;

        let (primary_key, primary_key_is_column) = match pk_column {
            None => {
                let pk = columns
                    .iter()
                    .find(|c| c.field == pk_field)
                    .cloned()
                    .ok_or_else(|| {
                        OrmError::validation(format!(
                            "Primary key field '{pk_field}' is not a mapped column of '{table}'"
                        ))
                    })?;
                (pk, true)
            }
            Some(column) => {
                let pk = ColumnMapping::new(pk_field, &column)?;
                if seen_fields.contains(&pk.field) || seen_columns.contains(&pk.column) {
                    return Err(OrmError::validation(format!(
                        "Generated primary key '{}' overlaps a write column of '{table}'",
                        pk.field
                    )));
                }
                (pk, false)
            }
        };

        Ok(Mapping {
            table,
            columns,
            primary_key,
            primary_key_is_column,
        })
    }
}

/// Identity of a record type, used as the lookup key for mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
}

impl EntityType {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full Rust type name, for messages.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Resolves a record type to its table mapping.
pub trait MappingProvider {
    /// Returns [`OrmError::UnmappedType`] when the type has no mapping.
    fn resolve(&self, entity: EntityType) -> OrmResult<Arc<Mapping>>;
}

impl<P: MappingProvider + ?Sized> MappingProvider for &P {
    fn resolve(&self, entity: EntityType) -> OrmResult<Arc<Mapping>> {
        (**self).resolve(entity)
    }
}

impl<P: MappingProvider + ?Sized> MappingProvider for Arc<P> {
    fn resolve(&self, entity: EntityType) -> OrmResult<Arc<Mapping>> {
        (**self).resolve(entity)
    }
}

/// Types that carry their own mapping (implemented by `#[derive(Entity)]`).
pub trait TableMapping: 'static {
    fn mapping() -> OrmResult<Mapping>;
}

/// Registration entry for auto-registering mappings.
///
/// `#[derive(Entity)]` submits one of these per non-generic struct so that
/// [`MappingRegistry::from_registered`] can pick it up.
pub struct MappingRegistration {
    /// Function that registers a type's mapping with a registry.
    pub register_fn: fn(&mut MappingRegistry) -> OrmResult<()>,
}

inventory::collect!(MappingRegistration);

/// Mapping provider backed by a `TypeId`-keyed map.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    mappings: HashMap<TypeId, Arc<Mapping>>,
}

impl MappingRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every mapping submitted by `#[derive(Entity)]`.
    pub fn from_registered() -> OrmResult<Self> {
        let mut registry = Self::new();
        for registration in inventory::iter::<MappingRegistration> {
            (registration.register_fn)(&mut registry)?;
        }
        Ok(registry)
    }

    /// Register (or replace) the mapping for `T`.
    pub fn insert<T: 'static>(&mut self, mapping: Mapping) -> &mut Self {
        self.mappings.insert(TypeId::of::<T>(), Arc::new(mapping));
        self
    }

    /// Register a type that knows its own mapping.
    pub fn register<T: TableMapping>(&mut self) -> OrmResult<&mut Self> {
        let mapping = T::mapping()?;
        Ok(self.insert::<T>(mapping))
    }

    /// Builder-style variant of [`MappingRegistry::insert`].
    pub fn with<T: 'static>(mut self, mapping: Mapping) -> Self {
        self.insert::<T>(mapping);
        self
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.mappings.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl MappingProvider for MappingRegistry {
    fn resolve(&self, entity: EntityType) -> OrmResult<Arc<Mapping>> {
        self.mappings
            .get(&entity.id())
            .cloned()
            .ok_or_else(|| OrmError::UnmappedType(entity.name().to_string()))
    }
}
