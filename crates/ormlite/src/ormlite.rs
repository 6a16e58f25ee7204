//! The bulk persistence facade.

use crate::builder::{
    Criteria, DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder, chunk_count,
};
use crate::config::{OrmLiteConfig, validate_max_insert_size};
use crate::connection::Connection;
use crate::entity::{Entity, FieldRow};
use crate::error::OrmResult;
use crate::mapping::{EntityType, Mapping, MappingProvider, MappingRegistry};
use crate::monitor::{QueryContext, QueryLogger, QueryResult, TracingLogger};
use crate::row::Row;
use crate::sql::{Params, Statement};
use crate::transaction::transaction;
use std::sync::Arc;
use std::time::Instant;

/// Per-record outcome of [`OrmLite::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    affected: Vec<u64>,
}

impl UpdateReport {
    /// Rows affected by each record's UPDATE, in input order.
    pub fn affected(&self) -> &[u64] {
        &self.affected
    }

    /// Sum of affected rows.
    pub fn total(&self) -> u64 {
        self.affected.iter().sum()
    }

    /// Indices of records whose primary key matched no row.
    pub fn unmatched(&self) -> Vec<usize> {
        self.affected
            .iter()
            .enumerate()
            .filter_map(|(i, n)| (*n == 0).then_some(i))
            .collect()
    }

    /// Whether every record matched at least one row.
    pub fn all_matched(&self) -> bool {
        self.affected.iter().all(|n| *n > 0)
    }

    pub fn len(&self) -> usize {
        self.affected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.affected.is_empty()
    }
}

/// Mapping-driven bulk insert, update, delete and equality finds.
///
/// `OrmLite` holds no connection; every operation borrows one for its
/// duration. Insert and update run inside a single transaction that is rolled
/// back if any statement fails.
///
/// ```ignore
/// let registry = MappingRegistry::from_registered()?;
/// let orm = OrmLite::new(registry);
///
/// orm.insert(&mut conn, &users)?;
/// let active: Vec<User> = orm.find_by(&mut conn, &criteria! { "status" => "active" })?;
/// ```
pub struct OrmLite<P: MappingProvider = MappingRegistry> {
    provider: P,
    config: OrmLiteConfig,
    logger: Arc<dyn QueryLogger>,
    custom_logger: bool,
}

impl<P: MappingProvider> OrmLite<P> {
    /// Create a facade with default configuration and a [`TracingLogger`].
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: OrmLiteConfig::default(),
            logger: Arc::new(TracingLogger::new()),
            custom_logger: false,
        }
    }

    /// Replace the configuration after validating it.
    pub fn with_config(mut self, config: OrmLiteConfig) -> OrmResult<Self> {
        config.validate()?;
        if !self.custom_logger {
            self.logger = Arc::new(TracingLogger::new().bulk_tag(config.bulk_tag.as_str()));
        }
        self.config = config;
        Ok(self)
    }

    /// Set the query logger.
    pub fn with_logger<L: QueryLogger + 'static>(self, logger: L) -> Self {
        self.with_logger_arc(Arc::new(logger))
    }

    /// Set the query logger from an Arc.
    pub fn with_logger_arc(mut self, logger: Arc<dyn QueryLogger>) -> Self {
        self.logger = logger;
        self.custom_logger = true;
        self
    }

    pub fn config(&self) -> &OrmLiteConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn max_insert_size(&self) -> usize {
        self.config.max_insert_size
    }

    /// Change the INSERT chunk size. Rejects 0.
    pub fn set_max_insert_size(&mut self, size: usize) -> OrmResult<()> {
        validate_max_insert_size(size)?;
        self.config.max_insert_size = size;
        Ok(())
    }

    /// Resolve the mapping for `T`.
    pub fn mapping<T: 'static>(&self) -> OrmResult<Arc<Mapping>> {
        self.provider.resolve(EntityType::of::<T>())
    }

    /// Insert `records` with multi-row INSERT statements of at most
    /// `max_insert_size` rows each, all inside one transaction.
    ///
    /// Returns the total affected-row count. An empty slice is a no-op.
    pub fn insert<T, C>(&self, conn: &mut C, records: &[T]) -> OrmResult<u64>
    where
        T: Entity,
        C: Connection + ?Sized,
    {
        if records.is_empty() {
            return Ok(0);
        }
        let mapping = self.mapping::<T>()?;
        let builder = InsertBuilder::new(&mapping);
        let chunk_size = self.config.max_insert_size;
        let chunks = chunk_count(records.len(), chunk_size);
        let dialect = conn.dialect();

        transaction(conn, |conn| {
            let mut total = 0;
            for (i, chunk) in records.chunks(chunk_size).enumerate() {
                let stmt = builder.build(chunk)?.render(dialect)?;
                let ctx = self
                    .context(&stmt, &mapping)
                    .with_tag(self.config.bulk_tag.as_str())
                    .with_field("chunk", format!("{}/{}", i + 1, chunks));
                total += self.execute(conn, &stmt.sql, &stmt.params, ctx)?;
            }
            Ok(total)
        })
    }

    /// Update each record by primary key inside one transaction.
    ///
    /// A record whose key matches no row contributes 0 to the report and does
    /// not stop the batch. Any statement failure rolls everything back.
    pub fn update<T, C>(&self, conn: &mut C, records: &[T]) -> OrmResult<UpdateReport>
    where
        T: Entity,
        C: Connection + ?Sized,
    {
        if records.is_empty() {
            return Ok(UpdateReport::default());
        }
        let mapping = self.mapping::<T>()?;
        let builder = UpdateBuilder::new(&mapping, self.config.include_primary_key_in_set)?;
        let sql = builder.render(conn.dialect())?;

        transaction(conn, |conn| {
            let mut affected = Vec::with_capacity(records.len());
            for record in records {
                let params = builder.params(record)?;
                let ctx = QueryContext::new(&sql, params.len())
                    .with_tag(self.config.bulk_tag.as_str())
                    .with_field("table", mapping.table_name());
                affected.push(self.execute(conn, &sql, &params, ctx)?);
            }
            Ok(UpdateReport { affected })
        })
    }

    /// Delete records by primary key with one `DELETE ... IN (...)`.
    ///
    /// Keys are quoted by the connection and embedded in the statement. No
    /// transaction is opened. An empty slice is a no-op.
    pub fn delete<T, C>(&self, conn: &mut C, records: &[T]) -> OrmResult<u64>
    where
        T: Entity,
        C: Connection + ?Sized,
    {
        if records.is_empty() {
            return Ok(0);
        }
        let mapping = self.mapping::<T>()?;
        let sql = DeleteBuilder::new(&mapping).build(records, |value| conn.quote_literal(value))?;
        let params = Params::none();
        let ctx = QueryContext::new(&sql, 0).with_field("table", mapping.table_name());
        self.execute(conn, &sql, &params, ctx)
    }

    /// Fetch every `T` whose fields equal the given criteria.
    ///
    /// Unknown fields fail with [`OrmError::InvalidField`](crate::OrmError::InvalidField)
    /// before any statement is sent.
    pub fn find_by<T, C>(&self, conn: &mut C, criteria: &Criteria) -> OrmResult<Vec<T>>
    where
        T: Entity,
        C: Connection + ?Sized,
    {
        let mapping = self.mapping::<T>()?;
        let stmt = SelectBuilder::new(&mapping, std::any::type_name::<T>())
            .build(criteria)?
            .render(conn.dialect())?;
        let rows = self.query(conn, &stmt, &mapping)?;
        materialize(&rows, &mapping)
    }

    /// Fetch every `T`.
    pub fn find_all<T, C>(&self, conn: &mut C) -> OrmResult<Vec<T>>
    where
        T: Entity,
        C: Connection + ?Sized,
    {
        self.find_by(conn, &Criteria::new())
    }

    /// Fetch the first `T` matching the criteria, if any.
    pub fn find_one_by<T, C>(&self, conn: &mut C, criteria: &Criteria) -> OrmResult<Option<T>>
    where
        T: Entity,
        C: Connection + ?Sized,
    {
        let mapping = self.mapping::<T>()?;
        let mut sql = SelectBuilder::new(&mapping, std::any::type_name::<T>()).build(criteria)?;
        sql.push(" LIMIT 1");
        let stmt = sql.render(conn.dialect())?;
        let rows = self.query(conn, &stmt, &mapping)?;
        rows.first()
            .map(|row| T::from_row(&FieldRow::new(row, &mapping)))
            .transpose()
    }

    fn context(&self, stmt: &Statement, mapping: &Mapping) -> QueryContext {
        QueryContext::new(&stmt.sql, stmt.params.len()).with_field("table", mapping.table_name())
    }

    fn execute<C: Connection + ?Sized>(
        &self,
        conn: &mut C,
        sql: &str,
        params: &Params,
        ctx: QueryContext,
    ) -> OrmResult<u64> {
        self.logger.before_query(&ctx);
        let start = Instant::now();
        let result = conn.execute(sql, params);
        let outcome = match &result {
            Ok(n) => QueryResult::Affected(*n),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.logger.after_query(&ctx, start.elapsed(), &outcome);
        result
    }

    fn query<C: Connection + ?Sized>(
        &self,
        conn: &mut C,
        stmt: &Statement,
        mapping: &Mapping,
    ) -> OrmResult<Vec<Row>> {
        let ctx = self.context(stmt, mapping);
        self.logger.before_query(&ctx);
        let start = Instant::now();
        let result = conn.query(&stmt.sql, &stmt.params);
        let outcome = match &result {
            Ok(rows) => QueryResult::Rows(rows.len()),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.logger.after_query(&ctx, start.elapsed(), &outcome);
        result
    }
}

fn materialize<T: Entity>(rows: &[Row], mapping: &Mapping) -> OrmResult<Vec<T>> {
    rows.iter()
        .map(|row| T::from_row(&FieldRow::new(row, mapping)))
        .collect()
}

impl<P: MappingProvider + Default> Default for OrmLite<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P: MappingProvider + std::fmt::Debug> std::fmt::Debug for OrmLite<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrmLite")
            .field("provider", &self.provider)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
