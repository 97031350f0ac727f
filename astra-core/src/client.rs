use crate::{
    BindValue, Context, Entity, ExecOptions, Fields, Mapper, MappingError, MappingRegistry,
    PreparedCache, RequestDefaults, ResolvedOptions, Result, Row, RowSet, Session, Value,
    effective_read, effective_write, resolve_keyspace, summarize_keys, truncate_long,
};
use std::sync::Arc;
use time::OffsetDateTime;

/// Outcome of a write.
///
/// `success` is false when the store could not be reached or rejected the
/// statement, and when a conditional insert found an existing row.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    pub success: bool,
}

impl WriteResult {
    pub fn applied() -> Self {
        Self { success: true }
    }
    pub fn failed() -> Self {
        Self { success: false }
    }
}

/// Reads and writes documents and entities through a [`Session`].
///
/// Arguments are validated before any I/O and invalid ones are returned as
/// [`MappingError`]. Failures of the store itself are logged and reported through
/// [`WriteResult::success`] or an empty read.
pub struct CqlClient<S: Session> {
    session: S,
    mapper: Mapper,
    statements: PreparedCache<S::Prepared>,
    defaults: RequestDefaults,
}

impl<S: Session> CqlClient<S> {
    pub fn new(session: S, registry: Arc<MappingRegistry>, defaults: RequestDefaults) -> Self {
        Self {
            session,
            mapper: Mapper::new(registry),
            statements: PreparedCache::new(),
            defaults,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn registry(&self) -> &MappingRegistry {
        self.mapper.registry()
    }

    pub fn defaults(&self) -> &RequestDefaults {
        &self.defaults
    }

    pub fn statements(&self) -> &PreparedCache<S::Prepared> {
        &self.statements
    }

    pub fn map_to_fields<E: Entity>(&self, entity: &E) -> Result<Fields> {
        self.mapper.to_fields(entity)
    }

    pub fn map_from_row<E: Entity>(&self, row: &impl Row) -> Result<E> {
        self.mapper.from_row(row, None)
    }

    /// Upsert one row built from `fields`.
    ///
    /// Null values are bound as unset. The options are merged with the write
    /// profile of the environment.
    pub async fn write(
        &self,
        keyspace: Option<&str>,
        table: &str,
        fields: &Fields,
        options: Option<&ExecOptions>,
    ) -> Result<WriteResult> {
        let keyspace = resolve_keyspace(&self.session, keyspace)?;
        let options = effective_write(options, &self.defaults);
        self.write_resolved(&keyspace, table, fields, options).await
    }

    /// Upsert a document through a caller provided field extraction.
    pub async fn write_with<D, F>(
        &self,
        keyspace: Option<&str>,
        table: &str,
        document: &D,
        to_fields: F,
        options: Option<&ExecOptions>,
    ) -> Result<WriteResult>
    where
        D: ?Sized,
        F: FnOnce(&D) -> Fields,
    {
        let fields = to_fields(document);
        self.write(keyspace, table, &fields, options).await
    }

    /// Upsert an entity into its mapped table.
    ///
    /// The keyspace is the explicit one, else the one configured for the type,
    /// else the session keyspace.
    pub async fn write_entity<E: Entity>(
        &self,
        keyspace: Option<&str>,
        entity: &E,
        options: Option<&ExecOptions>,
    ) -> Result<WriteResult> {
        let keyspace = self.entity_keyspace::<E>(keyspace)?;
        let table = self.mapper.table_name::<E>();
        let fields = self.mapper.to_fields(entity)?;
        let options = effective_write(options, &self.defaults);
        self.write_resolved(&keyspace, &table, &fields, options)
            .await
    }

    /// Rows of `table` matching every filter by equality, mapped to `E`.
    pub async fn read<E: Entity>(
        &self,
        keyspace: Option<&str>,
        table: &str,
        filters: &Fields,
        options: Option<&ExecOptions>,
    ) -> Result<Vec<E>> {
        let keyspace = resolve_keyspace(&self.session, keyspace)?;
        let options = effective_read(options, &self.defaults);
        self.read_resolved(&keyspace, table, filters, options).await
    }

    /// Rows of the table mapped to `E`.
    pub async fn read_entities<E: Entity>(
        &self,
        keyspace: Option<&str>,
        filters: &Fields,
        options: Option<&ExecOptions>,
    ) -> Result<Vec<E>> {
        let keyspace = self.entity_keyspace::<E>(keyspace)?;
        let table = self.mapper.table_name::<E>();
        let options = effective_read(options, &self.defaults);
        self.read_resolved(&keyspace, &table, filters, options)
            .await
    }

    fn entity_keyspace<E: Entity>(&self, explicit: Option<&str>) -> Result<String> {
        let explicit = explicit
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.registry().resolve_keyspace::<E>());
        resolve_keyspace(&self.session, explicit)
    }

    async fn write_resolved(
        &self,
        keyspace: &str,
        table: &str,
        fields: &Fields,
        options: ResolvedOptions,
    ) -> Result<WriteResult> {
        if table.trim().is_empty() {
            return Err(MappingError::invalid_argument("Table name is required").into());
        }
        if fields.is_empty() {
            return Err(MappingError::invalid_argument(format!(
                "At least one field is required to write into {keyspace}.{table}"
            ))
            .into());
        }
        if options.if_not_exists && options.using_timestamp.is_some() {
            return Err(MappingError::not_supported(
                "A client timestamp cannot be combined with a conditional insert (IF NOT EXISTS)",
            )
            .into());
        }
        log::info!(
            "Writing into {}.{} the fields: {}",
            keyspace,
            table,
            summarize_keys(fields.columns())
        );
        let columns: Vec<&str> = fields.columns().collect();
        let ttl_seconds = options.ttl_seconds.filter(|v| *v > 0);
        let writer = self.session.cql_writer();
        let mut cql = String::with_capacity(64 + columns.len() * 24);
        writer.write_insert(
            &mut cql,
            keyspace,
            table,
            &columns,
            options.if_not_exists,
            ttl_seconds,
            options.using_timestamp,
        );
        let key = writer.insert_cache_key(
            keyspace,
            table,
            &columns,
            options.if_not_exists,
            ttl_seconds,
            options.using_timestamp,
        );
        let mut values: Vec<BindValue> = fields
            .values()
            .map(|v| BindValue::unset_if_null(v.clone()))
            .collect();
        if let Some(timestamp) = options.using_timestamp {
            values.push(BindValue::Set(Value::BigInt(Some(epoch_micros(timestamp)?))));
        }
        if let Some(ttl) = ttl_seconds {
            values.push(BindValue::Set(Value::Int(Some(ttl))));
        }
        let if_not_exists = options.if_not_exists;
        match self.run(&cql, &key, values, options).await {
            Ok(rows) => {
                let applied = !if_not_exists || rows.was_applied();
                if !applied {
                    log::warn!(
                        "Conditional insert into {}.{} not applied, the row already exists",
                        keyspace,
                        table
                    );
                }
                Ok(WriteResult { success: applied })
            }
            Err(e) => {
                let e = e.context(format!("While writing into {}.{}", keyspace, table));
                log::error!("{:#}", e);
                Ok(WriteResult::failed())
            }
        }
    }

    async fn read_resolved<E: Entity>(
        &self,
        keyspace: &str,
        table: &str,
        filters: &Fields,
        options: ResolvedOptions,
    ) -> Result<Vec<E>> {
        if table.trim().is_empty() {
            return Err(MappingError::invalid_argument("Table name is required").into());
        }
        if let Some((column, _)) = filters.iter().find(|(_, v)| v.is_null()) {
            return Err(MappingError::invalid_argument(format!(
                "Filter `{column}` cannot be null"
            ))
            .into());
        }
        log::info!(
            "Reading from {}.{} with filters: {}",
            keyspace,
            table,
            summarize_keys(filters.columns())
        );
        let names = self.mapper.column_names::<E>();
        let columns: Vec<&str> = names.iter().map(String::as_str).collect();
        let filter_columns: Vec<&str> = filters.columns().collect();
        let writer = self.session.cql_writer();
        let mut cql = String::with_capacity(64 + columns.len() * 24);
        writer.write_select(&mut cql, keyspace, table, &columns, &filter_columns);
        let key = writer.select_cache_key(keyspace, table, &columns, &filter_columns);
        let values = filters.values().cloned().map(BindValue::Set).collect();
        let rows = match self.run(&cql, &key, values, options).await {
            Ok(rows) => rows,
            Err(e) => {
                let e = e.context(format!("While reading from {}.{}", keyspace, table));
                log::error!("{:#}", e);
                return Ok(Vec::new());
            }
        };
        let available = (!rows.columns.is_empty()).then_some(&*rows.columns);
        rows.rows
            .iter()
            .map(|row| self.mapper.from_row(row, available))
            .collect()
    }

    async fn run(
        &self,
        cql: &str,
        key: &str,
        values: Vec<BindValue>,
        options: ResolvedOptions,
    ) -> Result<RowSet<S::Row>> {
        let prepared = self
            .statements
            .get_or_prepare(&self.session, cql, key)
            .await?;
        let statement = self
            .session
            .bind(&prepared, values)
            .with_context(|| format!("While binding the values of:\n{}", truncate_long!(cql)))?
            .with_options(options);
        self.session.execute(statement).await
    }
}

/// Microseconds since the Unix epoch, the unit of CQL write timestamps.
fn epoch_micros(value: OffsetDateTime) -> Result<i64> {
    i64::try_from(value.unix_timestamp_nanos().div_euclid(1_000))
        .map_err(|_| MappingError::invalid_argument(format!("Timestamp {value} out of range")).into())
}
