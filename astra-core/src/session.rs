use crate::{CqlWriter, GenericCqlWriter, MappingError, ResolvedOptions, Result, Row, RowSet, Value};
use std::future::Future;

/// A bind marker value. `Unset` leaves the column untouched instead of writing
/// a null (which would create a tombstone).
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Set(Value),
    Unset,
}

impl BindValue {
    /// `Unset` for any null, `Set` otherwise.
    pub fn unset_if_null(value: Value) -> Self {
        if value.is_null() {
            BindValue::Unset
        } else {
            BindValue::Set(value)
        }
    }
    pub fn is_unset(&self) -> bool {
        matches!(self, BindValue::Unset)
    }
}

impl From<Value> for BindValue {
    fn from(value: Value) -> Self {
        BindValue::Set(value)
    }
}

/// A prepared statement with its bound values and execution options.
#[derive(Debug, Clone)]
pub struct BoundStatement<P> {
    pub prepared: P,
    pub values: Vec<BindValue>,
    pub options: ResolvedOptions,
}

impl<P> BoundStatement<P> {
    pub fn new(prepared: P, values: Vec<BindValue>) -> Self {
        Self {
            prepared,
            values,
            options: Default::default(),
        }
    }
    pub fn with_options(mut self, options: ResolvedOptions) -> Self {
        self.options = options;
        self
    }
}

/// Connection to the store, supplied by a driver.
///
/// Only `prepare` and `execute` perform I/O. The session is shared by reference
/// and must tolerate concurrent calls.
pub trait Session: Send + Sync {
    type Prepared: Clone + Send + Sync + 'static;
    type Row: Row + Send;

    /// Keyspace the session is bound to, if any.
    fn keyspace(&self) -> Option<&str>;

    fn cql_writer(&self) -> &dyn CqlWriter {
        &GenericCqlWriter
    }

    fn prepare(&self, cql: &str) -> impl Future<Output = Result<Self::Prepared>> + Send;

    fn bind(
        &self,
        prepared: &Self::Prepared,
        values: Vec<BindValue>,
    ) -> Result<BoundStatement<Self::Prepared>> {
        Ok(BoundStatement::new(prepared.clone(), values))
    }

    fn execute(
        &self,
        statement: BoundStatement<Self::Prepared>,
    ) -> impl Future<Output = Result<RowSet<Self::Row>>> + Send;
}

/// The explicit keyspace when not blank, else the session keyspace.
pub fn resolve_keyspace<S: Session + ?Sized>(session: &S, explicit: Option<&str>) -> Result<String> {
    explicit
        .filter(|v| !v.trim().is_empty())
        .or_else(|| session.keyspace().filter(|v| !v.trim().is_empty()))
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            MappingError::invalid_argument(
                "Keyspace is required (pass it explicitly or bind the session to one)",
            )
            .into()
        })
}
