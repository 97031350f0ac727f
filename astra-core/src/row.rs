use crate::Value;
use std::sync::Arc;

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;

/// Read access to a result row by column name.
///
/// Implemented by the session's row type. Lookups fall back to an ASCII case
/// insensitive match since unquoted CQL identifiers are case folded.
pub trait Row {
    /// Whether the row has the column at all.
    fn contains(&self, column: &str) -> bool;
    /// Whether the column is missing or holds null.
    fn is_null(&self, column: &str) -> bool {
        self.get_value(column).is_none_or(|v| v.is_null())
    }
    /// Owned value of the column, `None` when missing.
    fn get_value(&self, column: &str) -> Option<Value>;
}

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Box<[Value]>,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Box<[Value]>) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    fn position(&self, name: &str) -> Option<usize> {
        self.labels
            .iter()
            .position(|v| v == name)
            .or_else(|| self.labels.iter().position(|v| v.eq_ignore_ascii_case(name)))
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.position(name).and_then(|i| self.values.get(i))
    }
}

impl Row for RowLabeled {
    fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }
    fn get_value(&self, column: &str) -> Option<Value> {
        self.get_column(column).cloned()
    }
}

impl<R: Row + ?Sized> Row for &R {
    fn contains(&self, column: &str) -> bool {
        (**self).contains(column)
    }
    fn is_null(&self, column: &str) -> bool {
        (**self).is_null(column)
    }
    fn get_value(&self, column: &str) -> Option<Value> {
        (**self).get_value(column)
    }
}

/// Rows returned by an execution, with the column names of the result set.
#[derive(Debug, Clone)]
pub struct RowSet<R> {
    pub columns: RowNames,
    pub rows: Vec<R>,
}

impl<R> Default for RowSet<R> {
    fn default() -> Self {
        Self {
            columns: Arc::new([]),
            rows: Vec::new(),
        }
    }
}

impl<R> RowSet<R> {
    pub fn new(columns: RowNames, rows: Vec<R>) -> Self {
        Self { columns, rows }
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R: Row> RowSet<R> {
    /// Outcome of a conditional statement, read from the `[applied]` column.
    ///
    /// Plain statements return no such column and count as applied.
    pub fn was_applied(&self) -> bool {
        match self.rows.first().and_then(|r| r.get_value("[applied]")) {
            Some(Value::Boolean(Some(applied))) => applied,
            _ => true,
        }
    }
}

impl RowSet<RowLabeled> {
    /// Build a row set sharing one label list across all the rows.
    pub fn labeled(
        columns: impl IntoIterator<Item = impl Into<String>>,
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> Self {
        let columns: RowNames = columns.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|values| RowLabeled::new(columns.clone(), values.into()))
            .collect();
        Self { columns, rows }
    }
}
