use astra::{
    BindValue, BoundStatement, Error, Result, RowLabeled, RowSet, Session, Value, truncate_long,
};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

/// Statement understood by [`MemorySession`], parsed at prepare time.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryStatement {
    Insert {
        keyspace: String,
        table: String,
        columns: Vec<String>,
        using_timestamp: bool,
        ttl: bool,
        if_not_exists: bool,
    },
    Select {
        keyspace: String,
        table: String,
        /// Empty means `*`.
        columns: Vec<String>,
        filters: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPrepared {
    pub id: usize,
    pub cql: String,
    pub statement: MemoryStatement,
}

type Table = Vec<BTreeMap<String, Value>>;

/// In-memory store speaking the CQL subset written by the client.
///
/// Inserts are upserts on the primary key of the table (the first inserted column
/// unless configured), unset values leave stored columns untouched and conditional
/// inserts report `[applied]`. Every prepare and execution is recorded.
#[derive(Default)]
pub struct MemorySession {
    keyspace: Option<String>,
    primary_keys: HashMap<String, Vec<String>>,
    tables: Mutex<HashMap<(String, String), Table>>,
    prepared: Mutex<Vec<String>>,
    executed: Mutex<Vec<BoundStatement<MemoryPrepared>>>,
    fail_prepare: AtomicBool,
    fail_execute: AtomicBool,
}

impl MemorySession {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    pub fn with_primary_key<I, S>(mut self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys
            .insert(table.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    /// Make every following prepare fail.
    pub fn fail_prepare(&self, fail: bool) {
        self.fail_prepare.store(fail, Ordering::Relaxed);
    }

    /// Make every following execution fail.
    pub fn fail_execute(&self, fail: bool) {
        self.fail_execute.store(fail, Ordering::Relaxed);
    }

    /// Number of prepare calls so far.
    pub fn prepare_count(&self) -> usize {
        lock(&self.prepared).len()
    }

    /// The statements prepared, in call order.
    pub fn prepared(&self) -> Vec<String> {
        lock(&self.prepared).clone()
    }

    /// The statements executed, in call order.
    pub fn executed(&self) -> Vec<BoundStatement<MemoryPrepared>> {
        lock(&self.executed).clone()
    }

    pub fn last_executed(&self) -> Option<BoundStatement<MemoryPrepared>> {
        lock(&self.executed).last().cloned()
    }

    /// Current content of a table, missing tables are empty.
    pub fn rows(&self, keyspace: &str, table: &str) -> Vec<BTreeMap<String, Value>> {
        lock(&self.tables)
            .get(&(keyspace.to_owned(), table.to_owned()))
            .cloned()
            .unwrap_or_default()
    }

    fn insert(
        &self,
        keyspace: &str,
        table: &str,
        columns: &[String],
        values: &[BindValue],
        if_not_exists: bool,
    ) -> Result<RowSet<RowLabeled>> {
        let key_columns = self
            .primary_keys
            .get(table)
            .cloned()
            .or_else(|| columns.first().map(|v| vec![v.clone()]))
            .unwrap_or_default();
        let mut key = Vec::with_capacity(key_columns.len());
        for name in &key_columns {
            match columns
                .iter()
                .position(|c| c == name)
                .and_then(|i| values.get(i))
            {
                Some(BindValue::Set(v)) => key.push(v.clone()),
                _ => {
                    return Err(Error::msg(format!(
                        "Missing value for the primary key column `{}` of {}.{}",
                        name, keyspace, table
                    )));
                }
            }
        }
        let mut tables = lock(&self.tables);
        let rows = tables
            .entry((keyspace.to_owned(), table.to_owned()))
            .or_default();
        let existing = rows.iter().position(|row| {
            key_columns
                .iter()
                .zip(&key)
                .all(|(c, k)| row.get(c) == Some(k))
        });
        if if_not_exists && let Some(i) = existing {
            let (names, values): (Vec<String>, Vec<Value>) = rows[i]
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .unzip();
            let mut row = vec![Value::Boolean(Some(false))];
            row.extend(values);
            return Ok(RowSet::labeled(
                std::iter::once("[applied]".to_owned()).chain(names),
                [row],
            ));
        }
        let row = match existing {
            Some(i) => &mut rows[i],
            None => {
                rows.push(Default::default());
                let last = rows.len() - 1;
                &mut rows[last]
            }
        };
        for (column, value) in columns.iter().zip(values) {
            if let BindValue::Set(value) = value {
                row.insert(column.clone(), value.clone());
            }
        }
        Ok(if if_not_exists {
            RowSet::labeled(["[applied]"], [vec![Value::Boolean(Some(true))]])
        } else {
            RowSet::default()
        })
    }

    fn select(
        &self,
        keyspace: &str,
        table: &str,
        columns: &[String],
        filters: &[String],
        values: &[BindValue],
    ) -> Result<RowSet<RowLabeled>> {
        let tables = lock(&self.tables);
        let rows = tables
            .get(&(keyspace.to_owned(), table.to_owned()))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let columns: Vec<String> = if columns.is_empty() {
            rows.iter()
                .flat_map(|r| r.keys().cloned())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        } else {
            columns.to_vec()
        };
        let mut conditions = Vec::with_capacity(filters.len());
        for (column, value) in filters.iter().zip(values) {
            let BindValue::Set(value) = value else {
                return Err(Error::msg(format!("Filter `{}` is unset", column)));
            };
            conditions.push((column, value));
        }
        let matching = rows
            .iter()
            .filter(|row| conditions.iter().all(|(c, v)| row.get(*c) == Some(*v)))
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        Ok(RowSet::labeled(columns, matching))
    }
}

impl Session for MemorySession {
    type Prepared = MemoryPrepared;
    type Row = RowLabeled;

    fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    async fn prepare(&self, cql: &str) -> Result<MemoryPrepared> {
        let mut prepared = lock(&self.prepared);
        prepared.push(cql.to_owned());
        if self.fail_prepare.load(Ordering::Relaxed) {
            return Err(Error::msg("Memory session configured to fail on prepare"));
        }
        let statement = parse_statement(cql)
            .ok_or_else(|| Error::msg(format!("Unsupported statement: {}", truncate_long!(cql))))?;
        Ok(MemoryPrepared {
            id: prepared.len(),
            cql: cql.to_owned(),
            statement,
        })
    }

    async fn execute(
        &self,
        statement: BoundStatement<MemoryPrepared>,
    ) -> Result<RowSet<RowLabeled>> {
        lock(&self.executed).push(statement.clone());
        if self.fail_execute.load(Ordering::Relaxed) {
            return Err(Error::msg("Memory session configured to fail on execute"));
        }
        match &statement.prepared.statement {
            MemoryStatement::Insert {
                keyspace,
                table,
                columns,
                using_timestamp,
                ttl,
                if_not_exists,
            } => {
                let expected =
                    columns.len() + usize::from(*using_timestamp) + usize::from(*ttl);
                if statement.values.len() != expected {
                    return Err(Error::msg(format!(
                        "Expected {} bound values, found {}",
                        expected,
                        statement.values.len()
                    )));
                }
                self.insert(
                    keyspace,
                    table,
                    columns,
                    &statement.values[..columns.len()],
                    *if_not_exists,
                )
            }
            MemoryStatement::Select {
                keyspace,
                table,
                columns,
                filters,
            } => {
                if statement.values.len() != filters.len() {
                    return Err(Error::msg(format!(
                        "Expected {} bound values, found {}",
                        filters.len(),
                        statement.values.len()
                    )));
                }
                self.select(keyspace, table, columns, filters, &statement.values)
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Split at `separator` outside of double quotes.
fn split_outside_quotes<'a>(value: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    let mut i = 0;
    while i < value.len() {
        let rest = &value[i..];
        if rest.starts_with('"') {
            quoted = !quoted;
        } else if !quoted && rest.starts_with(separator) {
            result.push(&value[start..i]);
            i += separator.len();
            start = i;
            continue;
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
    }
    result.push(&value[start..]);
    result
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace(r#""""#, r#"""#),
        None => value.to_owned(),
    }
}

fn table_ref(value: &str) -> Option<(String, String)> {
    match split_outside_quotes(value.trim(), ".").as_slice() {
        [keyspace, table] => Some((unquote(keyspace), unquote(table))),
        _ => None,
    }
}

fn identifiers(value: &str) -> Vec<String> {
    split_outside_quotes(value, ",")
        .into_iter()
        .map(unquote)
        .collect()
}

pub fn parse_statement(cql: &str) -> Option<MemoryStatement> {
    if let Some(rest) = cql.strip_prefix("INSERT INTO ") {
        let (head, tail) = rest.split_once(") VALUES (")?;
        let (table, columns) = head.split_once(" (")?;
        let (keyspace, table) = table_ref(table)?;
        return Some(MemoryStatement::Insert {
            keyspace,
            table,
            columns: identifiers(columns),
            using_timestamp: tail.contains("TIMESTAMP ?"),
            ttl: tail.contains("TTL ?"),
            if_not_exists: tail.trim_end().ends_with("IF NOT EXISTS"),
        });
    }
    if let Some(rest) = cql.strip_prefix("SELECT ") {
        let parts = split_outside_quotes(rest, " FROM ");
        let [columns, source] = parts.as_slice() else {
            return None;
        };
        let parts = split_outside_quotes(source, " WHERE ");
        let (table, filters) = match parts.as_slice() {
            [table] => (*table, Vec::new()),
            [table, filters] => (
                *table,
                split_outside_quotes(filters, " AND ")
                    .into_iter()
                    .map(|v| unquote(v.trim().strip_suffix("= ?").unwrap_or(v)))
                    .collect(),
            ),
            _ => return None,
        };
        let (keyspace, table) = table_ref(table)?;
        let columns = if columns.trim() == "*" {
            Vec::new()
        } else {
            identifiers(columns)
        };
        return Some(MemoryStatement::Select {
            keyspace,
            table,
            columns,
            filters,
        });
    }
    None
}
