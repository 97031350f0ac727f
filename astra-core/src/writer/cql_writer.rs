use crate::separated_by;
use time::OffsetDateTime;

/// Renders the CQL statements issued by the client and their statement cache keys.
///
/// Every method has a default implementation producing standard CQL. A session
/// can hand out its own writer to tweak single fragments.
pub trait CqlWriter: Send + Sync {
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Identifiers made only of `[A-Za-z0-9_]` are written as is, anything else is
    /// double quoted with inner quotes doubled.
    fn write_identifier(&self, out: &mut String, value: &str) {
        if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            out.push_str(value);
        } else {
            out.push('"');
            self.write_escaped(out, value, '"', r#""""#);
            out.push('"');
        }
    }

    /// A name inside a statement cache key. Plain names are kept, anything else is
    /// quoted like an identifier so separators inside names cannot shift the parts.
    fn write_key_part(&self, out: &mut String, value: &str) {
        if value.is_empty() {
            out.push_str(r#""""#);
        } else {
            self.write_identifier(out, value);
        }
    }

    fn write_table_ref(&self, out: &mut String, keyspace: &str, table: &str) {
        self.write_identifier(out, keyspace);
        out.push('.');
        self.write_identifier(out, table);
    }

    /// `INSERT INTO ks.t (c1, c2) VALUES (?, ?) [USING TIMESTAMP ? [AND TTL ?]] [IF NOT EXISTS]`
    ///
    /// Bind markers of the `USING` clause come after the column markers, timestamp
    /// first. A TTL is written only when positive.
    #[allow(clippy::too_many_arguments)]
    fn write_insert(
        &self,
        out: &mut String,
        keyspace: &str,
        table: &str,
        columns: &[&str],
        if_not_exists: bool,
        ttl_seconds: Option<i32>,
        using_timestamp: Option<OffsetDateTime>,
    ) {
        out.push_str("INSERT INTO ");
        self.write_table_ref(out, keyspace, table);
        out.push_str(" (");
        separated_by(out, columns, |out, v| self.write_identifier(out, v), ", ");
        out.push_str(") VALUES (");
        separated_by(out, columns, |out, _| out.push('?'), ", ");
        out.push(')');
        self.write_using(out, ttl_seconds, using_timestamp);
        if if_not_exists {
            out.push_str(" IF NOT EXISTS");
        }
    }

    fn write_using(
        &self,
        out: &mut String,
        ttl_seconds: Option<i32>,
        using_timestamp: Option<OffsetDateTime>,
    ) {
        let ttl = ttl_seconds.is_some_and(|v| v > 0);
        if using_timestamp.is_none() && !ttl {
            return;
        }
        out.push_str(" USING ");
        let mut parts = Vec::with_capacity(2);
        if using_timestamp.is_some() {
            parts.push("TIMESTAMP ?");
        }
        if ttl {
            parts.push("TTL ?");
        }
        separated_by(out, parts, |out, v| out.push_str(v), " AND ");
    }

    /// Statement cache key of an insert, distinct for every combination of flags.
    ///
    /// Names go through [`CqlWriter::write_key_part`]: `ks|t|c1,c2|NOIF|NOTS|NOTTL`.
    fn insert_cache_key(
        &self,
        keyspace: &str,
        table: &str,
        columns: &[&str],
        if_not_exists: bool,
        ttl_seconds: Option<i32>,
        using_timestamp: Option<OffsetDateTime>,
    ) -> String {
        let mut out = String::with_capacity(
            keyspace.len() + table.len() + columns.iter().map(|v| v.len() + 1).sum::<usize>() + 24,
        );
        self.write_key_part(&mut out, keyspace);
        out.push('|');
        self.write_key_part(&mut out, table);
        out.push('|');
        separated_by(&mut out, columns, |out, v| self.write_key_part(out, v), ",");
        out.push('|');
        out.push_str(if if_not_exists { "IFNE" } else { "NOIF" });
        out.push('|');
        out.push_str(if using_timestamp.is_some() { "TS" } else { "NOTS" });
        out.push('|');
        out.push_str(if ttl_seconds.is_some_and(|v| v > 0) {
            "TTL"
        } else {
            "NOTTL"
        });
        out
    }

    /// `SELECT c1, c2 FROM ks.t [WHERE k1 = ? AND k2 = ?]`, `*` without columns.
    fn write_select(
        &self,
        out: &mut String,
        keyspace: &str,
        table: &str,
        columns: &[&str],
        filters: &[&str],
    ) {
        out.push_str("SELECT ");
        if columns.is_empty() {
            out.push('*');
        } else {
            separated_by(out, columns, |out, v| self.write_identifier(out, v), ", ");
        }
        out.push_str(" FROM ");
        self.write_table_ref(out, keyspace, table);
        if !filters.is_empty() {
            out.push_str(" WHERE ");
            separated_by(
                out,
                filters,
                |out, v| {
                    self.write_identifier(out, v);
                    out.push_str(" = ?");
                },
                " AND ",
            );
        }
    }

    fn select_cache_key(
        &self,
        keyspace: &str,
        table: &str,
        columns: &[&str],
        filters: &[&str],
    ) -> String {
        let mut out = String::from("SELECT|");
        self.write_key_part(&mut out, keyspace);
        out.push('|');
        self.write_key_part(&mut out, table);
        out.push('|');
        separated_by(&mut out, columns, |out, v| self.write_key_part(out, v), ",");
        out.push('|');
        separated_by(&mut out, filters, |out, v| self.write_key_part(out, v), ",");
        out
    }
}

/// Standard CQL, no customization.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericCqlWriter;

impl CqlWriter for GenericCqlWriter {}

/// The insert statement text, see [`CqlWriter::write_insert`].
pub fn build_insert(
    keyspace: &str,
    table: &str,
    columns: &[&str],
    if_not_exists: bool,
    ttl_seconds: Option<i32>,
    using_timestamp: Option<OffsetDateTime>,
) -> String {
    let mut out = String::with_capacity(64 + columns.len() * 24);
    GenericCqlWriter.write_insert(
        &mut out,
        keyspace,
        table,
        columns,
        if_not_exists,
        ttl_seconds,
        using_timestamp,
    );
    out
}

/// The insert statement cache key, see [`CqlWriter::insert_cache_key`].
pub fn build_cache_key(
    keyspace: &str,
    table: &str,
    columns: &[&str],
    if_not_exists: bool,
    ttl_seconds: Option<i32>,
    using_timestamp: Option<OffsetDateTime>,
) -> String {
    GenericCqlWriter.insert_cache_key(
        keyspace,
        table,
        columns,
        if_not_exists,
        ttl_seconds,
        using_timestamp,
    )
}
