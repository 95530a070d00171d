use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter, types::Value as SqlValue};
use rust_decimal::prelude::ToPrimitive;

use crate::{
    data::Value,
    error::{EtlError, Result},
    table::{ColumnKind, Table},
};

use super::{Sink, SinkReport};

/// Replaces a named table in a SQLite database inside a single transaction.
pub struct SqliteSink {
    conn: Connection,
    target: String,
    table_name: String,
}

impl SqliteSink {
    /// Opens the store behind `connection`. Accepts `sqlite://<path>`,
    /// `sqlite::memory:`, `:memory:` or a bare file path.
    pub fn open(connection: &str, table_name: &str) -> Result<Self> {
        let target = connection.trim().to_string();
        let location = target
            .strip_prefix("sqlite://")
            .or_else(|| target.strip_prefix("sqlite:"))
            .unwrap_or(&target);
        let conn = if location.is_empty() || location == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(location)
        }
        .map_err(|err| connection_error(&target, err))?;
        // Opening is lazy; touch the catalog so an unreadable file fails here.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|err| connection_error(&target, err))?;
        Ok(Self {
            conn,
            target,
            table_name: table_name.to_string(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn ensure_replaceable(&self) -> Result<()> {
        if !identifier_pattern().is_match(&self.table_name) {
            return Err(EtlError::Schema {
                name: self.table_name.clone(),
                reason: "not a valid table identifier".into(),
            });
        }
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT type FROM sqlite_master WHERE name = ?1 COLLATE NOCASE",
                params![self.table_name],
                |row| row.get(0),
            )
            .optional()?;
        match existing.as_deref() {
            None | Some("table") => Ok(()),
            Some(other) => Err(EtlError::Schema {
                name: self.table_name.clone(),
                reason: format!("name is taken by an existing {other}"),
            }),
        }
    }
}

impl Sink for SqliteSink {
    fn persist(&mut self, table: &Table) -> Result<SinkReport> {
        self.ensure_replaceable()?;
        let kinds = (0..table.headers().len())
            .map(|idx| table.column_kind(idx))
            .collect::<Vec<_>>();
        let quoted_table = quote_identifier(&self.table_name);
        let column_defs = table
            .headers()
            .iter()
            .zip(&kinds)
            .map(|(name, kind)| format!("{} {}", quote_identifier(name), sql_type(*kind)))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=table.headers().len())
            .map(|n| format!("?{n}"))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {quoted_table}"), [])?;
        tx.execute(&format!("CREATE TABLE {quoted_table} ({column_defs})"), [])?;
        let mut rows_written = 0usize;
        {
            let mut insert =
                tx.prepare(&format!("INSERT INTO {quoted_table} VALUES ({placeholders})"))?;
            for row in table.rows() {
                let values = row
                    .iter()
                    .zip(&kinds)
                    .map(|(cell, kind)| to_sql_value(cell.as_ref(), *kind));
                insert.execute(params_from_iter(values))?;
                rows_written += 1;
            }
        }
        tx.commit()?;
        debug!(
            "Replaced table {} in {} with {rows_written} row(s)",
            self.table_name, self.target
        );
        Ok(SinkReport {
            destination: format!("{}#{}", self.target, self.table_name),
            rows_written,
        })
    }
}

fn connection_error(target: &str, err: rusqlite::Error) -> EtlError {
    EtlError::Connection {
        target: target.to_string(),
        reason: err.to_string(),
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_type(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Integer => "INTEGER",
        ColumnKind::Decimal => "REAL",
        ColumnKind::Date => "DATE",
        ColumnKind::DateTime => "TIMESTAMP",
        ColumnKind::Text | ColumnKind::Empty => "TEXT",
    }
}

fn to_sql_value(cell: Option<&Value>, kind: ColumnKind) -> SqlValue {
    let Some(value) = cell else {
        return SqlValue::Null;
    };
    match (kind, value) {
        (ColumnKind::Text, other) => SqlValue::Text(other.as_display()),
        (_, Value::Integer(i)) => SqlValue::Integer(*i),
        (_, Value::Decimal(d)) => d.to_f64().map_or(SqlValue::Null, SqlValue::Real),
        (_, other) => SqlValue::Text(other.as_display()),
    }
}
