//! In-memory order table.
//!
//! A `Table` is a header row plus rectangular rows of optional cells. Stages
//! take a table by value and hand back a new one, so nothing outside the
//! pipeline observes intermediate state.

use crate::{
    data::Value,
    error::{EtlError, Result},
};

pub type Cell = Option<Value>;
pub type Row = Vec<Cell>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
}

/// Storage class shared by every non-missing cell of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Decimal,
    Date,
    DateTime,
    Text,
    Empty,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(EtlError::Format(format!(
                "row {} has {} cell(s) but the header declares {}",
                idx + 1,
                row.len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| EtlError::MissingColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_ref()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Row>) {
        (self.headers, self.rows)
    }

    /// Sets `name` to `values`, appending the column when it does not exist yet.
    pub fn upsert_column(&mut self, name: &str, values: Vec<Cell>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(EtlError::Format(format!(
                "column '{name}' has {} value(s) for {} row(s)",
                values.len(),
                self.rows.len()
            )));
        }
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Classifies a column by the cells it holds. Integer columns that also
    /// carry decimals widen to `Decimal`; any other mix falls back to `Text`.
    pub fn column_kind(&self, idx: usize) -> ColumnKind {
        let mut kind = ColumnKind::Empty;
        for cell in self.rows.iter().filter_map(|row| row[idx].as_ref()) {
            let cell_kind = match cell {
                Value::Integer(_) => ColumnKind::Integer,
                Value::Decimal(_) => ColumnKind::Decimal,
                Value::Date(_) => ColumnKind::Date,
                Value::DateTime(_) => ColumnKind::DateTime,
                Value::Text(_) => ColumnKind::Text,
            };
            kind = match (kind, cell_kind) {
                (ColumnKind::Empty, next) => next,
                (current, next) if current == next => current,
                (ColumnKind::Integer, ColumnKind::Decimal)
                | (ColumnKind::Decimal, ColumnKind::Integer) => ColumnKind::Decimal,
                (ColumnKind::Date, ColumnKind::DateTime)
                | (ColumnKind::DateTime, ColumnKind::Date) => ColumnKind::DateTime,
                _ => return ColumnKind::Text,
            };
        }
        kind
    }

    /// Renders every row as display strings; missing cells become empty strings.
    pub fn display_rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|row| {
            row.iter()
                .map(|cell| cell.as_ref().map(Value::as_display).unwrap_or_default())
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Table::new(headers(&["a", "b"]), vec![vec![None]]).unwrap_err();
        assert!(matches!(err, EtlError::Format(_)));
    }

    #[test]
    fn upsert_appends_then_replaces() {
        let mut table = Table::new(headers(&["a"]), vec![vec![Some(Value::Integer(1))]]).unwrap();
        table
            .upsert_column("b", vec![Some(Value::Text("x".into()))])
            .unwrap();
        assert_eq!(table.headers(), &["a".to_string(), "b".to_string()]);
        table
            .upsert_column("b", vec![Some(Value::Text("y".into()))])
            .unwrap();
        assert_eq!(table.headers().len(), 2);
        assert_eq!(table.cell(0, "b"), Some(&Value::Text("y".into())));
    }

    #[test]
    fn column_kind_widens_integers_and_ignores_missing() {
        let table = Table::new(
            headers(&["n", "t"]),
            vec![
                vec![Some(Value::Integer(1)), Some(Value::Integer(1))],
                vec![None, Some(Value::Text("x".into()))],
                vec![Some(Value::Decimal(Decimal::new(15, 1))), None],
            ],
        )
        .unwrap();
        assert_eq!(table.column_kind(0), ColumnKind::Decimal);
        assert_eq!(table.column_kind(1), ColumnKind::Text);
    }

    #[test]
    fn missing_required_column_is_reported_by_name() {
        let table = Table::new(headers(&["a"]), Vec::new()).unwrap();
        match table.require_column("sales") {
            Err(EtlError::MissingColumn(name)) => assert_eq!(name, "sales"),
            other => panic!("unexpected result {other:?}"),
        }
    }
}
