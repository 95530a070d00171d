//! Cleaning stage: date parsing, strict year coercion, tolerant numeric
//! coercion, duplicate removal and the row-validity gate.
//!
//! `clean` is a pure function of its input table. Feeding its output back in
//! yields the same table with nothing removed.

use itertools::Itertools;

use crate::{
    data::{
        Value, coerce_decimal, coerce_integer, integral_decimal, parse_day_first, parse_integer,
        temporal_value,
    },
    error::{EtlError, Result},
    table::{Cell, Row, Table},
};

pub const ORDER_DATE: &str = "order_date";
pub const SHIP_DATE: &str = "ship_date";
pub const YEAR: &str = "year";
pub const SALES: &str = "sales";
pub const DISCOUNT: &str = "discount";
pub const PROFIT: &str = "profit";
pub const SHIPPING_COST: &str = "shipping_cost";
pub const QUANTITY: &str = "quantity";

pub const REQUIRED_COLUMNS: &[&str] = &[
    ORDER_DATE,
    SHIP_DATE,
    YEAR,
    SALES,
    DISCOUNT,
    PROFIT,
    SHIPPING_COST,
    QUANTITY,
];

const DATE_COLUMNS: &[&str] = &[ORDER_DATE, SHIP_DATE];
const DECIMAL_COLUMNS: &[&str] = &[SALES, DISCOUNT, PROFIT, SHIPPING_COST];
/// Rows missing any of these after coercion are dropped.
const LOAD_BEARING_COLUMNS: &[&str] = &[SALES, PROFIT, QUANTITY];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanReport {
    pub rows_in: usize,
    pub duplicates_removed: usize,
    pub invalid_removed: usize,
    pub rows_out: usize,
}

struct Positions {
    dates: Vec<(usize, &'static str)>,
    year: usize,
    decimals: Vec<usize>,
    quantity: usize,
    gate: Vec<usize>,
}

impl Positions {
    fn locate(table: &Table) -> Result<Self> {
        for column in REQUIRED_COLUMNS {
            table.require_column(column)?;
        }
        let many = |names: &[&str]| {
            names
                .iter()
                .map(|name| table.require_column(name))
                .collect::<Result<Vec<_>>>()
        };
        Ok(Self {
            dates: DATE_COLUMNS
                .iter()
                .map(|name| table.require_column(name).map(|idx| (idx, *name)))
                .collect::<Result<Vec<_>>>()?,
            year: table.require_column(YEAR)?,
            decimals: many(DECIMAL_COLUMNS)?,
            quantity: table.require_column(QUANTITY)?,
            gate: many(LOAD_BEARING_COLUMNS)?,
        })
    }
}

pub fn clean(table: Table) -> Result<(Table, CleanReport)> {
    let positions = Positions::locate(&table)?;
    let (headers, mut rows) = table.into_parts();
    let rows_in = rows.len();

    for &(idx, column) in &positions.dates {
        for (row_idx, row) in rows.iter_mut().enumerate() {
            row[idx] = parse_date_cell(row[idx].take(), column, row_idx)?;
        }
    }

    let year_idx = positions.year;
    for (row_idx, row) in rows.iter_mut().enumerate() {
        row[year_idx] = Some(coerce_year(row[year_idx].take(), row_idx)?);
    }

    for row in rows.iter_mut() {
        for &idx in &positions.decimals {
            row[idx] = coerce_decimal(row[idx].as_ref());
        }
        row[positions.quantity] = coerce_integer(row[positions.quantity].as_ref());
    }

    // Compared on coerced values: rows differing only in tokens that coerce
    // identically would otherwise survive one pass and collapse on the next.
    let mut rows = rows.into_iter().unique().collect::<Vec<Row>>();
    let duplicates_removed = rows_in - rows.len();

    let before_gate = rows.len();
    rows.retain(|row| positions.gate.iter().all(|&idx| row[idx].is_some()));
    let invalid_removed = before_gate - rows.len();

    let report = CleanReport {
        rows_in,
        duplicates_removed,
        invalid_removed,
        rows_out: rows.len(),
    };
    Ok((Table::new(headers, rows)?, report))
}

// Missing dates stay missing; anything present must parse.
fn parse_date_cell(cell: Cell, column: &str, row_idx: usize) -> Result<Cell> {
    let Some(value) = cell else {
        return Ok(None);
    };
    if let Some(parsed) = value.as_datetime() {
        return Ok(Some(temporal_value(parsed)));
    }
    let text = value.as_display();
    parse_day_first(&text)
        .map(|parsed| Some(temporal_value(parsed)))
        .ok_or_else(|| EtlError::DateParse {
            column: column.to_string(),
            row: row_idx + 1,
            value: text,
        })
}

fn coerce_year(cell: Cell, row_idx: usize) -> Result<Value> {
    let coerced = match &cell {
        Some(Value::Integer(i)) => Some(*i),
        Some(Value::Decimal(d)) => integral_decimal(*d),
        Some(Value::Text(s)) => parse_integer(s),
        _ => None,
    };
    coerced.map(Value::Integer).ok_or_else(|| EtlError::Type {
        column: YEAR.to_string(),
        row: row_idx + 1,
        value: cell.map(|v| v.as_display()).unwrap_or_default(),
    })
}
