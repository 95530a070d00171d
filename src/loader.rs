//! Reads a delimited file into a `Table`.
//!
//! Cells are typed only as far as the text itself implies: a column whose
//! non-empty fields are all integers becomes integer, all-numeric becomes
//! decimal, anything else stays text. Dates stay text until the cleaner
//! parses them.

use std::{io::Read, path::Path};

use encoding_rs::Encoding;
use itertools::Itertools;

use crate::{
    data::{Value, parse_decimal},
    error::{EtlError, Result},
    io_utils,
    table::{Row, Table},
};

/// Sentinel tokens that spreadsheet and dataframe exports write for a missing
/// value. Matched exactly, like an empty field.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing_token(field: &str) -> bool {
    field.is_empty() || NA_TOKENS.contains(&field)
}

#[derive(Debug, Clone, Copy)]
struct PrimitiveCandidate {
    possible_integer: bool,
    possible_decimal: bool,
}

impl PrimitiveCandidate {
    fn new() -> Self {
        Self {
            possible_integer: true,
            possible_decimal: true,
        }
    }

    fn observe(&mut self, field: &str) {
        if self.possible_integer && field.trim().parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_decimal && parse_decimal(field).is_none() {
            self.possible_decimal = false;
        }
    }

    fn convert(&self, field: String) -> Option<Value> {
        if is_missing_token(&field) {
            return None;
        }
        if self.possible_integer
            && let Ok(parsed) = field.trim().parse::<i64>()
        {
            return Some(Value::Integer(parsed));
        }
        if self.possible_decimal
            && let Some(parsed) = parse_decimal(&field)
        {
            return Some(Value::Decimal(parsed));
        }
        Some(Value::Text(field))
    }
}

pub fn load_table(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Table> {
    if !io_utils::is_dash(path) && !path.exists() {
        return Err(EtlError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "input file does not exist"),
        ));
    }
    let reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    read_table(reader, path, encoding)
}

pub fn load_from_reader<R: Read>(
    reader: R,
    label: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Table> {
    read_table(io_utils::open_csv_reader(reader, delimiter), label, encoding)
}

fn read_table<R: Read>(
    mut reader: csv::Reader<R>,
    label: &Path,
    encoding: &'static Encoding,
) -> Result<Table> {
    let header_record = reader
        .byte_headers()
        .map_err(|err| EtlError::from_csv(label, err))?
        .clone();
    let headers = io_utils::decode_record(&header_record, encoding)?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(EtlError::Format(format!(
            "{} has no header row",
            label.display()
        )));
    }
    if let Some(dup) = headers.iter().duplicates().next() {
        return Err(EtlError::Format(format!(
            "{} declares column '{dup}' more than once",
            label.display()
        )));
    }

    let mut candidates = vec![PrimitiveCandidate::new(); headers.len()];
    let mut raw_rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|err| EtlError::from_csv(label, err))?;
        let decoded = io_utils::decode_record(&record, encoding)?;
        for (candidate, field) in candidates.iter_mut().zip(&decoded) {
            if !is_missing_token(field) {
                candidate.observe(field);
            }
        }
        raw_rows.push(decoded);
    }

    let rows = raw_rows
        .into_iter()
        .map(|fields| {
            fields
                .into_iter()
                .zip(&candidates)
                .map(|(field, candidate)| candidate.convert(field))
                .collect::<Row>()
        })
        .collect();
    Table::new(headers, rows)
}
