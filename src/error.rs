//! Error taxonomy for the ETL pipeline.
//!
//! Every variant is fatal: the pipeline aborts on the first one. Tolerant
//! coercion failures never surface here; they become missing cells instead.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("I/O failure on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed input table: {0}")]
    Format(String),

    #[error("Column '{column}' row {row}: cannot parse '{value}' as a date")]
    DateParse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Column '{column}' row {row}: cannot coerce '{value}' to an integer")]
    Type {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Required column '{0}' is missing from the input")]
    MissingColumn(String),

    #[error("Cannot open relational store '{target}': {reason}")]
    Connection { target: String, reason: String },

    #[error("Destination '{name}' is incompatible: {reason}")]
    Schema { name: String, reason: String },

    #[error("Relational store error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EtlError>;

impl EtlError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EtlError::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps a `csv` failure onto the taxonomy: underlying I/O stays `Io`,
    /// everything else means the content is not a rectangular table.
    pub fn from_csv(path: impl Into<PathBuf>, err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(source) => EtlError::io(path, source),
            csv::ErrorKind::UnequalLengths {
                pos,
                expected_len,
                len,
            } => {
                let line = pos.map(|p| p.line()).unwrap_or_default();
                EtlError::Format(format!(
                    "line {line} has {len} field(s) but the header declares {expected_len}"
                ))
            }
            csv::ErrorKind::Utf8 { pos, err } => {
                let line = pos.map(|p| p.line()).unwrap_or_default();
                EtlError::Format(format!("line {line} is not valid UTF-8: {err}"))
            }
            other => EtlError::Format(format!("{other:?}")),
        }
    }
}
