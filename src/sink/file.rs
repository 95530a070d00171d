use std::path::PathBuf;

use crate::{
    error::{EtlError, Result},
    io_utils,
    table::Table,
};

use super::{Sink, SinkReport};

/// Writes the table as delimited text with a header row and no index column.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    path: PathBuf,
    delimiter: u8,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>, delimiter: Option<u8>) -> Self {
        let path = path.into();
        let delimiter =
            io_utils::resolve_output_delimiter(&path, delimiter, io_utils::DEFAULT_CSV_DELIMITER);
        Self { path, delimiter }
    }
}

impl Sink for CsvFileSink {
    fn persist(&mut self, table: &Table) -> Result<SinkReport> {
        let mut writer = io_utils::create_csv_writer(&self.path, self.delimiter)?;
        writer
            .write_record(table.headers())
            .map_err(|err| EtlError::from_csv(&self.path, err))?;
        let mut rows_written = 0usize;
        for row in table.display_rows() {
            writer
                .write_record(&row)
                .map_err(|err| EtlError::from_csv(&self.path, err))?;
            rows_written += 1;
        }
        writer
            .flush()
            .map_err(|err| EtlError::io(&self.path, err))?;
        Ok(SinkReport {
            destination: self.path.display().to_string(),
            rows_written,
        })
    }
}
