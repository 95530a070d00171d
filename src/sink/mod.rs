//! Destinations for the finished fact table.
//!
//! Both sinks replace their destination wholesale; neither appends.

mod file;
mod sqlite;

pub use file::CsvFileSink;
pub use sqlite::SqliteSink;

use crate::{error::Result, table::Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub destination: String,
    pub rows_written: usize,
}

pub trait Sink {
    fn persist(&mut self, table: &Table) -> Result<SinkReport>;
}
