//! Load → clean → derive → persist, as one linear run.

use std::path::Path;

use crate::{
    clean::{CleanReport, clean},
    config::{PipelineConfig, SinkConfig},
    error::Result,
    io_utils, loader,
    metrics::{MetricsReport, derive_metrics},
    observe::{PipelineEvent, PipelineObserver},
    sink::{CsvFileSink, Sink, SinkReport, SqliteSink},
    table::Table,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub rows_loaded: usize,
    pub clean: CleanReport,
    pub metrics: MetricsReport,
    pub sink: SinkReport,
}

pub fn build_sink(config: &SinkConfig) -> Result<Box<dyn Sink>> {
    let sink: Box<dyn Sink> = match config {
        SinkConfig::File { path, delimiter } => Box::new(CsvFileSink::new(path, *delimiter)),
        SinkConfig::Database { connection, table } => {
            Box::new(SqliteSink::open(connection, table)?)
        }
    };
    Ok(sink)
}

/// Runs the whole pipeline against the sink described by `config`.
pub fn run(config: &PipelineConfig, observer: &dyn PipelineObserver) -> Result<PipelineSummary> {
    let mut sink = build_sink(&config.sink)?;
    run_with_sink(config, sink.as_mut(), observer)
}

pub fn run_with_sink(
    config: &PipelineConfig,
    sink: &mut dyn Sink,
    observer: &dyn PipelineObserver,
) -> Result<PipelineSummary> {
    observer.on_event(&PipelineEvent::Started);
    let (table, rows_loaded, clean_report, metrics_report) = prepare(config, observer)?;
    let sink_report = sink.persist(&table)?;
    observer.on_event(&PipelineEvent::Persisted {
        destination: sink_report.destination.clone(),
        rows: sink_report.rows_written,
    });
    observer.on_event(&PipelineEvent::Completed);
    Ok(PipelineSummary {
        rows_loaded,
        clean: clean_report,
        metrics: metrics_report,
        sink: sink_report,
    })
}

/// Loads and transforms the configured input without persisting it.
pub fn prepare(
    config: &PipelineConfig,
    observer: &dyn PipelineObserver,
) -> Result<(Table, usize, CleanReport, MetricsReport)> {
    let raw = load(
        &config.input,
        config.delimiter,
        config.input_encoding.as_deref(),
        observer,
    )?;
    let rows_loaded = raw.row_count();
    let (table, clean_report, metrics_report) = transform(raw, observer)?;
    Ok((table, rows_loaded, clean_report, metrics_report))
}

pub fn load(
    input: &Path,
    delimiter: Option<u8>,
    encoding: Option<&str>,
    observer: &dyn PipelineObserver,
) -> Result<Table> {
    let delimiter = io_utils::resolve_input_delimiter(input, delimiter);
    let encoding = io_utils::resolve_encoding(encoding)?;
    let table = loader::load_table(input, delimiter, encoding)?;
    observer.on_event(&PipelineEvent::Loaded {
        source: input.to_path_buf(),
        rows: table.row_count(),
        columns: table.headers().len(),
    });
    Ok(table)
}

pub fn transform(
    raw: Table,
    observer: &dyn PipelineObserver,
) -> Result<(Table, CleanReport, MetricsReport)> {
    let (cleaned, clean_report) = clean(raw)?;
    observer.on_event(&PipelineEvent::DuplicatesRemoved {
        count: clean_report.duplicates_removed,
    });
    observer.on_event(&PipelineEvent::Cleaned {
        invalid_removed: clean_report.invalid_removed,
        rows: clean_report.rows_out,
    });
    let (enriched, metrics_report) = derive_metrics(cleaned)?;
    observer.on_event(&PipelineEvent::MetricsDerived {
        rows: metrics_report.rows,
        unbanded: metrics_report.unbanded,
    });
    Ok((enriched, clean_report, metrics_report))
}
