//! Observability hooks for pipeline runs.
//!
//! Stages never log directly. The pipeline reports what happened through a
//! `PipelineObserver` handed in by the caller, so tests can capture events and
//! the binary can route them to `log`.

use std::{cell::RefCell, path::PathBuf};

use log::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Started,
    Loaded {
        source: PathBuf,
        rows: usize,
        columns: usize,
    },
    DuplicatesRemoved {
        count: usize,
    },
    Cleaned {
        invalid_removed: usize,
        rows: usize,
    },
    MetricsDerived {
        rows: usize,
        unbanded: usize,
    },
    Persisted {
        destination: String,
        rows: usize,
    },
    Completed,
}

pub trait PipelineObserver {
    fn on_event(&self, event: &PipelineEvent);
}

/// Forwards every event to the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Started => info!("Starting sales fact ETL pipeline"),
            PipelineEvent::Loaded {
                source,
                rows,
                columns,
            } => info!(
                "Loaded {rows} row(s) across {columns} column(s) from {}",
                source.display()
            ),
            PipelineEvent::DuplicatesRemoved { count } => {
                info!("Removed {count} duplicate row(s)")
            }
            PipelineEvent::Cleaned {
                invalid_removed,
                rows,
            } => info!(
                "Data cleaned: dropped {invalid_removed} invalid row(s), {rows} valid row(s) remain"
            ),
            PipelineEvent::MetricsDerived { rows, unbanded } => info!(
                "Derived business metrics for {rows} row(s) ({unbanded} without a discount band)"
            ),
            PipelineEvent::Persisted { destination, rows } => {
                info!("Wrote {rows} row(s) to {destination}")
            }
            PipelineEvent::Completed => info!("ETL pipeline completed successfully"),
        }
    }
}

/// Keeps every event in memory; used to assert on what a run reported.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: RefCell<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.borrow().clone()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
