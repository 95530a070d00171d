//! Run configuration.
//!
//! A run is described by `PipelineConfig`. It is assembled from an optional
//! YAML file and command-line overrides; flags win over file values, and a
//! sink chosen on the command line replaces the file's sink entirely.

use std::{fs::File, io::BufReader, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

use crate::{
    error::{EtlError, Result},
    io_utils,
};

pub const DEFAULT_TABLE_NAME: &str = "fact_sales";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub delimiter: Option<u8>,
    pub input_encoding: Option<String>,
    pub sink: SinkConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    File {
        path: PathBuf,
        delimiter: Option<u8>,
    },
    Database {
        connection: String,
        table: String,
    },
}

/// On-disk shape of a configuration file. Every field is optional so the
/// same type doubles as the set of command-line overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub input: Option<PathBuf>,
    pub delimiter: Option<String>,
    pub input_encoding: Option<String>,
    pub output: Option<FileOutput>,
    pub database: Option<DatabaseOutput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileOutput {
    pub path: PathBuf,
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseOutput {
    pub connection: String,
    pub table: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| EtlError::io(path, err))?;
        serde_yaml::from_reader(BufReader::new(file))
            .map_err(|err| EtlError::Config(format!("{}: {err}", path.display())))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|err| EtlError::Config(err.to_string()))
    }

    /// Layers `overrides` on top of `self`.
    pub fn merge(self, overrides: ConfigFile) -> ConfigFile {
        let sink_overridden = overrides.output.is_some() || overrides.database.is_some();
        ConfigFile {
            input: overrides.input.or(self.input),
            delimiter: overrides.delimiter.or(self.delimiter),
            input_encoding: overrides.input_encoding.or(self.input_encoding),
            output: if sink_overridden {
                overrides.output
            } else {
                self.output
            },
            database: if sink_overridden {
                overrides.database
            } else {
                self.database
            },
        }
    }

    pub fn resolve(self) -> Result<PipelineConfig> {
        let input = self
            .input
            .ok_or_else(|| EtlError::Config("no input file configured".into()))?;
        let delimiter = parse_optional_delimiter(self.delimiter.as_deref())?;
        if let Some(label) = self.input_encoding.as_deref() {
            io_utils::resolve_encoding(Some(label))?;
        }
        let sink = match (self.output, self.database) {
            (Some(_), Some(_)) => {
                return Err(EtlError::Config(
                    "configure either a file output or a database output, not both".into(),
                ));
            }
            (None, None) => {
                return Err(EtlError::Config(
                    "no destination configured; set an output path or a database".into(),
                ));
            }
            (Some(output), None) => {
                if output.path.as_os_str().is_empty() {
                    return Err(EtlError::Config("output path is empty".into()));
                }
                SinkConfig::File {
                    delimiter: parse_optional_delimiter(output.delimiter.as_deref())?,
                    path: output.path,
                }
            }
            (None, Some(database)) => {
                if database.connection.trim().is_empty() {
                    return Err(EtlError::Config("database connection is empty".into()));
                }
                SinkConfig::Database {
                    connection: database.connection,
                    table: database
                        .table
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
                }
            }
        };
        Ok(PipelineConfig {
            input,
            delimiter,
            input_encoding: self.input_encoding,
            sink,
        })
    }
}

fn parse_optional_delimiter(value: Option<&str>) -> Result<Option<u8>> {
    value
        .map(|v| io_utils::parse_delimiter(v).map_err(EtlError::Config))
        .transpose()
}
