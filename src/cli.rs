use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    config::{ConfigFile, DatabaseOutput, FileOutput},
    io_utils::parse_delimiter,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Clean raw order records into an enriched sales fact table",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load, clean, derive metrics and persist the fact table
    Run(RunArgs),
    /// Clean and derive metrics, then print the first rows without persisting anything
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// YAML configuration file; flags given here override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Raw order records to process
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Destination CSV/TSV file for the fact table
    #[arg(short = 'o', long = "output", conflicts_with = "database")]
    pub output: Option<PathBuf>,
    /// SQLite connection string (`sqlite://path`, `:memory:` or a file path)
    #[arg(long)]
    pub database: Option<String>,
    /// Destination table name when writing to a database
    #[arg(long, requires = "database")]
    pub table: Option<String>,
    /// Delimiter of the input file (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter of the output file (defaults from its extension)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter, requires = "output")]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

impl RunArgs {
    /// Flags expressed as a configuration layer to merge over a config file.
    pub fn overrides(&self) -> ConfigFile {
        ConfigFile {
            input: self.input.clone(),
            delimiter: self.delimiter.map(delimiter_text),
            input_encoding: self.input_encoding.clone(),
            output: self.output.as_ref().map(|path| FileOutput {
                path: path.clone(),
                delimiter: self.output_delimiter.map(delimiter_text),
            }),
            database: self.database.as_ref().map(|connection| DatabaseOutput {
                connection: connection.clone(),
                table: self.table.clone(),
            }),
        }
    }
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Raw order records to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Delimiter of the input file (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

fn delimiter_text(delimiter: u8) -> String {
    (delimiter as char).to_string()
}
