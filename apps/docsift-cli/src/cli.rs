//! Command-line argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "docsift",
    author = "docsift Team",
    version,
    about = "docsift - extract, summarize and analyze business documents",
    long_about = "Ingest PDF, spreadsheet, CSV, Word and image files into a local corpus.\n\n\
                  Each document is converted to text, summarized and scanned for policy\n\
                  statements. Corpus analytics flag unusual documents and group\n\
                  statements by topic."
)]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "DOCSIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "LOG_LEVEL",
        default_value = "warn",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,

    /// Print error causes
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest files or directories into the corpus
    Ingest {
        /// Files or directories to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// List ingested documents
    List {
        /// Maximum number to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show a document with its summary and statements
    Show {
        /// Document ID
        id: String,

        /// Include the full extracted text
        #[arg(long)]
        text: bool,
    },

    /// Corpus analytics
    #[command(subcommand)]
    Analytics(AnalyticsCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug, Clone)]
pub enum AnalyticsCommands {
    /// Document counts by type and total statements
    Summary,
    /// Documents whose extracted text length is unusual
    Anomalies,
    /// Policy statements grouped by topic
    Clusters,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Check the configuration and report problems
    Validate,
}
