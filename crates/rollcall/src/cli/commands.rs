//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::record::parse_date;

/// Check-in command arguments.
#[derive(Debug, Args)]
pub struct CheckInCommand {
    /// Name to check in as
    pub name: String,
}

/// Dates command arguments.
#[derive(Args)]
pub struct DatesCommand {
    /// Instructor secret
    #[arg(short, long, env = "ROLLCALL_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Args)]
pub struct ShowCommand {
    /// Date to show (YYYY-MM-DD); defaults to the most recent date
    #[arg(value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Instructor secret
    #[arg(short, long, env = "ROLLCALL_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Export command arguments.
#[derive(Args)]
pub struct ExportCommand {
    /// Date to export (YYYY-MM-DD); defaults to the most recent date
    #[arg(value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Instructor secret
    #[arg(short, long, env = "ROLLCALL_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Directory to write the file into
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One record per line
    Plain,
    /// Aligned columns
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Shown in place of the instructor secret.
const REDACTED: &str = "<redacted>";

impl fmt::Debug for DatesCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatesCommand")
            .field("secret", &REDACTED)
            .field("json", &self.json)
            .finish()
    }
}

impl fmt::Debug for ShowCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShowCommand")
            .field("date", &self.date)
            .field("secret", &REDACTED)
            .field("format", &self.format)
            .finish()
    }
}

impl fmt::Debug for ExportCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportCommand")
            .field("date", &self.date)
            .field("secret", &REDACTED)
            .field("output", &self.output)
            .finish()
    }
}

fn parse_date_arg(text: &str) -> Result<NaiveDate, String> {
    parse_date(text).ok_or_else(|| format!("expected a date like 2024-01-02, got `{text}`"))
}
