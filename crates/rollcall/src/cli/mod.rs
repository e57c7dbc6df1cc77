//! Command-line interface for rollcall.
//!
//! This module provides the CLI structure for the `rollcall` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    CheckInCommand, ConfigCommand, DatesCommand, ExportCommand, OutputFormat, ShowCommand,
    StatusCommand,
};

/// rollcall - Remote attendance with one check-in per student per day
///
/// Students check in by name, optionally only from the classroom network.
/// Instructors list, view and export each day's attendance.
#[derive(Debug, Parser)]
#[command(name = "rollcall")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check in for today
    CheckIn(CheckInCommand),

    /// List dates with attendance (instructor)
    Dates(DatesCommand),

    /// Show one day's attendance (instructor)
    Show(ShowCommand),

    /// Export one day's attendance as CSV (instructor)
    Export(ExportCommand),

    /// Show table location and size
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "rollcall");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["rollcall", "status"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["rollcall", "-v", "status"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["rollcall", "-vv", "status"]).verbosity(), Verbosity::Trace);
        assert_eq!(parse(&["rollcall", "-q", "status"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_check_in() {
        let cli = parse(&["rollcall", "check-in", "홍길동"]);
        match cli.command {
            Command::CheckIn(cmd) => assert_eq!(cmd.name, "홍길동"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_check_in_requires_name() {
        assert!(Cli::try_parse_from(["rollcall", "check-in"]).is_err());
    }

    #[test]
    fn test_parse_show_with_date() {
        let cli = parse(&["rollcall", "show", "2024-01-02", "--secret", "s", "-f", "json"]);
        match cli.command {
            Command::Show(cmd) => {
                assert_eq!(cmd.date, NaiveDate::from_ymd_opt(2024, 1, 2));
                assert_eq!(cmd.secret, "s");
                assert_eq!(cmd.format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_show_rejects_bad_date() {
        assert!(Cli::try_parse_from(["rollcall", "show", "Jan 2", "--secret", "s"]).is_err());
    }

    #[test]
    fn test_parse_export_defaults() {
        let cli = parse(&["rollcall", "export", "--secret", "s"]);
        match cli.command {
            Command::Export(cmd) => {
                assert!(cmd.date.is_none());
                assert_eq!(cmd.output, PathBuf::from("."));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["rollcall", "-c", "/custom/config.toml", "status"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = parse(&["rollcall", "config", "validate", "--file", "x.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }
}
