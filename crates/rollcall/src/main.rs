//! `rollcall` - CLI for the attendance ledger.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;

use rollcall::cli::{
    CheckInCommand, Cli, Command, ConfigCommand, ExportCommand, OutputFormat, ShowCommand,
};
use rollcall::gate::{credential_verifier_from_config, origin_gate_from_config};
use rollcall::record::format_date;
use rollcall::shell::{Dashboard, InstructorAccess};
use rollcall::{init_logging, open_store, Config, RecordStore, Session, Shell};

type AppShell = Shell<Box<dyn RecordStore + Send>>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // config commands must work even when the config is broken
    let command = match cli.command {
        Command::Config(cmd) => return handle_config(cli.config, cmd),
        command => command,
    };

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    let shell = build_shell(&config)?;

    match command {
        Command::CheckIn(cmd) => handle_check_in(&shell, &cmd).await,
        Command::Dates(cmd) => {
            let Some(access) = authorize(&shell, &cmd.secret) else {
                return Ok(ExitCode::FAILURE);
            };
            handle_dates(&shell, &access, cmd.json)
        }
        Command::Show(cmd) => {
            let Some(access) = authorize(&shell, &cmd.secret) else {
                return Ok(ExitCode::FAILURE);
            };
            handle_show(&shell, &access, &cmd)
        }
        Command::Export(cmd) => {
            let Some(access) = authorize(&shell, &cmd.secret) else {
                return Ok(ExitCode::FAILURE);
            };
            handle_export(&shell, &access, &cmd)
        }
        Command::Status(cmd) => handle_status(&shell, &config, cmd.json),
        Command::Config(cmd) => handle_config(cli.config, cmd),
    }
}

fn build_shell(config: &Config) -> Result<AppShell> {
    let store = open_store(config).with_context(|| {
        format!(
            "failed to open attendance table at {}",
            config.data_file_path().display()
        )
    })?;
    let origin = origin_gate_from_config(config)?;
    Ok(Shell::new(
        store,
        origin,
        credential_verifier_from_config(config),
    ))
}

fn authorize(shell: &AppShell, secret: &str) -> Option<InstructorAccess> {
    let access = shell.authorize(secret);
    if access.is_none() {
        eprintln!("The instructor password is incorrect.");
    }
    access
}

async fn handle_check_in(shell: &AppShell, cmd: &CheckInCommand) -> Result<ExitCode> {
    let mut session = Session::new();
    let now = Local::now().naive_local();
    let outcome = shell
        .check_in(&mut session, &cmd.name, now)
        .await
        .context("check-in failed")?;

    println!("{}", outcome.message());
    Ok(if outcome.is_recorded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn handle_dates(shell: &AppShell, access: &InstructorAccess, json: bool) -> Result<ExitCode> {
    let dates = shell.dates(access)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&dates)?);
    } else if dates.is_empty() {
        println!("No attendance records yet.");
    } else {
        for date in dates {
            println!("{}", format_date(date));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_show(shell: &AppShell, access: &InstructorAccess, cmd: &ShowCommand) -> Result<ExitCode> {
    let dashboard = shell.dashboard(access, cmd.date)?;
    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dashboard)?),
        OutputFormat::Plain => {
            for record in &dashboard.records {
                println!("{}\t{}\t{}", record.date_text(), record.name, record.time_text());
            }
        }
        OutputFormat::Table => print_table(&dashboard),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_table(dashboard: &Dashboard) {
    let Some(selected) = dashboard.selected else {
        println!("No attendance records yet.");
        return;
    };
    if dashboard.records.is_empty() {
        println!("No attendance records for {}.", format_date(selected));
        return;
    }

    let width = dashboard
        .records
        .iter()
        .map(|record| record.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("name".len());

    println!("Attendance for {}", format_date(selected));
    println!("{:<4} {:<width$} {}", "#", "name", "time");
    for (index, record) in dashboard.records.iter().enumerate() {
        println!(
            "{:<4} {:<width$} {}",
            index + 1,
            record.name,
            record.time_text()
        );
    }
    println!();
    println!("{} present", dashboard.records.len());
}

fn handle_export(
    shell: &AppShell,
    access: &InstructorAccess,
    cmd: &ExportCommand,
) -> Result<ExitCode> {
    let Some(export) = shell.export(access, cmd.date)? else {
        match cmd.date {
            Some(date) => println!("No attendance records for {}.", format_date(date)),
            None => println!("No attendance records yet."),
        }
        return Ok(ExitCode::SUCCESS);
    };

    std::fs::create_dir_all(&cmd.output)
        .with_context(|| format!("failed to create {}", cmd.output.display()))?;
    let path = cmd.output.join(&export.file_name);
    std::fs::write(&path, &export.bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("Wrote {} records to {}", export.count, path.display());
    Ok(ExitCode::SUCCESS)
}

fn handle_status(shell: &AppShell, config: &Config, json: bool) -> Result<ExitCode> {
    let status = shell.status()?;
    let origin = config
        .gate
        .allowed_origin_address
        .map_or_else(|| "not enforced".to_string(), |addr| addr.to_string());

    if json {
        let value = serde_json::json!({
            "backend": config.storage.backend,
            "location": status.location,
            "records": status.records,
            "dates": status.dates,
            "first_date": status.first_date,
            "last_date": status.last_date,
            "allowed_origin": config.gate.allowed_origin_address,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("rollcall status");
        println!("---------------");
        println!("Backend:       {}", config.storage.backend);
        println!("Table:         {}", status.location);
        println!("Records:       {}", status.records);
        println!("Dates:         {}", status.dates);
        if let (Some(first), Some(last)) = (status.first_date, status.last_date) {
            println!("Range:         {} .. {}", format_date(first), format_date(last));
        }
        println!("Origin check:  {origin}");
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path).context("failed to load configuration")?;
            let shown = config.redacted();
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                print_config(&shown);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            return Ok(validate_config(&path));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Storage]");
    println!("  Backend:            {}", config.storage.backend);
    println!("  Data file:          {}", config.data_file_path().display());
    println!();
    println!("[Gate]");
    match config.gate.allowed_origin_address {
        Some(addr) => println!("  Allowed origin:     {addr}"),
        None => println!("  Allowed origin:     (not enforced)"),
    }
    println!("  Lookup URL:         {}", config.gate.origin_lookup_url);
    println!("  Lookup timeout:     {}ms", config.gate.lookup_timeout_ms);
    println!(
        "  Instructor secret:  {}",
        config.gate.teacher_secret.as_deref().unwrap_or("(not set)")
    );
}

fn validate_config(path: &Path) -> ExitCode {
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path.to_path_buf())) {
        Ok(_) => {
            println!("Configuration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Configuration error: {e}");
            ExitCode::FAILURE
        }
    }
}
