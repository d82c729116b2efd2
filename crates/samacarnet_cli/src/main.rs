//! Operator CLI for SamaCarnet databases.
//!
//! # Responsibility
//! - Create or upgrade a database file to the latest schema.
//! - Load the demo dataset and report how many records were inserted.

use clap::{Parser, Subcommand};
use samacarnet_core::db::migrations::{current_version, latest_version};
use samacarnet_core::db::{open_db, open_db_in_memory};
use samacarnet_core::seed::{seed_demo_data_with, SeedOptions};
use samacarnet_core::{core_version, default_log_level, init_logging, init_stderr_logging};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "samacarnet", version, about = "SamaCarnet database tools")]
struct Cli {
    /// Log level: error, warn, info, debug or trace.
    #[arg(long, global = true, env = "SAMACARNET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Logs go to stderr when unset.
    #[arg(long, global = true, env = "SAMACARNET_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations.
    Migrate {
        /// Database file to create or upgrade.
        #[arg(env = "SAMACARNET_DB_PATH", required_unless_present = "dry_run")]
        db: Option<PathBuf>,
        /// Run every migration against an in-memory database instead.
        #[arg(long)]
        dry_run: bool,
    },
    /// Insert the demo tenant, staff, patients and visits.
    Seed {
        #[arg(env = "SAMACARNET_DB_PATH")]
        db: PathBuf,
        /// PBKDF2 iterations for demo passwords.
        #[arg(long)]
        password_iterations: Option<u32>,
    },
    /// Print the core library and schema versions.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let logging = match cli.log_dir.as_deref() {
        Some(dir) => init_logging(&level, &dir.to_string_lossy()),
        None => init_stderr_logging(&level),
    };
    if let Err(err) = logging {
        eprintln!("samacarnet: logging init failed: {err}");
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("samacarnet: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Migrate { dry_run: true, .. } => {
            let conn = open_db_in_memory()?;
            println!("dry run ok: schema version {}", current_version(&conn)?);
        }
        Command::Migrate { db, dry_run: false } => {
            let db = db.ok_or("a database path is required")?;
            let conn = open_db(&db)?;
            println!(
                "{}: schema version {}",
                db.display(),
                current_version(&conn)?
            );
        }
        Command::Seed {
            db,
            password_iterations,
        } => {
            let conn = open_db(&db)?;
            let mut options = SeedOptions::default();
            if let Some(iterations) = password_iterations {
                options.password_iterations = iterations.max(1);
            }
            let report = seed_demo_data_with(&conn, options)?;
            println!(
                "seed: attempted={} inserted={} failed={}",
                report.attempted, report.inserted, report.failed
            );
        }
        Command::Version => {
            println!("samacarnet_core version={}", core_version());
            println!("schema version={}", latest_version());
        }
    }
    Ok(())
}
