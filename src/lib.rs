//! Daybook: a local-first day planner.
//!
//! Todo lists are keyed by calendar day and kept in one human-readable JSON
//! file, so the file can live in a synced folder and be opened by hand.
//!
//! # Data file
//!
//! ```json
//! {
//!   "2026-02-20": { "todos": [ { "text": "买菜", "done": false } ] },
//!   "_meta": { "last_saved_at": "2026-02-20 09:15:02" }
//! }
//! ```
//!
//! Older files stored a day as a bullet list in one string; those entries are
//! migrated to the shape above the first time the file is opened.
//!
//! # Crate Structure
//!
//! - [`core`]: data model, normaliser, store, date resolution and the planner session
//! - [`plugins`]: the day record manager and the month-grid projection

pub mod core;
pub mod plugins;

use crate::core::config::{Config, Overrides};
use crate::core::error::DaybookError;
use crate::core::output::{self, OutputFormat};
use crate::core::planner::Planner;
use crate::core::{logging, time};
use crate::plugins::calendar::{self, CalendarCli};
use crate::plugins::day::{self, DayCli};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "daybook",
    version = env!("CARGO_PKG_VERSION"),
    about = "Dated todo lists in one JSON file"
)]
struct Cli {
    /// Data file; overrides the config file and DAYBOOK_FILE.
    #[clap(long, global = true)]
    file: Option<PathBuf>,
    /// Config file (defaults to ./daybook.toml when present).
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    /// IANA time zone used for "today" and timestamps, e.g. Asia/Shanghai.
    #[clap(long, global = true)]
    tz: Option<String>,
    #[clap(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Debug logging on stderr (DAYBOOK_LOG takes precedence).
    #[clap(short, long, global = true)]
    verbose: bool,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[clap(flatten)]
    Day(DayCli),
    #[clap(flatten)]
    Calendar(CalendarCli),
    /// Rewrite legacy day entries in the data file to the current shape.
    Migrate,
    /// Print the version.
    Version,
}

pub fn run() -> Result<(), DaybookError> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let command = cli
        .command
        .unwrap_or(Command::Day(DayCli::Show { date: None }));
    if let Command::Version = command {
        println!("v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let overrides = Overrides {
        config_path: cli.config,
        data_file: cli.file,
        time_zone: cli.tz,
    };
    let config = Config::resolve(&std::env::current_dir()?, &overrides)?;
    tracing::debug!(
        data_file = %config.data_file.display(),
        time_zone = %config.time_zone,
        "resolved configuration"
    );
    let mut planner = Planner::open(&config)?;

    match command {
        Command::Day(day_cli) => day::run_day_cli(&mut planner, day_cli, cli.format),
        Command::Calendar(calendar_cli) => {
            calendar::run_calendar_cli(&mut planner, calendar_cli, cli.format)
        }
        Command::Migrate => {
            let migrated = planner.migrate()?;
            match cli.format {
                OutputFormat::Json => output::print_json(&time::command_envelope(
                    "migrate",
                    "ok",
                    serde_json::json!({
                        "path": planner.store().path,
                        "migrated": migrated,
                    }),
                )),
                OutputFormat::Text => {
                    println!(
                        "{} {} entr{} migrated in {}",
                        if migrated > 0 { "✓" } else { "·" },
                        migrated,
                        if migrated == 1 { "y" } else { "ies" },
                        planner.store().path.display()
                    );
                    Ok(())
                }
            }
        }
        Command::Version => Ok(()),
    }
}
