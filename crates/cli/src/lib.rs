pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use frontdesk_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "frontdesk",
    about = "Frontdesk booking operator CLI",
    long_about = "Prepare the booking database, inspect configuration, and run conversational turns against the booking desk.",
    after_help = "Examples:\n  frontdesk migrate\n  frontdesk seed --days 28\n  frontdesk dispatch --conversation c-1 'search_patient({\"phone\":\"5551234567\"})'"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a frontdesk.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override database.url")]
    database_url: Option<String>,
    #[arg(long, global = true, help = "Override logging.level")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Override logging.format (compact, pretty, json)")]
    log_format: Option<LogFormat>,
    #[arg(long, global = true, help = "Pin today's date (YYYY-MM-DD) for date resolution")]
    reference_date: Option<NaiveDate>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Add the standard weekday schedule of open slots")]
    Seed {
        #[arg(long, default_value_t = commands::seed::DEFAULT_SEED_DAYS, help = "Calendar days to cover")]
        days: u32,
        #[arg(long, help = "First day to seed (defaults to the reference date or today)")]
        start: Option<NaiveDate>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config, DB connectivity, and practice document readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Execute the action tokens in one conversational turn")]
    Dispatch {
        #[arg(long, default_value = "cli", help = "Conversation the turn belongs to")]
        conversation: String,
        #[arg(help = "Turn text containing zero or more name({json}) tokens")]
        text: String,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                database_url: self.database_url.clone(),
                log_level: self.log_level.clone(),
                log_format: self.log_format,
                reference_date: self.reference_date,
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    if let Ok(config) = AppConfig::load(options.clone()) {
        if let Err(error) = logging::init(&config) {
            eprintln!("logging disabled: {error:#}");
        }
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(&options),
        Command::Seed { days, start } => commands::seed::run(&options, start, days),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&options) }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(&options, json) }
        }
        Command::Dispatch { conversation, text } => {
            commands::dispatch::run(&options, &conversation, &text)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
