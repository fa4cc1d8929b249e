pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use wattwise_core::{EngineConfig, LoadOptions, LogFormat};

use commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "wattwise",
    about = "Electricity plan recommendation CLI",
    long_about = "Profile consumption history, rank catalog plans against stated priorities, and inspect the effective configuration.",
    after_help = "Examples:\n  wattwise analyze --usage usage.json\n  wattwise recommend --usage usage.json --plans catalog.json --prefs 50,20,20,10 --region TX\n  wattwise config"
)]
pub struct Cli {
    /// Path to a wattwise.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Profile a usage history file and print the 12-month projection")]
    Analyze {
        #[arg(long, help = "JSON file with monthly usage records")]
        usage: PathBuf,
        #[arg(long, help = "JSON file with regional average monthly kWh")]
        fallback: Option<PathBuf>,
        #[arg(long, help = "Emit the full profile as JSON")]
        json: bool,
    },
    #[command(about = "Rank catalog plans for a usage history and preference weights")]
    Recommend {
        #[arg(long, help = "JSON file with monthly usage records")]
        usage: PathBuf,
        #[arg(long, help = "JSON catalog file with a version marker and plans")]
        plans: PathBuf,
        #[arg(long, value_name = "COST,FLEX,RENEW,RATING", help = "Four weights summing to 100")]
        prefs: String,
        #[arg(long, help = "Region code to filter plan eligibility")]
        region: String,
        #[arg(long, help = "JSON file with the plan currently in force")]
        current: Option<PathBuf>,
        #[arg(long, help = "JSON file with regional average monthly kWh")]
        fallback: Option<PathBuf>,
        #[arg(long, help = "How many plans to rank")]
        top: Option<usize>,
        #[arg(long, help = "Emit the full result as JSON")]
        json: bool,
    },
    #[command(about = "Print the effective configuration values")]
    Config,
}

fn init_logging(config: &EngineConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match EngineConfig::load(LoadOptions {
        config_path: cli.config.clone(),
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::from(1);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Analyze { usage, fallback, json } => {
            commands::analyze::run(&config, &usage, fallback.as_deref(), json)
        }
        Command::Recommend { usage, plans, prefs, region, current, fallback, top, json } => {
            commands::recommend::run(
                &config,
                RecommendArgs {
                    usage: &usage,
                    plans: &plans,
                    prefs: &prefs,
                    region: &region,
                    current: current.as_deref(),
                    fallback: fallback.as_deref(),
                    top,
                    json,
                },
            )
        }
        Command::Config => commands::config::run(&config),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
