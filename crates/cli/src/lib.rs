pub mod commands;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ratebook_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "ratebook",
    about = "Ratebook insurance rating CLI",
    long_about = "Compile carrier rate tables, inspect configuration, and generate comparative quotes.",
    after_help = "Examples:\n  ratebook quote --request request.json --seed 7\n  ratebook carriers\n  ratebook doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Rate a quote request against every eligible carrier")]
    Quote {
        #[arg(long, short, default_value = "-", help = "Request JSON file, or `-` for stdin")]
        request: PathBuf,
        #[arg(long, help = "Seed the market variance generator for reproducible output")]
        seed: Option<u64>,
        #[arg(long, help = "Disable market variance for this run")]
        no_variance: bool,
        #[arg(long, help = "Attach the per-stage rating breakdown to each quote")]
        explain: bool,
    },
    #[command(about = "Compile the rate directory and print a model summary")]
    Compile,
    #[command(about = "List enabled carriers in market share order")]
    Carriers,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, rate compilation, age table coverage, and carrier roster")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded in tests.
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Config errors surface through the command envelope, so logging only starts on a good load.
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Quote { request, seed, no_variance, explain } => {
            commands::quote::run(commands::quote::QuoteArgs { request, seed, no_variance, explain })
        }
        Command::Compile => commands::compile::run(),
        Command::Carriers => commands::carriers::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            let (healthy, output) = commands::doctor::run(json);
            commands::CommandResult { exit_code: if healthy { 0 } else { 1 }, output }
        }
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", result.output).context("failed to write command output")?;
    stdout.flush().context("failed to flush command output")?;
    Ok(ExitCode::from(result.exit_code))
}
