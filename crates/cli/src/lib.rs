pub mod commands;

use clap::{Parser, Subcommand};
use kbseek_core::config::{AppConfig, LoadOptions, LogFormat};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "kbseek",
    about = "Knowledge base retrieval CLI",
    long_about = "Run knowledge base searches, inspect effective configuration, and check readiness.",
    after_help = "Examples:\n  kbseek retrieve \"What is our refund policy?\"\n  kbseek config\n  kbseek doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Search the knowledge base and print the result envelope as JSON")]
    Retrieve {
        #[arg(help = "Free-text query passed to the knowledge base unchanged")]
        query: String,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, knowledge base id, and credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the agent profile and its registered tools")]
    Agent,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let loaded = AppConfig::load(LoadOptions::default());
    if let Ok(config) = &loaded {
        init_logging(config);
    }
    let config = loaded.as_ref();

    let result = match cli.command {
        Command::Retrieve { query } => commands::retrieve::run(config, &query),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(config) }
        }
        Command::Doctor { json } => commands::doctor::run(config, json),
        Command::Agent => commands::agent::run(config),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
