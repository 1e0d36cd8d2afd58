pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "folio",
    about = "Folio portfolio chat CLI",
    long_about = "Inspect configuration, check integration readiness, and talk to the portfolio chat assistant from a terminal.",
    after_help = "Examples:\n  folio doctor --json\n  folio config\n  folio chat --no-pacing"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive chat session on stdin/stdout")]
    Chat {
        #[arg(long, help = "Reply immediately instead of simulating typing delays")]
        no_pacing: bool,
        #[arg(long, help = "Override the owner name used in replies")]
        owner: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, report integrations, and run a canned chat turn")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat { no_pacing, owner } => {
            commands::chat::run(commands::chat::ChatOptions { no_pacing, owner })
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
