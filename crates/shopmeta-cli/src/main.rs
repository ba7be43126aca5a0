//! shopmeta - customer notes, password restriction and product quicklinks
//! from the command line.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::notes::run_notes;
use crate::commands::password::run_password;
use crate::commands::quicklinks::run_quicklinks;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "shopmeta=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();
    let api_url = cli.api_url.as_deref();

    match cli.command {
        Commands::Notes { command } => run_notes(command, profile, api_url).await,
        Commands::Quicklinks { command } => run_quicklinks(command, profile, api_url).await,
        Commands::Password { command } => run_password(command, profile, api_url).await,
        Commands::Config { command } => run_config(command, profile),
        Commands::Auth { command } => run_auth(command, profile),
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
    }
}
