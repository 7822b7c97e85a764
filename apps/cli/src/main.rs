mod cli;
mod commands;
mod config;
mod main_lib;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use config::Config;
use main_lib::{apply_overrides, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let cli = Cli::parse();
    let config = apply_overrides(config, &cli);
    tracing::debug!("Running {:?} for user {}", cli.command, config.user_id);

    commands::run(cli, &config)
}
