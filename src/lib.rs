//! Command-line front end over the `kg-backend` contract.

mod cli;
mod commands;
mod config;
mod error;
mod limits;
mod logger;
mod render;

use clap::Parser;
use std::io::Write;

pub use error::AppError;

pub async fn run() -> Result<(), AppError> {
    let cli = cli::Cli::parse();

    let config = config::load_configuration(cli.config.as_deref(), &cli.overrides())?;
    logger::initialize(&config.logger, &config.telemetry, cli.debug);

    let output = commands::execute(&config, &cli.command).await?;

    let mut text = output.into_text();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    std::io::stdout().lock().write_all(text.as_bytes())?;

    Ok(())
}
