mod app;
mod cli;
mod config;
mod effects;
mod logging;
mod render;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::cli::Cli;
use crate::config::AppConfig;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;
    config.apply_cli(&cli);

    logging::initialize(config.log_destination, cli.log_level());

    let outcome = app::run(&config, app::RunOptions::from_cli(&cli))?;
    Ok(if outcome.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
