//! nitro-ctl - local inference server supervisor
//!
//! # Examples
//!
//! ```bash
//! # Launch the server with a downloaded model, keep it up until Ctrl-C
//! nitro-ctl init llama-2-7b.Q4_K_M.gguf --hold
//!
//! # Free the server port
//! nitro-ctl kill
//!
//! # Which binary would be launched here?
//! nitro-ctl platform --pretty
//! ```

mod cli;
mod commands;
mod logging;

#[cfg(test)]
mod tests;

use crate::{
    cli::{Cli, Commands},
    commands::Outcome,
};

use nitro_config::Config;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Init { model, hold } => commands::init(&config, &model, hold, cli.pretty).await,
        Commands::Kill => commands::kill(&config).await,
        Commands::Status => commands::status(&config).await,
        Commands::Platform => Ok(commands::platform(&config)),
        Commands::Config => commands::show_config(&config),
    };

    match result {
        Ok(Outcome::Success(value)) => {
            commands::print_value(&value, cli.pretty);
            ExitCode::SUCCESS
        }
        Ok(Outcome::Failure(value)) => {
            commands::print_value(&value, cli.pretty);
            ExitCode::FAILURE
        }
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load and validate settings, then start logging.
fn load_config() -> Result<Config, String> {
    let config_dir = Config::config_dir().map_err(|e| e.to_string())?;
    let config = Config::load_from(&config_dir).map_err(|e| e.to_string())?;
    config.validate().map_err(|e| e.to_string())?;

    logging::setup_logging(&config_dir, &config.logging)
        .map_err(|e| format!("Failed to initialize logging: {e}"))?;
    config.log_summary();

    Ok(config)
}
