//! Roster CLI Binary
//!
//! Command-line interface for the Roster contact directory.

use clap::Parser;
use roster::cli::{command_name, map_error, Cli, RunContext};
use roster::config::ConfigLoader;
use roster::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(&cli);

    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let name = command_name(&cli.command);
    info!(command = %name, "Roster CLI starting");

    let context = match RunContext::new(cli.workspace.clone(), cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error opening directory store: {}", e);
            eprintln!("{}", map_error(&e, cli.format));
            process::exit(1);
        }
    };

    match context.execute(&cli.command, cli.format) {
        Ok(output) => {
            info!(command = %name, "Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!(command = %name, kind = ?e.kind(), "Command failed: {}", e);
            eprintln!("{}", map_error(&e, cli.format));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args, environment, and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = if let Some(ref config_path) = cli.config {
        ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    } else {
        ConfigLoader::load(&cli.workspace)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    };

    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }

    config
}
