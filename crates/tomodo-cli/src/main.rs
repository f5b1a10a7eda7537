use clap::Parser;
use colored::*;
use std::process;
use tomodo_docker::{is_engine_running, DockerEngine};
use tomodo_telemetry::{init_logging, LogSettings};
use tracing::warn;

use tomodo_cli::{check_ports, Cli, CliError, CommandHandler, Commands, ConfigManager};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(LogSettings {
        verbose: cli.verbose,
        quiet: cli.quiet,
    }) {
        eprintln!("{} {}", "Error:".red(), e);
        process::exit(1);
    }

    let mut config_manager = match ConfigManager::new(cli.config.clone()) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };
    if let Some(data_root) = cli.data_root.clone() {
        config_manager.set_data_root(data_root);
    }

    if let Err(e) = run(cli, config_manager).await {
        eprintln!("{} {}", "Error:".red(), e);
        process::exit(1);
    }
}

async fn run(cli: Cli, config_manager: ConfigManager) -> Result<(), CliError> {
    for warning in config_manager.validate_config()? {
        warn!("{}: {}", config_manager.config_path().display(), warning);
    }

    if let Commands::CheckPorts { ports, host } = &cli.command {
        return check_ports(ports, host).await;
    }

    let config = config_manager.into_config();
    let engine = DockerEngine::connect(&config.docker)?;
    if !is_engine_running(&engine).await {
        return Err(CliError::EngineNotRunning);
    }

    let mut handler = CommandHandler::new(engine, config);
    handler.set_output_format(cli.format);
    handler.execute(cli.command).await
}
