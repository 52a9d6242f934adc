//! CLI entrypoint for toolgate
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod approval;
mod commands;
mod handlers;
mod logging;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use toolgate_infrastructure::ConfigLoader;
use tracing::info;

use commands::{Cli, Command};
use handlers::{ChatArgs, ExecArgs};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };

    let _log_guard = logging::init(cli.verbose, &config.logging)?;
    info!("Starting toolgate");

    match cli.command {
        Command::Exec {
            workdir,
            timeout,
            stdin,
            sandbox,
            json,
            argv,
        } => {
            handlers::exec(
                &config,
                ExecArgs {
                    workdir,
                    timeout,
                    stdin,
                    sandbox,
                    json,
                    argv,
                },
            )
            .await
        }
        Command::Chat {
            prompt,
            provider,
            model,
            system,
            no_tools,
            run_tools,
            yes,
        } => {
            handlers::chat(
                &config,
                ChatArgs {
                    prompt,
                    provider,
                    model,
                    system,
                    no_tools,
                    run_tools,
                    yes,
                },
            )
            .await
        }
        Command::Tools => handlers::tools(&config),
        Command::CheckPath { path, write } => handlers::check_path(&config, &path, write),
        Command::Config => handlers::show_config(&config, cli.config.as_deref()),
    }
}
