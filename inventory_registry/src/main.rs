//! Main entry point for the Inventory Registry CLI.

use anyhow::Result;
use clap::Parser;
use inventory_registry::{apply, cli, server, settings::Settings, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::Cli::parse();

    // Load settings
    let mut settings = Settings::load(args.config.as_deref())?;

    // Initialize logging
    telemetry::init(&settings.logging)?;

    // Execute the requested command
    match args.command {
        cli::Commands::Serve { addr } => {
            if let Some(addr) = addr {
                settings.server.host = addr.ip().to_string();
                settings.server.port = addr.port();
            }
            server::serve(settings).await
        }
        cli::Commands::Apply { file, no_seed } => {
            let report = apply::run(&file, !no_seed)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        cli::Commands::Config => {
            print!("{}", settings.to_toml()?);
            Ok(())
        }
    }
}
