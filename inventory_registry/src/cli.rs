//! Command-line interface definitions using clap derive API.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Inventory Registry CLI
#[derive(Parser)]
#[command(name = "inventory-registry")]
#[command(about = "In-memory inventory registry with activity tracking")]
#[command(version)]
pub struct Cli {
    /// Settings file layered over the built-in defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to, overriding the configured host and port
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Apply a JSON array of items to a fresh inventory and print the result
    Apply {
        /// Path to the JSON items file
        #[arg(short, long)]
        file: PathBuf,

        /// Start from an empty inventory instead of the example records
        #[arg(long)]
        no_seed: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}
