//! imgpipe CLI
//!
//! Command-line interface for the imgpipe image processing server.

mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "imgpipe")]
#[command(about = "imgpipe image processing CLI", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, env = "IMGPIPE_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token from `imgpipe login`
    #[arg(long, env = "IMGPIPE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.url,
        token: cli.token,
    };

    handle_command(cli.command, &config).await
}
