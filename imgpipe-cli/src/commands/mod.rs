//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod auth;
mod job;

pub use job::JobCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Log in and print a bearer token
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "IMGPIPE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Job management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Login { username, password } => auth::login(config, &username, &password).await,
        Commands::Job { command } => job::handle_job_command(command, config).await,
    }
}
