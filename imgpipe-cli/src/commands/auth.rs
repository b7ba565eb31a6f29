//! Login command

use anyhow::{Context, Result};
use colored::*;

use crate::config::Config;

pub async fn login(config: &Config, username: &str, password: &str) -> Result<()> {
    let token = config
        .client()
        .login(username, password)
        .await
        .context("Login failed")?;

    eprintln!("{}", format!("✓ Logged in as {}", username).green());
    eprintln!(
        "{}",
        "  Export the token to use it: export IMGPIPE_TOKEN=<token>".dimmed()
    );
    println!("{}", token);

    Ok(())
}
