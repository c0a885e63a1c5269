//! CLI command router
//!
//! One positional, case-insensitive token selects the operation. Every
//! dispatched command prints a single pretty-printed JSON record on stdout
//! and exits 0; only usage errors and missing credentials exit non-zero.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::Serialize;

pub mod commands;

use crate::auth::SessionManager;
use crate::broker::RobinhoodClient;
use crate::session::FileSessionStore;

#[derive(Parser)]
#[command(name = "rh-auth")]
#[command(version)]
#[command(about = "Robinhood session CLI: authenticate, then read account state", long_about = None)]
pub struct Cli {
    /// Operation to perform
    #[arg(value_enum, ignore_case = true)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Command {
    /// Login and store the session token
    Auth,
    /// Alias for auth
    Login,
    /// Revoke and remove the stored session
    Logout,
    /// Check current authentication status
    Status,
    /// List accounts (logs in first)
    Accounts,
    /// Portfolio summary with positions (logs in first)
    Portfolio,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Command::Auth | Command::Login => commands::auth::run().await,
            Command::Logout => commands::logout::run().await,
            Command::Status => commands::status::run().await,
            Command::Accounts => commands::accounts::run().await,
            Command::Portfolio => commands::portfolio::run().await,
        }
    }
}

/// Shared wiring for commands that talk to the live API.
pub(crate) fn session_manager() -> Result<SessionManager<RobinhoodClient, FileSessionStore>> {
    Ok(SessionManager::new(
        RobinhoodClient::new()?,
        FileSessionStore::at_default_path()?,
    ))
}

/// The one JSON object this run emits on stdout.
pub(crate) fn print_outcome<T: Serialize>(outcome: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}
