//! Credential loading from the process environment

use anyhow::{anyhow, Result};

/// Printed when the required environment variables are missing. The process
/// exits before any network interaction in that case.
pub const SETUP_HINT: &str = "RH_USER and RH_PASS environment variables required\n\
Set them in .env file:\n  RH_USER=your_email@example.com\n  RH_PASS=your_password";

/// Brokerage login credentials. Read from the environment, never persisted.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Read `RH_USER` / `RH_PASS`. `dotenvy` has already been given a chance
    /// to populate the environment from a local `.env` file by `main`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(
            std::env::var("RH_USER").ok(),
            std::env::var("RH_PASS").ok(),
        )
    }

    fn from_lookup(email: Option<String>, password: Option<String>) -> Result<Self> {
        match (
            email.filter(|e| !e.is_empty()),
            password.filter(|p| !p.is_empty()),
        ) {
            (Some(email), Some(password)) => Ok(Self { email, password }),
            _ => Err(anyhow!("{}", SETUP_HINT)),
        }
    }
}
