use anyhow::Result;

use crate::broker::StdinMfaPrompt;
use crate::cli::{print_outcome, session_manager};
use crate::config::Credentials;

pub async fn run() -> Result<()> {
    let credentials = Credentials::from_env()?;
    let manager = session_manager()?;
    let outcome = manager.login(&credentials, &StdinMfaPrompt, true).await;
    print_outcome(&outcome)
}
