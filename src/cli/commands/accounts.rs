use anyhow::Result;

use crate::broker::StdinMfaPrompt;
use crate::cli::{print_outcome, session_manager};
use crate::config::Credentials;
use crate::ops;
use crate::types::LoginOutcome;

pub async fn run() -> Result<()> {
    let credentials = Credentials::from_env()?;
    let manager = session_manager()?;

    // A login that did not authenticate is the result.
    let login = manager.login(&credentials, &StdinMfaPrompt, true).await;
    if !matches!(login, LoginOutcome::Authenticated { .. }) {
        return print_outcome(&login);
    }

    let outcome = ops::accounts(manager.client()).await;
    print_outcome(&outcome)
}
