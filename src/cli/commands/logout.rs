use anyhow::Result;

use crate::cli::{print_outcome, session_manager};

pub async fn run() -> Result<()> {
    let manager = session_manager()?;
    let outcome = manager.logout().await;
    print_outcome(&outcome)
}
