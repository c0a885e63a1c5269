use anyhow::Result;

use crate::cli::{print_outcome, session_manager};
use crate::ops;

/// Status only consults the stored session; it never triggers a login.
pub async fn run() -> Result<()> {
    let manager = session_manager()?;
    manager.attach_cached();
    let outcome = ops::status(manager.client()).await;
    print_outcome(&outcome)
}
