//! Session token persistence
//!
//! The session blob is opaque to callers: a file's existence is only an
//! unverified hint that stored credentials might still work. Actual validity
//! is established by attempting an API call through the broker client.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Fixed session identifier for this install.
pub const SESSION_NAME: &str = "kampala_session";

// The on-disk name concatenates a fixed prefix with the session name, no
// subdirectory in between. This convention is inherited from the original
// deployment and other tooling expects it, so it is pinned by a test below.
const TOKEN_DIR: &str = ".tokens";
const TOKEN_PREFIX: &str = "robinhood";

/// A bearer session issued by the brokerage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Per-install device identifier; kept with the session so that an
    /// approved device stays approved across logins.
    pub device_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Storage seam for the session blob, so commands and tests can inject
/// their own backing (file on disk in production, memory in tests).
pub trait SessionStore: Send + Sync {
    /// Return the stored session, or `None` when nothing is stored.
    fn acquire(&self) -> Result<Option<Session>>;
    fn persist(&self, session: &Session) -> Result<()>;
    /// Remove any stored session. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<()>;
}

/// JSON file under the user's home directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

pub(crate) fn session_file_name(name: &str) -> String {
    format!("{TOKEN_PREFIX}{name}.json")
}

impl FileSessionStore {
    pub fn at_default_path() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
        Ok(Self {
            path: home.join(TOKEN_DIR).join(session_file_name(SESSION_NAME)),
        })
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn acquire(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read session file {}", self.path.display()))?;
        let session = serde_json::from_str(&raw)
            .with_context(|| format!("session file {} is not valid", self.path.display()))?;
        Ok(Some(session))
    }

    fn persist(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write session file {}", self.path.display()))?;
        info!("💾 Session stored at {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).with_context(|| {
                format!("failed to remove session file {}", self.path.display())
            })?;
            info!("Session file removed");
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::sample_session;
    use super::*;

    #[test]
    fn test_file_name_concatenates_prefix_and_session_name() {
        // External contract: prefix + name, no separator, no subdirectory.
        assert_eq!(
            session_file_name(SESSION_NAME),
            "robinhoodkampala_session.json"
        );
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::at_path(dir.path().join("session.json"));

        assert_eq!(store.acquire().unwrap(), None);

        let session = sample_session();
        store.persist(&session).unwrap();
        assert_eq!(store.acquire().unwrap(), Some(session));

        store.clear().unwrap();
        assert_eq!(store.acquire().unwrap(), None);
    }

    #[test]
    fn test_persist_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::at_path(dir.path().join(".tokens").join("session.json"));
        store.persist(&sample_session()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_clear_is_a_noop_without_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::at_path(dir.path().join("missing.json"));
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileSessionStore::at_path(path);
        assert!(store.acquire().is_err());
    }
}
