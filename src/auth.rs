//! Session lifecycle orchestration
//!
//! Cached-session reuse with fall-through to fresh login. A stored session is
//! only a hint; it is validated by one profile call, and any failure on that
//! path is logged and demoted to a fresh login rather than treated as fatal.

use tracing::{info, warn};

use crate::broker::{BrokerClient, BrokerError, MfaPrompt};
use crate::config::Credentials;
use crate::session::SessionStore;
use crate::types::{LoginOutcome, LogoutOutcome};

/// Instructional text for the soft verification-pending state.
const VERIFICATION_HINT: &str = "Check your email/SMS and approve the device, then try again";

pub struct SessionManager<C, S> {
    client: C,
    store: S,
}

impl<C: BrokerClient, S: SessionStore> SessionManager<C, S> {
    pub fn new(client: C, store: S) -> Self {
        Self { client, store }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Install any stored session on the client without validating it.
    /// Returns whether a session was found.
    pub fn attach_cached(&self) -> bool {
        match self.store.acquire() {
            Ok(Some(session)) => {
                self.client.restore(session);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Could not read stored session: {e:#}");
                false
            }
        }
    }

    /// Log in, preferring the stored session when `persist` is set. Every
    /// failure is reported as an outcome record; nothing propagates.
    pub async fn login(
        &self,
        credentials: &Credentials,
        mfa: &dyn MfaPrompt,
        persist: bool,
    ) -> LoginOutcome {
        if persist && self.attach_cached() {
            info!("Found stored session, attempting to use...");
            match self.client.account_profile().await {
                Ok(_) => {
                    info!("Successfully logged in with stored session");
                    return LoginOutcome::Authenticated {
                        email: credentials.email.clone(),
                    };
                }
                Err(e) => {
                    warn!("Stored session failed: {e}");
                    info!("Attempting fresh login...");
                }
            }
        }

        match self.client.login(credentials, mfa).await {
            Ok(session) => {
                if persist {
                    if let Err(e) = self.store.persist(&session) {
                        warn!("Could not persist session: {e:#}");
                    }
                }
                info!("Successfully logged in");
                LoginOutcome::Authenticated {
                    email: credentials.email.clone(),
                }
            }
            Err(BrokerError::VerificationRequired { message }) => {
                info!("Device verification pending: {message}");
                LoginOutcome::VerificationRequired {
                    message: VERIFICATION_HINT.to_string(),
                }
            }
            Err(e) => LoginOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    /// Revoke the session remotely and clear the store. Clearing an empty
    /// store is a no-op, so logout is idempotent.
    pub async fn logout(&self) -> LogoutOutcome {
        self.attach_cached();
        if let Err(e) = self.client.logout().await {
            return LogoutOutcome::Error {
                message: e.to_string(),
            };
        }
        if let Err(e) = self.store.clear() {
            return LogoutOutcome::Error {
                message: format!("{e:#}"),
            };
        }
        info!("Logged out successfully");
        LogoutOutcome::LoggedOut
    }
}
