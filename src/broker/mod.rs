//! Brokerage collaborator surface
//!
//! The consumed surface of the brokerage API is expressed as the
//! [`BrokerClient`] trait so the session manager and read operations can be
//! exercised against test doubles. [`RobinhoodClient`] is the HTTP-backed
//! implementation. Failure modes are a structured [`BrokerError`]; callers
//! match on variants instead of scanning message text.

use std::io::{self, Write};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Credentials;
use crate::session::Session;

mod models;
mod robinhood;

pub use models::{AccountProfile, Instrument, Position, PortfolioProfile};
pub use robinhood::RobinhoodClient;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// The remote side issued a device challenge or verification workflow
    /// instead of a session. Soft condition: approve out-of-band and retry.
    #[error("device verification required: {message}")]
    VerificationRequired { message: String },

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("session expired, please reconnect")]
    SessionExpired,

    /// The login call completed without yielding a session.
    #[error("login returned no result")]
    EmptyLogin,

    #[error("no brokerage account returned")]
    NoAccount,

    /// Instrument references must point at the API host we authenticated
    /// against; anything else is refused before a request is made.
    #[error("instrument reference does not belong to the API host: {url}")]
    ForeignInstrumentRef { url: String },

    #[error("api error {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("one-time code prompt failed: {0}")]
    Prompt(#[from] io::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Supplies the one-time code when the remote side demands a second factor.
///
/// The production implementation blocks the process on console input with no
/// timeout; tests inject canned codes.
pub trait MfaPrompt: Send + Sync {
    fn mfa_code(&self) -> io::Result<String>;
}

/// Reads the code from the controlling terminal. The prompt goes to stderr
/// because stdout is reserved for the JSON result.
pub struct StdinMfaPrompt;

impl MfaPrompt for StdinMfaPrompt {
    fn mfa_code(&self) -> io::Result<String> {
        eprint!("Enter MFA code from your authenticator app: ");
        io::stderr().flush()?;
        let mut code = String::new();
        io::stdin().read_line(&mut code)?;
        Ok(code.trim().to_string())
    }
}

/// The consumed surface of the brokerage client.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Perform a fresh login, consulting `mfa` when the remote side demands
    /// a second factor. On success the returned session is also installed on
    /// the client for subsequent calls.
    async fn login(
        &self,
        credentials: &Credentials,
        mfa: &dyn MfaPrompt,
    ) -> Result<Session, BrokerError>;

    /// Install a previously persisted session on the client. Validity is not
    /// checked here; the first authenticated call establishes it.
    fn restore(&self, session: Session);

    /// Revoke the current session with the remote side, if one is installed.
    async fn logout(&self) -> Result<(), BrokerError>;

    async fn account_profile(&self) -> Result<AccountProfile, BrokerError>;

    async fn portfolio_profile(&self) -> Result<PortfolioProfile, BrokerError>;

    async fn positions(&self) -> Result<Vec<Position>, BrokerError>;

    /// Resolve an instrument reference (an opaque URL returned by the
    /// positions endpoint) to its instrument record.
    async fn instrument_by_url(&self, reference: &str) -> Result<Instrument, BrokerError>;
}
