//! Outcome records printed by the CLI
//!
//! Every command resolves to exactly one of these records, serialized as a
//! single JSON object with a `status` discriminator. Collaborator failures
//! are folded into the record instead of crashing the process, so humans
//! read the `status` field rather than the exit code.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::broker::AccountProfile;

/// Result of a login attempt (fresh or via a cached session).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginOutcome {
    Authenticated { email: String },
    Failed { error: String },
    /// The remote side wants an out-of-band device approval first. This is a
    /// soft failure: the operator approves the device and retries later.
    VerificationRequired { message: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LogoutOutcome {
    LoggedOut,
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusOutcome {
    Authenticated {
        account_number: Option<String>,
        #[serde(with = "rust_decimal::serde::float_option")]
        buying_power: Option<Decimal>,
    },
    NotAuthenticated {
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccountsOutcome {
    Ok { accounts: Vec<AccountProfile> },
    NoAccounts,
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PortfolioOutcome {
    Ok {
        #[serde(with = "rust_decimal::serde::float_option")]
        equity: Option<Decimal>,
        #[serde(with = "rust_decimal::serde::float_option")]
        market_value: Option<Decimal>,
        #[serde(with = "rust_decimal::serde::float_option")]
        buying_power: Option<Decimal>,
        positions: Vec<PositionSummary>,
    },
    Error { message: String },
}

/// One held instrument within a portfolio summary.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PositionSummary {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_cost: Decimal,
}
