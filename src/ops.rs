//! Read operations over an authenticated broker client
//!
//! Each operation performs one or more collaborator calls and reshapes the
//! response into an outcome record. Every collaborator error is caught at
//! this boundary and reported in the record; none propagates.

use rust_decimal::Decimal;
use tracing::warn;

use crate::broker::{BrokerClient, BrokerError};
use crate::types::{AccountsOutcome, PortfolioOutcome, PositionSummary, StatusOutcome};

fn parse_decimal(raw: Option<&str>) -> Option<Decimal> {
    raw.and_then(|s| s.parse::<Decimal>().ok())
}

/// One profile call; any failure reads as "not authenticated".
pub async fn status<C: BrokerClient + ?Sized>(client: &C) -> StatusOutcome {
    match client.account_profile().await {
        Ok(profile) => StatusOutcome::Authenticated {
            account_number: profile.account_number,
            buying_power: parse_decimal(profile.buying_power.as_deref()),
        },
        Err(e) => StatusOutcome::NotAuthenticated {
            error: Some(e.to_string()),
        },
    }
}

/// The API exposes a single account per user; normalize it to a list.
pub async fn accounts<C: BrokerClient + ?Sized>(client: &C) -> AccountsOutcome {
    match client.account_profile().await {
        Ok(profile) => AccountsOutcome::Ok {
            accounts: vec![profile],
        },
        Err(BrokerError::NoAccount) => AccountsOutcome::NoAccounts,
        Err(e) => AccountsOutcome::Error {
            message: e.to_string(),
        },
    }
}

pub async fn portfolio<C: BrokerClient + ?Sized>(client: &C) -> PortfolioOutcome {
    match summarize(client).await {
        Ok(outcome) => outcome,
        Err(e) => PortfolioOutcome::Error {
            message: e.to_string(),
        },
    }
}

async fn summarize<C: BrokerClient + ?Sized>(
    client: &C,
) -> Result<PortfolioOutcome, BrokerError> {
    let profile = client.account_profile().await?;
    let portfolio = client.portfolio_profile().await?;
    let positions = client.positions().await?;

    let mut holdings = Vec::new();
    for position in positions {
        let quantity =
            parse_decimal(position.quantity.as_deref()).unwrap_or(Decimal::ZERO);
        if quantity <= Decimal::ZERO {
            continue;
        }

        // A failed instrument lookup does not drop the position.
        let symbol = match &position.instrument {
            Some(reference) => match client.instrument_by_url(reference).await {
                Ok(instrument) => instrument
                    .symbol
                    .unwrap_or_else(|| "UNKNOWN".to_string()),
                Err(e) => {
                    warn!("Instrument lookup failed for {reference}: {e}");
                    "UNKNOWN".to_string()
                }
            },
            None => "UNKNOWN".to_string(),
        };

        holdings.push(PositionSummary {
            symbol,
            quantity,
            average_cost: parse_decimal(position.average_buy_price.as_deref())
                .unwrap_or(Decimal::ZERO),
        });
    }

    Ok(PortfolioOutcome::Ok {
        equity: parse_decimal(portfolio.equity.as_deref()),
        market_value: parse_decimal(portfolio.market_value.as_deref()),
        buying_power: parse_decimal(profile.buying_power.as_deref()),
        positions: holdings,
    })
}
