//! HTTP-backed implementation of the consumed brokerage surface
//!
//! Speaks the same contract as the upstream tooling: a password grant with a
//! per-install device token against `/oauth2/token/`, bearer-token reads, and
//! a paginated `{results, next}` envelope on list endpoints. Challenge and
//! verification responses are classified by structured response fields, not
//! by scanning message text.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header::ACCEPT, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::config::Credentials;
use crate::session::Session;

use super::models::Paginated;
use super::{AccountProfile, BrokerClient, BrokerError, Instrument, MfaPrompt, PortfolioProfile, Position};

const DEFAULT_HOST: &str = "https://api.robinhood.com";
// Public OAuth client id the official apps use for the password grant.
const CLIENT_ID: &str = "c82SH0WZOsabOXGP2sxqcj34FxkvfnWRZBKlBjFS";
const TOKEN_LIFETIME_SECS: i64 = 86400;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

struct ClientState {
    session: Option<Session>,
    device_token: String,
}

pub struct RobinhoodClient {
    http: reqwest::Client,
    base: Url,
    state: Mutex<ClientState>,
}

enum TokenOutcome {
    Session(Session),
    MfaRequired,
}

impl RobinhoodClient {
    pub fn new() -> Result<Self, BrokerError> {
        Self::with_host(DEFAULT_HOST)
    }

    pub fn with_host(host: &str) -> Result<Self, BrokerError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base: Url::parse(host)?,
            state: Mutex::new(ClientState {
                session: None,
                device_token: Uuid::new_v4().to_string(),
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session_snapshot(&self) -> Option<Session> {
        self.state().session.clone()
    }

    async fn token_request(
        &self,
        credentials: &Credentials,
        mfa_code: Option<&str>,
    ) -> Result<TokenOutcome, BrokerError> {
        let device_token = self.state().device_token.clone();
        let mut body = json!({
            "grant_type": "password",
            "client_id": CLIENT_ID,
            "scope": "internal",
            "username": credentials.email,
            "password": credentials.password,
            "device_token": device_token,
            "expires_in": TOKEN_LIFETIME_SECS,
        });
        if let Some(code) = mfa_code {
            body["mfa_code"] = json!(code);
        }

        let response = self
            .http
            .post(self.base.join("/oauth2/token/")?)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let payload: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        // A challenge or verification workflow means the device must be
        // approved out-of-band before a session will be issued.
        if payload.get("challenge").is_some() || payload.get("verification_workflow").is_some() {
            let message = payload
                .get("detail")
                .and_then(Value::as_str)
                .unwrap_or("device verification pending")
                .to_string();
            return Err(BrokerError::VerificationRequired { message });
        }

        if payload.get("mfa_required").and_then(Value::as_bool) == Some(true) {
            return Ok(TokenOutcome::MfaRequired);
        }

        if !status.is_success() {
            return Err(BrokerError::Api {
                status: status.as_u16(),
                detail: detail_from(&payload, &text),
            });
        }

        match build_session(&payload, device_token) {
            Some(session) => Ok(TokenOutcome::Session(session)),
            None => Err(BrokerError::EmptyLogin),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, BrokerError> {
        let session = self
            .session_snapshot()
            .ok_or(BrokerError::NotAuthenticated)?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&session.access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(BrokerError::SessionExpired);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BrokerError::Api {
                status: status.as_u16(),
                detail: text,
            });
        }
        Ok(response.json().await?)
    }
}

fn detail_from(payload: &Value, raw: &str) -> String {
    payload
        .get("detail")
        .and_then(Value::as_str)
        .unwrap_or(raw)
        .to_string()
}

fn build_session(payload: &Value, device_token: String) -> Option<Session> {
    let access_token = payload.get("access_token")?.as_str()?;
    if access_token.is_empty() {
        return None;
    }
    Some(Session {
        access_token: access_token.to_string(),
        token_type: payload
            .get("token_type")
            .and_then(Value::as_str)
            .unwrap_or("Bearer")
            .to_string(),
        refresh_token: payload
            .get("refresh_token")
            .and_then(Value::as_str)
            .map(str::to_string),
        device_token,
        expires_at: payload
            .get("expires_in")
            .and_then(Value::as_i64)
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
    })
}

#[async_trait]
impl BrokerClient for RobinhoodClient {
    async fn login(
        &self,
        credentials: &Credentials,
        mfa: &dyn MfaPrompt,
    ) -> Result<Session, BrokerError> {
        info!("📡 Logging in as {}...", credentials.email);
        let outcome = self.token_request(credentials, None).await?;
        let session = match outcome {
            TokenOutcome::Session(session) => session,
            TokenOutcome::MfaRequired => {
                info!("🔑 Second factor requested");
                let code = mfa.mfa_code()?;
                match self.token_request(credentials, Some(&code)).await? {
                    TokenOutcome::Session(session) => session,
                    TokenOutcome::MfaRequired => {
                        return Err(BrokerError::Api {
                            status: StatusCode::UNAUTHORIZED.as_u16(),
                            detail: "one-time code rejected".to_string(),
                        })
                    }
                }
            }
        };
        self.state().session = Some(session.clone());
        Ok(session)
    }

    fn restore(&self, session: Session) {
        let mut state = self.state();
        state.device_token = session.device_token.clone();
        state.session = Some(session);
    }

    async fn logout(&self) -> Result<(), BrokerError> {
        let Some(session) = self.session_snapshot() else {
            info!("No active session to revoke");
            return Ok(());
        };
        let token = session
            .refresh_token
            .unwrap_or(session.access_token);
        let body = json!({"client_id": CLIENT_ID, "token": token});
        let response = self
            .http
            .post(self.base.join("/oauth2/revoke_token/")?)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BrokerError::Api {
                status: status.as_u16(),
                detail: text,
            });
        }
        self.state().session = None;
        Ok(())
    }

    async fn account_profile(&self) -> Result<AccountProfile, BrokerError> {
        let page: Paginated<AccountProfile> =
            self.get_json(self.base.join("/accounts/")?).await?;
        page.results.into_iter().next().ok_or(BrokerError::NoAccount)
    }

    async fn portfolio_profile(&self) -> Result<PortfolioProfile, BrokerError> {
        let page: Paginated<PortfolioProfile> =
            self.get_json(self.base.join("/portfolios/")?).await?;
        page.results.into_iter().next().ok_or(BrokerError::NoAccount)
    }

    async fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        let mut results = Vec::new();
        let mut next = Some(self.base.join("/positions/?nonzero=true")?);
        while let Some(url) = next {
            let page: Paginated<Position> = self.get_json(url).await?;
            results.extend(page.results);
            next = match page.next {
                Some(cursor) => Some(Url::parse(&cursor)?),
                None => None,
            };
        }
        Ok(results)
    }

    async fn instrument_by_url(&self, reference: &str) -> Result<Instrument, BrokerError> {
        let url = Url::parse(reference)?;
        if url.host_str() != self.base.host_str() || url.port() != self.base.port() {
            return Err(BrokerError::ForeignInstrumentRef {
                url: reference.to_string(),
            });
        }
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{NoPrompt, StaticPrompt};
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials {
            email: "user@example.com".to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn stored_session(token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            device_token: "device-1".to_string(),
            expires_at: None,
        }
    }

    async fn client_for(server: &MockServer) -> RobinhoodClient {
        RobinhoodClient::with_host(&server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_login_returns_installed_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token/"))
            .and(body_partial_json(serde_json::json!({
                "grant_type": "password",
                "username": "user@example.com",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-1",
                "token_type": "Bearer",
                "refresh_token": "ref-1",
                "expires_in": 86400,
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let session = client.login(&credentials(), &NoPrompt).await.unwrap();

        assert_eq!(session.access_token, "tok-1");
        assert_eq!(session.refresh_token.as_deref(), Some("ref-1"));
        assert!(session.expires_at.is_some());
        assert_eq!(client.session_snapshot(), Some(session));
    }

    #[tokio::test]
    async fn test_login_retries_with_one_time_code() {
        let server = MockServer::start().await;
        // Specific matcher first: wiremock dispatches in mount order.
        Mock::given(method("POST"))
            .and(path("/oauth2/token/"))
            .and(body_partial_json(serde_json::json!({"mfa_code": "123456"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-mfa",
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "mfa_required": true,
                "mfa_type": "app",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let session = client
            .login(&credentials(), &StaticPrompt("123456"))
            .await
            .unwrap();
        assert_eq!(session.access_token, "tok-mfa");
    }

    #[tokio::test]
    async fn test_challenge_maps_to_verification_required() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "challenge": {"id": "abc", "type": "sms"},
                "detail": "Device challenge issued",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.login(&credentials(), &NoPrompt).await.unwrap_err();
        match err {
            BrokerError::VerificationRequired { message } => {
                assert_eq!(message, "Device challenge issued");
            }
            other => panic!("expected VerificationRequired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verification_workflow_without_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token/"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "verification_workflow": {"id": "wf-1"},
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.login(&credentials(), &NoPrompt).await.unwrap_err();
        assert!(matches!(err, BrokerError::VerificationRequired { .. }));
    }

    #[tokio::test]
    async fn test_successful_response_without_token_is_empty_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.login(&credentials(), &NoPrompt).await.unwrap_err();
        assert!(matches!(err, BrokerError::EmptyLogin));
    }

    #[tokio::test]
    async fn test_bad_credentials_surface_api_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "detail": "Unable to log in with provided credentials.",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.login(&credentials(), &NoPrompt).await.unwrap_err();
        match err {
            BrokerError::Api { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail, "Unable to log in with provided credentials.");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reads_require_a_session() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;
        let err = client.account_profile().await.unwrap_err();
        assert!(matches!(err, BrokerError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_account_profile_sends_bearer_and_takes_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/"))
            .and(header("authorization", "Bearer tok-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"account_number": "5PY12345", "buying_power": "1200.50"},
                    {"account_number": "IGNORED"},
                ],
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.restore(stored_session("tok-9"));
        let profile = client.account_profile().await.unwrap();
        assert_eq!(profile.account_number.as_deref(), Some("5PY12345"));
    }

    #[tokio::test]
    async fn test_empty_accounts_page_is_no_account() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"results": []})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.restore(stored_session("tok-9"));
        let err = client.account_profile().await.unwrap_err();
        assert!(matches!(err, BrokerError::NoAccount));
    }

    #[tokio::test]
    async fn test_unauthorized_read_maps_to_session_expired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.restore(stored_session("stale"));
        let err = client.account_profile().await.unwrap_err();
        assert!(matches!(err, BrokerError::SessionExpired));
    }

    #[tokio::test]
    async fn test_positions_follow_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/positions/"))
            .and(query_param("cursor", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"quantity": "1.0000"}],
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/positions/"))
            .and(query_param("nonzero", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"quantity": "3.0000"}],
                "next": format!("{}/positions/?cursor=page2", server.uri()),
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.restore(stored_session("tok-9"));
        let positions = client.positions().await.unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].quantity.as_deref(), Some("3.0000"));
        assert_eq!(positions[1].quantity.as_deref(), Some("1.0000"));
    }

    #[tokio::test]
    async fn test_instrument_lookup_refuses_foreign_hosts() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;
        client.restore(stored_session("tok-9"));
        let err = client
            .instrument_by_url("https://attacker.example.com/instruments/abc/")
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::ForeignInstrumentRef { .. }));
    }

    #[tokio::test]
    async fn test_instrument_lookup_resolves_symbol() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instruments/abc/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"symbol": "AAPL"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.restore(stored_session("tok-9"));
        let instrument = client
            .instrument_by_url(&format!("{}/instruments/abc/", server.uri()))
            .await
            .unwrap();
        assert_eq!(instrument.symbol.as_deref(), Some("AAPL"));
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token_and_drops_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/revoke_token/"))
            .and(body_partial_json(serde_json::json!({"token": "refresh-1"})))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.restore(stored_session("tok-9"));
        client.logout().await.unwrap();
        assert!(client.session_snapshot().is_none());
    }

    #[tokio::test]
    async fn test_logout_without_session_is_a_noop() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;
        client.logout().await.unwrap();
    }
}
