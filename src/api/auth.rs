//! Authentication and session establishment.
//!
//! Login: `POST /auth/login` with `{email, password}` → `{token}`.
//! Acting user: `GET /account` lists the leagues the account belongs to,
//! each carrying the user id the account plays as in that league.

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use super::client::{send, BiwengerClient};
use crate::config::{ApiConfig, AppConfig};
use crate::types::SyncError;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Authenticated context for league-scoped requests.
#[derive(Debug)]
pub struct Session {
    pub league_id: u64,
    pub user_id: u64,
    token: SecretString,
}

impl Session {
    pub fn new(league_id: u64, user_id: u64, token: SecretString) -> Self {
        Self {
            league_id,
            user_id,
            token,
        }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

/// Login credentials, resolved from the environment.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn from_env(cfg: &ApiConfig) -> Result<Self> {
        let email = AppConfig::resolve_env(&cfg.email_env);
        let password = AppConfig::resolve_env(&cfg.password_env);
        match (email, password) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => Ok(Self {
                email,
                password: SecretString::new(password),
            }),
            _ => Err(SyncError::Authentication(format!(
                "credentials not configured: set {} and {}",
                cfg.email_env, cfg.password_env
            ))
            .into()),
        }
    }
}

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    data: AccountData,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    #[serde(default)]
    leagues: Vec<AccountLeague>,
}

#[derive(Debug, Deserialize)]
struct AccountLeague {
    id: u64,
    user: AccountUser,
}

#[derive(Debug, Deserialize)]
struct AccountUser {
    id: u64,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

impl BiwengerClient {
    /// Exchange credentials for a bearer token.
    pub async fn login(&self, creds: &Credentials) -> Result<SecretString> {
        let url = format!("{}/auth/login", self.base_url);
        debug!(url = %url, email = %creds.email, "Logging in");

        let body = serde_json::json!({
            "email": creds.email,
            "password": creds.password.expose_secret(),
        });

        let resp = send(self.http.post(&url).json(&body), "auth/login")
            .await
            .map_err(|e| SyncError::Authentication(format!("login rejected: {e}")))?;

        let login: LoginResponse = resp
            .json()
            .await
            .map_err(|e| SyncError::Authentication(format!("malformed login response: {e}")))?;

        match login.token {
            Some(token) if !token.is_empty() => {
                info!("Login succeeded");
                Ok(SecretString::new(token))
            }
            _ => Err(SyncError::Authentication("login response carried no token".into()).into()),
        }
    }

    /// Find the user id the account plays as in `league_id`.
    pub async fn resolve_user_id(&self, token: &SecretString, league_id: u64) -> Result<u64> {
        let url = format!("{}/account", self.base_url);
        debug!(url = %url, league_id, "Resolving acting user");

        let resp = send(
            self.http
                .get(&url)
                .header("x-version", &self.version)
                .bearer_auth(token.expose_secret()),
            "account",
        )
        .await
        .map_err(|e| SyncError::Authentication(format!("account lookup failed: {e}")))?;

        let account: AccountResponse = resp
            .json()
            .await
            .map_err(|e| SyncError::Authentication(format!("malformed account response: {e}")))?;

        account
            .data
            .leagues
            .iter()
            .find(|l| l.id == league_id)
            .map(|l| l.user.id)
            .ok_or_else(|| {
                SyncError::Authentication(format!("account is not a member of league {league_id}"))
                    .into()
            })
    }
}

/// Establish a session: pre-issued token or login, then the acting user id
/// from config or the account endpoint.
pub async fn establish_session(client: &BiwengerClient, cfg: &AppConfig) -> Result<Session> {
    let preissued = cfg
        .api
        .token_env
        .as_deref()
        .and_then(|env| std::env::var(env).ok())
        .filter(|t| !t.trim().is_empty());

    let token = match preissued {
        Some(token) => {
            info!("Using pre-issued bearer token");
            SecretString::new(token)
        }
        None => {
            let creds = Credentials::from_env(&cfg.api)?;
            client.login(&creds).await?
        }
    };

    let user_id = match cfg.league.user_id {
        Some(id) => id,
        None => client.resolve_user_id(&token, cfg.league.id).await?,
    };

    info!(league_id = cfg.league.id, user_id, "Session established");
    Ok(Session::new(cfg.league.id, user_id, token))
}
