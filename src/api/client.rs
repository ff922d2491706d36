//! HTTP client for the league-management API.
//!
//! Base URL: https://biwenger.as.com/api/v2
//! Auth: `Authorization: Bearer {token}` plus `x-league`, `x-user` and
//! `x-version` headers on every league-scoped request.
//! Pagination: offset-based on the board (`?offset=N&limit=M`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::auth::Session;
use super::LedgerSource;
use crate::config::ApiConfig;
use crate::types::{LedgerEvent, SyncError, Team};

const USER_AGENT: &str = "fantasy-ledger/0.1.0";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// `{data: [...]}` envelope of a board page. Missing `data` is an empty page.
#[derive(Debug, Deserialize)]
struct BoardPage {
    #[serde(default)]
    data: Option<Vec<LedgerEvent>>,
}

#[derive(Debug, Deserialize)]
struct LeagueResponse {
    data: LeagueData,
}

#[derive(Debug, Deserialize)]
struct LeagueData {
    #[serde(default)]
    standings: Vec<Standing>,
}

/// One row of the league standings. A row without `teamValue` is malformed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Standing {
    id: u64,
    name: String,
    team_value: Decimal,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Unauthenticated entry point. Logs in and hands out league-scoped clients.
pub struct BiwengerClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) version: String,
}

impl BiwengerClient {
    pub fn new(cfg: &ApiConfig) -> Result<Self> {
        Self::new_with_base_url(
            &cfg.base_url,
            &cfg.version,
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    /// Create a client against a custom base URL (mock servers in tests).
    pub fn new_with_base_url(base_url: &str, version: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client for the league API")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            version: version.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bind a session, producing a client for league-scoped endpoints.
    pub fn league(&self, session: Session) -> LeagueClient {
        LeagueClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            version: self.version.clone(),
            session,
        }
    }
}

/// Client for the endpoints that need league and user headers.
pub struct LeagueClient {
    http: Client,
    base_url: String,
    version: String,
    session: Session,
}

impl LeagueClient {
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.http
            .get(url)
            .header("x-league", self.session.league_id.to_string())
            .header("x-user", self.session.user_id.to_string())
            .header("x-version", &self.version)
            .bearer_auth(self.session.token().expose_secret())
    }

    /// Fetch the league standings as a roster of teams.
    ///
    /// Financial fields are left at zero; the caller settles them.
    pub async fn fetch_roster(&self) -> Result<Vec<Team>> {
        let url = format!("{}/league", self.base_url);
        debug!(url = %url, "Fetching league roster");

        let resp = send(
            self.get(&url)
                .query(&[("include", "all"), ("fields", "*,standings")]),
            "league",
        )
        .await?;

        let league: LeagueResponse = resp.json().await.map_err(|e| SyncError::MalformedData {
            document: "league response".into(),
            message: e.to_string(),
        })?;

        Ok(league
            .data
            .standings
            .into_iter()
            .map(|s| Team::new(s.id, s.name, s.team_value))
            .collect())
    }
}

#[async_trait]
impl LedgerSource for LeagueClient {
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<LedgerEvent>> {
        let url = format!("{}/league/{}/board", self.base_url, self.session.league_id);
        debug!(url = %url, offset, limit, "Fetching board page");

        let resp = send(
            self.get(&url).query(&[("offset", offset), ("limit", limit)]),
            "board",
        )
        .await?;

        let page: BoardPage = resp.json().await.map_err(|e| SyncError::MalformedData {
            document: "board page".into(),
            message: e.to_string(),
        })?;

        Ok(page.data.unwrap_or_default())
    }
}

/// Send a request, mapping network failures and non-2xx statuses to
/// `SyncError::Transport`.
pub(crate) async fn send(req: RequestBuilder, endpoint: &str) -> Result<Response> {
    let resp = req.send().await.map_err(|e| SyncError::Transport {
        endpoint: endpoint.to_string(),
        status: "network".to_string(),
        message: e.to_string(),
    })?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(SyncError::Transport {
            endpoint: endpoint.to_string(),
            status: status.to_string(),
            message: body,
        }
        .into());
    }

    Ok(resp)
}
