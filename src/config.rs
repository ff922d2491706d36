//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (credentials, bearer token) are referenced by env-var name in
//! the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;

use crate::engine::aggregator::AggregatorConfig;
use crate::engine::deriver::DeriverConfig;
use crate::engine::fetcher::PAGE_SIZE;
use crate::types::EventKind;

pub const DEFAULT_BASE_URL: &str = "https://biwenger.as.com/api/v2";
pub const DEFAULT_API_VERSION: &str = "628";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub league: LeagueConfig,
    #[serde(default)]
    pub api: ApiConfig,
    pub finance: FinanceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LeagueConfig {
    pub id: u64,
    /// Acting user id. Resolved from the account endpoint when absent.
    #[serde(default)]
    pub user_id: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as `x-version` on every league request.
    #[serde(default = "default_api_version")]
    pub version: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_email_env")]
    pub email_env: String,
    #[serde(default = "default_password_env")]
    pub password_env: String,
    /// A pre-issued bearer token skips the login call.
    #[serde(default)]
    pub token_env: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            version: default_api_version(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            email_env: default_email_env(),
            password_env: default_password_env(),
            token_env: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FinanceConfig {
    /// Balance every team starts the season with.
    pub starting_balance: Decimal,
    /// Floor the standing is measured against. Kept separate from
    /// `starting_balance` even though both hold the same value today.
    pub reference_floor: Decimal,
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<EventKind>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_roster_path")]
    pub roster_path: String,
    #[serde(default = "default_summary_path")]
    pub summary_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            roster_path: default_roster_path(),
            summary_path: default_summary_path(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_page_size() -> u32 {
    PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_email_env() -> String {
    "BIWENGER_EMAIL".to_string()
}

fn default_password_env() -> String {
    "BIWENGER_PASSWORD".to_string()
}

fn default_allowed_types() -> Vec<EventKind> {
    EventKind::ALL.to_vec()
}

fn default_roster_path() -> String {
    "teams.json".to_string()
}

fn default_summary_path() -> String {
    "grouped_transactions.json".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api.page_size == 0 {
            anyhow::bail!("api.page_size must be greater than zero");
        }
        if self.finance.allowed_types.is_empty() {
            anyhow::bail!("finance.allowed_types must name at least one event type");
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            allowed: self.finance.allowed_types.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    pub fn deriver_config(&self) -> DeriverConfig {
        DeriverConfig {
            starting_balance: self.finance.starting_balance,
            reference_floor: self.finance.reference_floor,
        }
    }
}
