//! Shared types for the league ledger sync.
//!
//! Teams, ledger events and per-team summaries form the data model used
//! by the API client, the engine and the storage layer. Everything that
//! crosses a module boundary lives here so the engine can stay free of
//! transport and file concerns.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A team (league member) as stored in the roster snapshot document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: u64,
    pub name: String,
    /// Current market value of the squad.
    pub market_value: Decimal,
    /// Available spending capacity (derived).
    #[serde(default)]
    pub balance: Decimal,
    /// Highest bid the team may place (derived).
    #[serde(default)]
    pub max_bid: Decimal,
    /// Net position against the reference floor (derived).
    #[serde(default)]
    pub standing: Decimal,
    /// Fields we do not interpret. Written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Team {
    /// Build a team with zeroed financial fields.
    pub fn new(id: u64, name: impl Into<String>, market_value: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            market_value,
            balance: Decimal::ZERO,
            max_bid: Decimal::ZERO,
            standing: Decimal::ZERO,
            extra: Map::new(),
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (value: {} | balance: {} | max bid: {} | standing: {})",
            self.id, self.name, self.market_value, self.balance, self.max_bid, self.standing,
        )
    }
}

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// Ledger event types that carry financial meaning.
///
/// Anything else on the board (news, polls, lineups...) has no variant and
/// is ignored by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Transfer,
    Market,
    ClauseIncrement,
    RoundFinished,
    AdminTransfer,
}

impl EventKind {
    pub const ALL: &'static [EventKind] = &[
        EventKind::Transfer,
        EventKind::Market,
        EventKind::ClauseIncrement,
        EventKind::RoundFinished,
        EventKind::AdminTransfer,
    ];

    /// Wire name used in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Transfer => "transfer",
            EventKind::Market => "market",
            EventKind::ClauseIncrement => "clauseIncrement",
            EventKind::RoundFinished => "roundFinished",
            EventKind::AdminTransfer => "adminTransfer",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match on the wire name.
impl std::str::FromStr for EventKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown event type: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Ledger events
// ---------------------------------------------------------------------------

/// Reference to a team inside an event payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamRef {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

/// One from/to/amount record of a leg-shaped payload.
///
/// `user` is used instead of `from`/`to` by clause increments.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub from: Option<TeamRef>,
    #[serde(default)]
    pub to: Option<TeamRef>,
    #[serde(default)]
    pub user: Option<TeamRef>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl Leg {
    pub fn amount(&self) -> Decimal {
        self.amount.unwrap_or(Decimal::ZERO)
    }
}

/// One entry of a round-end results list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RoundResult {
    #[serde(default)]
    pub user: Option<TeamRef>,
    #[serde(default)]
    pub bonus: Option<Decimal>,
}

impl RoundResult {
    pub fn bonus(&self) -> Decimal {
        self.bonus.unwrap_or(Decimal::ZERO)
    }
}

/// A single board entry, kept as the server sent it.
///
/// Only `type` and `content` are interpreted; every other field (`date`,
/// ids, author...) round-trips through `extra` so the transaction log in
/// the summary document reproduces the original object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    /// `None` when the field is absent; an explicit `null` is kept as
    /// `Some(Value::Null)` so it is written back.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LedgerEvent {
    pub fn new(kind: impl Into<String>, content: Value) -> Self {
        Self {
            kind: kind.into(),
            content: Some(content),
            extra: Map::new(),
        }
    }

    /// The recognized kind, or `None` for types without financial meaning.
    pub fn event_kind(&self) -> Option<EventKind> {
        self.kind.parse().ok()
    }

    /// Event time, from the `date` field (unix seconds).
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let secs = self.extra.get("date")?.as_i64()?;
        Utc.timestamp_opt(secs, 0).single()
    }

    /// Whether the payload is present and non-empty.
    pub fn has_content(&self) -> bool {
        match &self.content {
            None | Some(Value::Null) => false,
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            Some(_) => true,
        }
    }

    /// Interpret the payload as a list of legs.
    ///
    /// A single object is accepted as one leg. Unreadable legs are logged
    /// and dropped without affecting their siblings.
    pub fn legs(&self) -> Vec<Leg> {
        match &self.content {
            Some(Value::Array(items)) => parse_entries(&self.kind, items),
            Some(v @ Value::Object(_)) => parse_entries(&self.kind, std::slice::from_ref(v)),
            _ => Vec::new(),
        }
    }

    /// Interpret the payload as a round-end `{results: [...]}` object.
    pub fn round_results(&self) -> Vec<RoundResult> {
        match &self.content {
            Some(Value::Object(o)) => match o.get("results") {
                Some(Value::Array(items)) => parse_entries(&self.kind, items),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn parse_entries<T: DeserializeOwned>(kind: &str, items: &[Value]) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(kind, index, error = %e, "Unreadable ledger entry, skipping");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Accumulated income, expense and event log for one team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    /// Every event that touched this team, in fetch order.
    #[serde(default)]
    pub transactions: Vec<LedgerEvent>,
}

impl TeamSummary {
    pub fn net(&self) -> Decimal {
        self.total_income - self.total_expense
    }
}

/// Team id → summary. Serialized with the ids as string keys.
pub type SummaryBook = BTreeMap<u64, TeamSummary>;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failure taxonomy for a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request to {endpoint} failed ({status}): {message}")]
    Transport {
        endpoint: String,
        /// HTTP status, or "network" when no response was received.
        status: String,
        message: String,
    },

    #[error("Malformed {document}: {message}")]
    MalformedData { document: String, message: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
