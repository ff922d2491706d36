//! Persistence layer.
//!
//! Two JSON documents sit between the phases of a run:
//! - the roster snapshot, a list of teams rewritten after balances are derived
//! - the transaction summary, team id → totals and event log

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, error, info};

use crate::types::{SummaryBook, SyncError, Team};

fn read_json<T: DeserializeOwned>(path: &str, document: &str) -> Result<T> {
    let json = std::fs::read_to_string(path).map_err(|e| SyncError::Io {
        path: path.to_string(),
        message: e.to_string(),
    })?;

    let value = serde_json::from_str(&json).map_err(|e| SyncError::MalformedData {
        document: format!("{document} ({path})"),
        message: e.to_string(),
    })?;

    Ok(value)
}

fn write_json<T: Serialize + ?Sized>(value: &T, path: &str, document: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| SyncError::MalformedData {
        document: document.to_string(),
        message: e.to_string(),
    })?;

    std::fs::write(path, json).map_err(|e| SyncError::Io {
        path: path.to_string(),
        message: e.to_string(),
    })?;

    Ok(())
}

/// Save the roster snapshot.
pub fn save_roster(teams: &[Team], path: &str) -> Result<()> {
    write_json(teams, path, "roster")?;
    debug!(path, teams = teams.len(), "Roster saved");
    Ok(())
}

/// Load the roster snapshot.
pub fn load_roster(path: &str) -> Result<Vec<Team>> {
    let teams: Vec<Team> = read_json(path, "roster")?;
    info!(path, teams = teams.len(), "Roster loaded from disk");
    Ok(teams)
}

#[derive(Deserialize)]
struct TeamId {
    id: u64,
}

/// Load the set of known team ids from the roster snapshot.
///
/// Failures are logged and yield `None` instead of an error.
pub fn load_team_ids(path: &str) -> Option<BTreeSet<u64>> {
    match read_json::<Vec<TeamId>>(path, "roster") {
        Ok(teams) => Some(teams.into_iter().map(|t| t.id).collect()),
        Err(e) => {
            error!(path, error = %e, "Could not read team ids from roster");
            None
        }
    }
}

/// Save the transaction summary.
pub fn save_summary(book: &SummaryBook, path: &str) -> Result<()> {
    write_json(book, path, "transaction summary")?;
    info!(path, teams = book.len(), "Transaction summary saved");
    Ok(())
}

/// Load the transaction summary.
pub fn load_summary(path: &str) -> Result<SummaryBook> {
    let book: SummaryBook = read_json(path, "transaction summary")?;
    debug!(path, teams = book.len(), "Transaction summary loaded");
    Ok(book)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
