//! The persisted phases of a sync run.
//!
//! Snapshot: fetched standings → roster document, previous figures kept.
//! Collect: roster ids → ledger fetch → aggregation → summary document.
//! Apply: roster + summary documents → derived balances → roster document.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::api::LedgerSource;
use crate::engine::aggregator::Aggregator;
use crate::engine::deriver::{BalanceDeriver, DerivationReport};
use crate::engine::fetcher::fetch_ledger;
use crate::storage;
use crate::types::{SummaryBook, Team, TeamSummary};

/// Write freshly fetched teams to the roster document.
///
/// Teams already in the document keep their balance, max bid and standing
/// until the apply phase recomputes them. Only teams seen for the first time
/// get opening figures.
pub fn snapshot_roster(deriver: &BalanceDeriver, teams: &mut [Team], roster_path: &str) -> Result<()> {
    let previous: HashMap<u64, Team> = if Path::new(roster_path).exists() {
        match storage::load_roster(roster_path) {
            Ok(prev) => prev.into_iter().map(|t| (t.id, t)).collect(),
            Err(e) => {
                warn!(path = roster_path, error = %e, "Previous roster unreadable, using opening figures");
                HashMap::new()
            }
        }
    } else {
        HashMap::new()
    };

    let opening = TeamSummary::default();
    let mut opened = 0usize;
    for team in teams.iter_mut() {
        match previous.get(&team.id) {
            Some(prev) => {
                team.balance = prev.balance;
                team.max_bid = prev.max_bid;
                team.standing = prev.standing;
            }
            None => {
                deriver.settle(team, &opening);
                opened += 1;
            }
        }
    }

    storage::save_roster(teams, roster_path).context("Failed to write roster snapshot")?;
    info!(teams = teams.len(), new_teams = opened, path = roster_path, "Roster snapshot written");
    Ok(())
}

/// Fetch and summarize the ledger for every team in the roster document.
///
/// Returns `Ok(None)` without fetching when the roster cannot be read or
/// lists no teams. Fetch failures propagate and nothing is written.
pub async fn collect_and_summarize<S>(
    source: &S,
    aggregator: &Aggregator,
    page_size: u32,
    roster_path: &str,
    summary_path: &str,
) -> Result<Option<SummaryBook>>
where
    S: LedgerSource + ?Sized,
{
    let Some(team_ids) = storage::load_team_ids(roster_path) else {
        return Ok(None);
    };
    if team_ids.is_empty() {
        warn!(path = roster_path, "Roster lists no teams, nothing to summarize");
        return Ok(None);
    }

    let events = fetch_ledger(source, page_size).await?;
    let book = aggregator.aggregate(&events, &team_ids);

    storage::save_summary(&book, summary_path)?;
    Ok(Some(book))
}

/// Derive balances from the summary document and rewrite the roster.
pub fn apply_balances(
    deriver: &BalanceDeriver,
    roster_path: &str,
    summary_path: &str,
) -> Result<DerivationReport> {
    let mut teams = storage::load_roster(roster_path).context("Failed to load roster snapshot")?;
    let book = storage::load_summary(summary_path).context("Failed to load transaction summary")?;

    let report = deriver.reconcile(&mut teams, &book);

    storage::save_roster(&teams, roster_path).context("Failed to write roster snapshot")?;
    info!(path = roster_path, updated = report.updated, "Roster updated");

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
