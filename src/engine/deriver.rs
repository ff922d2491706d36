//! Balance deriver: turns aggregated totals into spendable figures.
//!
//! For each team with a summary:
//!
//! ```text
//! balance  = starting_balance + income - expense
//! max_bid  = market_value / 4 + balance
//! standing = market_value + balance - reference_floor
//! ```
//!
//! Teams without a summary keep their previous figures.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info, warn};

use crate::types::{SummaryBook, Team, TeamSummary};

/// A team may bid a quarter of its market value on top of its balance.
const MARKET_VALUE_BID_DIVISOR: Decimal = dec!(4);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DeriverConfig {
    pub starting_balance: Decimal,
    /// Independent of `starting_balance`; the two only coincide by value.
    pub reference_floor: Decimal,
}

// ---------------------------------------------------------------------------
// Derivation report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivationReport {
    pub updated: usize,
    /// Roster teams with no summary, left as they were.
    pub unchanged: Vec<u64>,
    pub total_balance: Decimal,
}

// ---------------------------------------------------------------------------
// Deriver
// ---------------------------------------------------------------------------

pub struct BalanceDeriver {
    config: DeriverConfig,
}

impl BalanceDeriver {
    pub fn new(config: DeriverConfig) -> Self {
        Self { config }
    }

    /// Recompute one team's balance, max bid and standing.
    pub fn settle(&self, team: &mut Team, summary: &TeamSummary) {
        team.balance = self.config.starting_balance + summary.total_income - summary.total_expense;
        team.max_bid = team.market_value / MARKET_VALUE_BID_DIVISOR + team.balance;
        team.standing = team.market_value + team.balance - self.config.reference_floor;
    }

    /// Settle every roster team that has a summary, in roster order.
    pub fn reconcile(&self, teams: &mut [Team], summaries: &SummaryBook) -> DerivationReport {
        let mut report = DerivationReport::default();

        for team in teams.iter_mut() {
            match summaries.get(&team.id) {
                Some(summary) => {
                    self.settle(team, summary);
                    debug!(team = %team, net = %summary.net(), "Team settled");
                    report.updated += 1;
                }
                None => {
                    warn!(team_id = team.id, name = %team.name, "No summary for team, leaving figures unchanged");
                    report.unchanged.push(team.id);
                }
            }
            report.total_balance += team.balance;
        }

        info!(
            updated = report.updated,
            unchanged = report.unchanged.len(),
            total_balance = %report.total_balance,
            "Balances derived"
        );

        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
