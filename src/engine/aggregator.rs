//! Event classifier and aggregator.
//!
//! Attributes every recognized ledger event to the team(s) it affects,
//! accumulating income and expense per team and appending the event to
//! each touched team's log exactly once.
//!
//! Attribution per type:
//!
//! | type            | effect                                                       |
//! |-----------------|--------------------------------------------------------------|
//! | market          | `to` pays `amount`                                           |
//! | transfer        | `from` receives `amount`; `to` pays it only if `from` exists |
//! | adminTransfer   | `to` pays `amount`; `from` receives it                       |
//! | clauseIncrement | `user` pays `amount`, or receives `abs(amount)` if negative |
//! | roundFinished   | each result's `user` receives `bonus`                        |

use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

use crate::types::{EventKind, LedgerEvent, SummaryBook, TeamSummary};

/// Which event kinds the aggregator acts on.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    pub allowed: BTreeSet<EventKind>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            allowed: EventKind::ALL.iter().copied().collect(),
        }
    }
}

/// A single income or expense movement for one team.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Entry {
    Income(u64, Decimal),
    Expense(u64, Decimal),
}

pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Build one summary per known team from the full event sequence.
    ///
    /// Every id in `team_ids` gets an entry, even with no matching events.
    pub fn aggregate<'a, I>(&self, events: &[LedgerEvent], team_ids: I) -> SummaryBook
    where
        I: IntoIterator<Item = &'a u64>,
    {
        let mut book: SummaryBook = team_ids
            .into_iter()
            .map(|id| (*id, TeamSummary::default()))
            .collect();

        let mut touched: HashSet<u64> = HashSet::new();
        let mut attributed = 0usize;
        let mut skipped = 0usize;

        for event in events {
            touched.clear();

            let Some(kind) = event.event_kind() else {
                skipped += 1;
                continue;
            };
            if !self.config.allowed.contains(&kind) || !event.has_content() {
                debug!(kind = %kind, "Skipping event");
                skipped += 1;
                continue;
            }

            let entries = Self::classify(kind, event, &book, &mut touched);

            for entry in entries {
                match entry {
                    Entry::Income(id, amount) => {
                        if let Some(s) = book.get_mut(&id) {
                            s.total_income += amount;
                        }
                    }
                    Entry::Expense(id, amount) => {
                        if let Some(s) = book.get_mut(&id) {
                            s.total_expense += amount;
                        }
                    }
                }
            }

            for id in &touched {
                if let Some(s) = book.get_mut(id) {
                    s.transactions.push(event.clone());
                }
            }
            if !touched.is_empty() {
                attributed += 1;
            }
        }

        info!(
            events = events.len(),
            attributed,
            skipped,
            teams = book.len(),
            "Ledger aggregated"
        );

        book
    }

    /// Turn one event into income/expense entries for known teams.
    ///
    /// Adds every known team a leg refers to into `touched`. Legs naming
    /// unknown teams contribute nothing for that team; unreadable legs are
    /// dropped by the payload accessors.
    fn classify(
        kind: EventKind,
        event: &LedgerEvent,
        book: &SummaryBook,
        touched: &mut HashSet<u64>,
    ) -> Vec<Entry> {
        let mut known = |id: u64| {
            let hit = book.contains_key(&id);
            if hit {
                touched.insert(id);
            }
            hit
        };
        let mut entries = Vec::new();

        match kind {
            EventKind::Market => {
                for leg in event.legs() {
                    if let Some(to) = &leg.to {
                        if known(to.id) {
                            entries.push(Entry::Expense(to.id, leg.amount()));
                        }
                    }
                }
            }
            EventKind::Transfer => {
                for leg in event.legs() {
                    if let Some(from) = &leg.from {
                        if known(from.id) {
                            entries.push(Entry::Income(from.id, leg.amount()));
                        }
                    }
                    if let Some(to) = &leg.to {
                        // Free pickups carry no `from` and cost nothing.
                        if known(to.id) && leg.from.is_some() {
                            entries.push(Entry::Expense(to.id, leg.amount()));
                        }
                    }
                }
            }
            EventKind::AdminTransfer => {
                for leg in event.legs() {
                    if let Some(to) = &leg.to {
                        if known(to.id) {
                            entries.push(Entry::Expense(to.id, leg.amount()));
                        }
                    }
                    if let Some(from) = &leg.from {
                        if known(from.id) {
                            entries.push(Entry::Income(from.id, leg.amount()));
                        }
                    }
                }
            }
            EventKind::ClauseIncrement => {
                for leg in event.legs() {
                    if let Some(user) = &leg.user {
                        if known(user.id) {
                            let amount = leg.amount();
                            if amount < Decimal::ZERO {
                                entries.push(Entry::Income(user.id, amount.abs()));
                            } else {
                                entries.push(Entry::Expense(user.id, amount));
                            }
                        }
                    }
                }
            }
            EventKind::RoundFinished => {
                for result in event.round_results() {
                    if let Some(user) = &result.user {
                        if known(user.id) {
                            entries.push(Entry::Income(user.id, result.bonus()));
                        }
                    }
                }
            }
        }

        entries
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
