//! Core engine: fetch the ledger, aggregate it per team, derive balances.

pub mod fetcher;
pub mod aggregator;
pub mod deriver;
pub mod pipeline;
