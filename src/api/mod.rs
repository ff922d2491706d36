//! Remote league API.
//!
//! Defines the `LedgerSource` trait the ledger fetcher paginates over, and
//! provides the HTTP implementation for the league-management service:
//! - `auth`: login, account lookup and session establishment
//! - `client`: board (ledger) pages and the roster snapshot

pub mod auth;
pub mod client;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::LedgerEvent;

/// A paginated source of ledger events.
///
/// Implementors return one page per call, in ledger order. An empty page
/// means the offset is past the end of the ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Fetch up to `limit` events starting at `offset`.
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<LedgerEvent>>;
}
