//! Ledger fetcher.
//!
//! Walks the board with an offset/limit cursor until the source runs dry,
//! accumulating pages in request order. Any failure aborts the whole fetch;
//! pages already received are dropped so a truncated ledger never reaches
//! the aggregator.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::LedgerSource;
use crate::types::LedgerEvent;

/// Page size used against the board.
pub const PAGE_SIZE: u32 = 100;

/// Fetch the complete ledger, one page at a time.
///
/// Stops after the first empty page or the first page shorter than
/// `page_size`, whichever comes first.
pub async fn fetch_ledger<S>(source: &S, page_size: u32) -> Result<Vec<LedgerEvent>>
where
    S: LedgerSource + ?Sized,
{
    anyhow::ensure!(page_size > 0, "page size must be greater than zero");

    let mut events = Vec::new();
    let mut offset: u32 = 0;

    info!(page_size, "Fetching ledger");

    loop {
        let page = source
            .fetch_page(offset, page_size)
            .await
            .with_context(|| format!("Ledger fetch aborted at offset {offset}"))?;

        if page.is_empty() {
            debug!(offset, "Empty page, ledger exhausted");
            break;
        }

        let count = page.len();
        events.extend(page);
        info!(offset, count, total = events.len(), "Ledger page fetched");

        if count < page_size as usize {
            break;
        }
        offset += page_size;
    }

    let first = events.iter().find_map(LedgerEvent::timestamp);
    let last = events.iter().rev().find_map(LedgerEvent::timestamp);
    info!(
        total = events.len(),
        first = ?first,
        last = ?last,
        "Ledger fetch complete"
    );

    Ok(events)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
