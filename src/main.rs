//! Fantasy league ledger sync: entry point.
//!
//! Loads configuration, initialises structured logging, then runs the fixed
//! sequence: login → roster snapshot → ledger fetch + aggregation → balance
//! derivation. Any unhandled failure exits non-zero.

use anyhow::{Context, Result};
use tracing::{info, warn};

use fantasy_ledger::api::auth::establish_session;
use fantasy_ledger::api::client::BiwengerClient;
use fantasy_ledger::config;
use fantasy_ledger::engine::aggregator::Aggregator;
use fantasy_ledger::engine::deriver::{BalanceDeriver, DerivationReport};
use fantasy_ledger::engine::pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load("config.toml")?;

    init_logging();

    info!(
        league_id = cfg.league.id,
        base_url = %cfg.api.base_url,
        page_size = cfg.api.page_size,
        starting_balance = %cfg.finance.starting_balance,
        "Ledger sync starting"
    );

    let aggregator = Aggregator::new(cfg.aggregator_config());
    let deriver = BalanceDeriver::new(cfg.deriver_config());

    // 1. Login
    let client = BiwengerClient::new(&cfg.api)?;
    let session = establish_session(&client, &cfg).await?;
    let league = client.league(session);

    // 2. Roster snapshot
    let mut teams = league.fetch_roster().await.context("Failed to fetch league roster")?;
    pipeline::snapshot_roster(&deriver, &mut teams, &cfg.storage.roster_path)?;

    // 3. Ledger fetch + aggregation
    let summary = pipeline::collect_and_summarize(
        &league,
        &aggregator,
        cfg.api.page_size,
        &cfg.storage.roster_path,
        &cfg.storage.summary_path,
    )
    .await?;

    if summary.is_none() {
        warn!("No transaction summary produced, skipping balance derivation");
        return Ok(());
    }

    // 4. Balance derivation
    let report = pipeline::apply_balances(
        &deriver,
        &cfg.storage.roster_path,
        &cfg.storage.summary_path,
    )?;
    log_report(&report);

    Ok(())
}

fn log_report(report: &DerivationReport) {
    info!(
        updated = report.updated,
        unchanged = ?report.unchanged,
        total_balance = %report.total_balance,
        "Ledger sync complete"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fantasy_ledger=info"));

    let json_logging = std::env::var("FANTASY_LEDGER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
