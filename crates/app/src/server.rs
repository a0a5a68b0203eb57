use std::sync::{Arc, Mutex};
use std::time::Duration;

use homeroom_engine::authz::RoleAuthorizer;
use homeroom_engine::clock::SystemClock;
use homeroom_engine::{Engine, EngineRunner};
use homeroom_jobs::{JobKind, RetryPolicy, Scheduler};
use homeroom_store::Store;
use tracing_subscriber::EnvFilter;

use crate::config::StartConfig;
use crate::init;

/// Initialize tracing subscriber
pub fn init_tracing(debug: bool) {
    let filter = if debug {
        // In debug mode, default to "debug" but allow RUST_LOG override
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("debug"))
            .unwrap()
    } else {
        // In normal mode, default to "info" but allow RUST_LOG override
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .unwrap()
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Start homeroom daemon
pub async fn start_daemon(config: &StartConfig) -> anyhow::Result<()> {
    let economy = config.economy_config()?;
    let purge_at = config.purge_time()?;

    tracing::info!("🏫 Starting homeroom daemon");
    tracing::info!(
        "  Market: {} - {}",
        economy.default_market_open,
        economy.default_market_close
    );
    tracing::info!("  Sweep:  daily at {}", economy.daily_price_at);
    tracing::info!("  Purge:  daily at {}", purge_at);

    let scheduler = Scheduler::new(RetryPolicy::new(
        Duration::from_secs(economy.job_retry_backoff_secs),
        economy.job_max_retries,
    ));

    let mut engine = Engine::new(
        Store::new(),
        economy,
        Arc::new(SystemClock),
        Arc::new(RoleAuthorizer),
        Arc::new(scheduler.clone()),
    );
    init::seed_verification_codes(engine.store_mut(), &config.seed_codes);

    // Jobs fired before this bind fail transiently and retry, so the
    // scheduler can be wired first and bound here.
    let engine = Arc::new(Mutex::new(engine));
    scheduler.bind_runner(Arc::new(EngineRunner::new(engine.clone())));

    scheduler.schedule_daily(JobKind::DailyPriceSweep, economy.daily_price_at);
    scheduler.schedule_daily(JobKind::PurgeUsers, purge_at);

    tracing::info!("✅ Homeroom daemon running");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    Ok(())
}
