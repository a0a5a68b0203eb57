use anyhow::Context;
use chrono::NaiveTime;
use clap::{Args, Parser, Subcommand};
use homeroom_types::EconomyConfig;

#[derive(Parser)]
#[command(name = "homeroom")]
#[command(version, about = "Homeroom - Classroom Economy Simulation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the homeroom daemon
    Start(Box<StartConfig>),
    /// Display version information
    Version,
}

#[derive(Args)]
pub struct StartConfig {
    /// Default market open for new channels (HH:MM, UTC)
    #[arg(long = "market.open", default_value = "09:00")]
    pub market_open: String,

    /// Default market close for new channels (HH:MM, UTC)
    #[arg(long = "market.close", default_value = "15:00")]
    pub market_close: String,

    /// Grace seconds between a channel's pending-delete and its hard delete
    #[arg(long = "delete.grace-secs", default_value = "3600")]
    pub pending_delete_grace_secs: u64,

    /// Backoff seconds between retries of a failed job
    #[arg(long = "job.retry-backoff-secs", default_value = "60")]
    pub job_retry_backoff_secs: u64,

    /// Retries before a transiently failing job is dropped
    #[arg(long = "job.max-retries", default_value = "3")]
    pub job_max_retries: u32,

    /// Seconds after market open at which staged prices apply
    #[arg(long = "price.rollover-offset-secs", default_value = "300")]
    pub price_rollover_offset_secs: u64,

    /// Channel entry code length
    #[arg(long = "code.length", default_value = "6")]
    pub entry_code_length: usize,

    /// Days a deactivated account survives before the nightly purge
    #[arg(long = "purge.after-days", default_value = "7")]
    pub user_purge_after_days: i64,

    /// Daily price sweep time (HH:MM, UTC)
    #[arg(long = "sweep.at", default_value = "23:55")]
    pub daily_price_at: String,

    /// Nightly account purge time (HH:MM, UTC)
    #[arg(long = "purge.at", default_value = "03:00")]
    pub purge_at: String,

    /// Teacher verification codes to seed at startup (comma-separated)
    #[arg(long = "seed.codes", value_delimiter = ',')]
    pub seed_codes: Vec<String>,

    /// Enable debug logging
    #[arg(long = "log.debug")]
    pub debug: bool,
}

fn parse_time(value: &str, flag: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .with_context(|| format!("{flag} must be HH:MM, got {value:?}"))
}

impl StartConfig {
    pub fn economy_config(&self) -> anyhow::Result<EconomyConfig> {
        let config = EconomyConfig {
            default_market_open: parse_time(&self.market_open, "market.open")?,
            default_market_close: parse_time(&self.market_close, "market.close")?,
            pending_delete_grace_secs: self.pending_delete_grace_secs,
            job_retry_backoff_secs: self.job_retry_backoff_secs,
            job_max_retries: self.job_max_retries,
            price_rollover_offset_secs: self.price_rollover_offset_secs,
            entry_code_length: self.entry_code_length,
            user_purge_after_days: self.user_purge_after_days,
            daily_price_at: parse_time(&self.daily_price_at, "sweep.at")?,
            ..EconomyConfig::default()
        };
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    pub fn purge_time(&self) -> anyhow::Result<NaiveTime> {
        parse_time(&self.purge_at, "purge.at")
    }
}
