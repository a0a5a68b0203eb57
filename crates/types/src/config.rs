use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Economy configuration, passed into the engine at construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Default trading window start for new channels
    pub default_market_open: NaiveTime,
    /// Default trading window end for new channels
    pub default_market_close: NaiveTime,
    /// Seconds between pending-delete and the deferred hard delete
    pub pending_delete_grace_secs: u64,
    /// Fixed backoff between retries of a transiently failed job
    pub job_retry_backoff_secs: u64,
    /// Retries before a transiently failing job is dropped
    pub job_max_retries: u32,
    /// Seconds after market open at which a staged price is applied
    pub price_rollover_offset_secs: u64,
    /// Entry code length in characters
    pub entry_code_length: usize,
    /// Collision retries at one length before the code is widened
    pub entry_code_max_attempts: usize,
    /// Days a deactivated account survives before the nightly purge
    pub user_purge_after_days: i64,
    /// Local time of the daily price sweep
    pub daily_price_at: NaiveTime,
}

impl EconomyConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.default_market_open >= self.default_market_close {
            Err("market window must open before it closes")
        } else if self.entry_code_length == 0 {
            Err("entry_code_length must be greater than 0")
        } else if self.entry_code_max_attempts == 0 {
            Err("entry_code_max_attempts must be greater than 0")
        } else if self.user_purge_after_days <= 0 {
            Err("user_purge_after_days must be greater than 0")
        } else {
            Ok(())
        }
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            default_market_open: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            default_market_close: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            pending_delete_grace_secs: 3600,
            job_retry_backoff_secs: 60,
            job_max_retries: 3,
            price_rollover_offset_secs: 300,
            entry_code_length: 6,
            entry_code_max_attempts: 8,
            user_purge_after_days: 7,
            daily_price_at: NaiveTime::from_hms_opt(23, 55, 0).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_validation() {
        let config = EconomyConfig::default();
        assert_eq!(config.pending_delete_grace_secs, 3600);
        assert_eq!(config.price_rollover_offset_secs, 300);
        assert_eq!(config.entry_code_length, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = EconomyConfig::default();
        config.default_market_close = config.default_market_open;
        assert!(config.validate().is_err());

        let mut config = EconomyConfig::default();
        config.entry_code_length = 0;
        assert!(config.validate().is_err());
    }
}
