use std::time::Duration;

/// Retry policy for transiently failing jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed backoff between attempts
    pub backoff: Duration,
    /// Retries before the job is dropped with a warning
    pub max_retries: u32,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(backoff: Duration, max_retries: u32) -> Self {
        Self {
            backoff,
            max_retries,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff, Duration::from_secs(60));
        assert_eq!(policy.max_retries, 3);
    }
}
