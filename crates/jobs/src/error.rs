use thiserror::Error;

/// Job execution failure, classified for the retry loop
///
/// Terminal failures mean the thing the job was supposed to act on no
/// longer exists; retrying cannot help. Everything else is transient and
/// retried after a fixed backoff.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Terminal job failure: {0}")]
    Terminal(String),

    #[error("Transient job failure: {0}")]
    Transient(String),
}

impl JobError {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}
