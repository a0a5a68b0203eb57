use thiserror::Error;

/// Entity store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(&'static str),

    #[error("Row not found")]
    RowNotFound,
}
