//! Error handling

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error taxonomy.
///
/// Scoring and policy evaluation are total and never appear here; an empty
/// history scores 0 / LOW / ALLOW rather than erroring.
#[derive(Debug, Error)]
pub enum EngineError {
    // Auth failures - distinct user-visible message per account status
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account pending approval")]
    AccountPending,

    #[error("Account has been revoked")]
    AccountRevoked,

    // Malformed telemetry is rejected before anything is recorded
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Event store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("User already exists: {0}")]
    DuplicateUser(String),
}

/// Audit ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The bounded sealing token search ran out of candidates.
    #[error("Sealing token search exhausted after {0} candidates")]
    SealSearchExhausted(u64),
}
