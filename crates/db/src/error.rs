//! Errors raised by ledger transitions.

use std::time::Duration;

use parkwise_core::error::CoreError;

/// PostgreSQL SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL SQLSTATE for `serialization_failure`.
pub const SERIALIZATION_FAILURE: &str = "40001";
/// PostgreSQL SQLSTATE for `deadlock_detected`.
pub const DEADLOCK_DETECTED: &str = "40P01";

/// Failure of an Enter, Exit, or lot update transaction.
///
/// Rejections are detected before any mutation and leave no partial effect;
/// database failures and timeouts roll the whole transaction back.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The transition was refused by a domain rule.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// The store failed while the transaction was in flight.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The transaction did not finish within its deadline.
    #[error("Transaction timed out after {0:?}")]
    TimedOut(Duration),
}

impl LedgerError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rejected(_) => false,
            Self::TimedOut(_) => true,
            Self::Database(err) => is_transient(err),
        }
    }
}

/// Whether a sqlx error is a transient store condition rather than a bug.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().as_deref(),
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
        ),
        _ => false,
    }
}

/// The violated constraint name, if `err` is a unique violation.
pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            db_err.constraint()
        }
        _ => None,
    }
}
