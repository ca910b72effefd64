//! Relational store error types.

use std::time::Duration;

use sqlx::error::DatabaseError;
use sqlx::mysql::MySqlDatabaseError;
use thiserror::Error;

/// SQLSTATE reported for deadlocks and serialization failures.
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";

/// `ER_LOCK_DEADLOCK`: InnoDB rolled back the whole transaction.
const ER_LOCK_DEADLOCK: u16 = 1213;

/// `ER_LOCK_WAIT_TIMEOUT`: the statement was rolled back and the transaction
/// state is no longer known to hold every earlier write.
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;

/// Errors that can occur during relational store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to establish or keep the connection to the database.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A statement was rejected or failed to execute.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Begin, commit or rollback failed.
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// The server rolled back the open transaction (deadlock or lock wait timeout).
    #[error("Transaction aborted: {0}")]
    TransactionAborted(String),

    /// The operation did not complete within the configured timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The request was refused before reaching the database.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a transaction error.
    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::TransactionError(msg.into())
    }

    /// Create a transaction-aborted error.
    pub fn transaction_aborted(msg: impl Into<String>) -> Self {
        Self::TransactionAborted(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// True when the open transaction can no longer be committed as a whole:
    /// the connection is unusable or the server already rolled it back.
    pub fn aborts_chunk(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError(_) | Self::Timeout(_) | Self::TransactionAborted(_)
        )
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if aborts_transaction(db.as_ref()) {
                return Self::TransactionAborted(err.to_string());
            }
        }

        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::ConnectionError(err.to_string()),
            other => Self::QueryError(other.to_string()),
        }
    }
}

fn aborts_transaction(err: &dyn DatabaseError) -> bool {
    if err.code().as_deref() == Some(SQLSTATE_SERIALIZATION_FAILURE) {
        return true;
    }
    err.try_downcast_ref::<MySqlDatabaseError>()
        .is_some_and(|e| matches!(e.number(), ER_LOCK_DEADLOCK | ER_LOCK_WAIT_TIMEOUT))
}
