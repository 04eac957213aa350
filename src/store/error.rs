//! Error types for the store.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("could not obtain lock: {0}")]
    Locked(String),
}

/// Messages relational engines use to report row-lock contention.
const CONTENTION_PHRASES: &[&str] = &[
    "database is locked",
    "could not obtain lock",
    "lock wait timeout",
];

impl StoreError {
    /// True when the operation lost a race for a lock and may be retried.
    pub fn is_lock_contention(&self) -> bool {
        let message = match self {
            StoreError::Locked(_) => return true,
            StoreError::Open(m)
            | StoreError::Transaction(m)
            | StoreError::Table(m)
            | StoreError::Read(m)
            | StoreError::Write(m) => m.to_ascii_lowercase(),
            StoreError::Serialize(_) | StoreError::Deserialize(_) => return false,
        };
        CONTENTION_PHRASES.iter().any(|p| message.contains(p))
            || (message.contains("deadlock") && message.contains("try restarting transaction"))
    }
}

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| $crate::store::StoreError::$variant(e.to_string())
    };
}

pub(crate) use map_err;
