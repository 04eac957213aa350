//! Service error taxonomy.
//!
//! Storage failures keep their original [`StoreError`] so callers and logs
//! can still tell a lock timeout from a corrupt row.

use thiserror::Error;

use crate::matching::PatternError;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("publish already in progress")]
    PublishInProgress,

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("nothing to publish")]
    NothingToPublish,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidSource(#[from] PatternError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// Short stable label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "bad_request",
            Error::Unauthorized => "unauthorized",
            Error::Forbidden => "forbidden",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::PublishInProgress => "in_progress",
            Error::QuotaExceeded(_) => "quota_exceeded",
            Error::NothingToPublish => "nothing_to_publish",
            Error::MissingField(_) => "missing_field",
            Error::InvalidSource(_) => "invalid_source",
            Error::Store(_) => "store",
            Error::Task(_) => "task",
        }
    }
}
