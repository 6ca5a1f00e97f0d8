//! # DomainError
//!
//! Centralized error handling for post storage and listing.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

use crate::models::PostId;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The primary error type for all post operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// The slug-or-id token does not name a thread
    #[error("can't find thread by slug or id {0}")]
    ThreadNotFound(String),

    /// A declared parent does not exist in the target thread
    #[error("can't find parent post {0}")]
    ParentNotFound(PostId),

    #[error("can't find post {0}")]
    PostNotFound(PostId),

    #[error("unsupported sort mode: {0}")]
    UnsupportedSort(String),

    /// Infrastructure failure (connection loss, constraint violation, decode error)
    #[error("storage failure: {0}")]
    Storage(#[source] BoxError),
}

/// How a failure should be surfaced by whatever transport sits in front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    BadRequest,
    Internal,
}

impl DomainError {
    pub fn storage(err: impl Into<BoxError>) -> Self {
        Self::Storage(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ThreadNotFound(_) | Self::PostNotFound(_) => ErrorKind::NotFound,
            Self::ParentNotFound(_) => ErrorKind::Conflict,
            Self::UnsupportedSort(_) => ErrorKind::BadRequest,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }
}

/// A specialized Result type for post operations.
pub type DomainResult<T> = std::result::Result<T, DomainError>;
