#![forbid(unsafe_code)]

use vt_core::Denial;
use vt_storage::StoreError;

/// Outcome of a boundary operation that did not succeed.
///
/// Everything except [`ServiceError::MigrationFailure`] is per-request: it never poisons the
/// service for later calls or other principals.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("free tier allows at most {limit} tasks")]
    QuotaExceeded { limit: u64 },
    #[error("administrators cannot block themselves")]
    SelfBlockDenied,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account is blocked")]
    Blocked,
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("schema migration failed: {0}")]
    MigrationFailure(#[source] StoreError),
    #[error("storage failure: {0}")]
    Store(#[source] StoreError),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            Self::SelfBlockDenied => "SELF_BLOCK_DENIED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Blocked => "BLOCKED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::MigrationFailure(_) => "MIGRATION_FAILURE",
            Self::Store(_) => "STORE",
        }
    }

    /// Only migration failures are fatal; the process must not serve after one.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MigrationFailure(_))
    }
}

impl From<Denial> for ServiceError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::QuotaExceeded { limit } => Self::QuotaExceeded { limit },
            Denial::NotFound => Self::NotFound,
            Denial::Forbidden => Self::Forbidden,
            Denial::SelfBlockDenied => Self::SelfBlockDenied,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownId => Self::NotFound,
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::InvalidInput(message) => Self::InvalidInput(message),
            err if err.is_migration_failure() => Self::MigrationFailure(err),
            err => Self::Store(err),
        }
    }
}
