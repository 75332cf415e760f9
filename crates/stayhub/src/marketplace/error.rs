use serde::Serialize;

use super::repository::RepositoryError;

/// Stable classification of marketplace failures, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Forbidden,
    InvalidState,
    Conflict,
    Unavailable,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

/// Error raised by the booking, review, and rating operations.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl MarketplaceError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketplaceError::InvalidInput(_) => ErrorKind::InvalidInput,
            MarketplaceError::NotFound { .. } => ErrorKind::NotFound,
            MarketplaceError::Forbidden(_) => ErrorKind::Forbidden,
            MarketplaceError::InvalidState(_) => ErrorKind::InvalidState,
            MarketplaceError::Conflict(_) => ErrorKind::Conflict,
            MarketplaceError::Repository(RepositoryError::Conflict) => ErrorKind::Conflict,
            MarketplaceError::Repository(RepositoryError::NotFound) => ErrorKind::NotFound,
            MarketplaceError::Repository(RepositoryError::Unavailable(_)) => ErrorKind::Unavailable,
        }
    }
}
