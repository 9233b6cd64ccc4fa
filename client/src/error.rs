use thiserror::Error;

use shared::types::{FormError, TokenError};

use crate::storage::StorageError;

/// Every failure the client layer can produce.
///
/// None of these are fatal: stores turn them into notifications, the guard
/// turns them into redirects.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connect, I/O or timeout failure before a response arrived.
    #[error("Network error: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status. `message` is what the
    /// user sees.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed token: {0}")]
    MalformedToken(#[from] TokenError),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Token storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    InvalidForm(#[from] FormError),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn is_rejected(&self) -> bool {
        matches!(self, ClientError::Rejected { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
