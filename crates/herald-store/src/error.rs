use thiserror::Error;

use herald_shared::AuthError;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level HTTP failure.
    #[error("Firestore request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Could not obtain an access token for the request.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Firestore answered with a non-success status.
    #[error("Firestore error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// A document could not be mapped onto a domain model.
    #[error("Malformed document {name}: {reason}")]
    Decode { name: String, reason: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
