use thiserror::Error;

use herald_shared::AuthError;

/// Call-level dispatch failures.  Per-token failures are recorded in the
/// [`DispatchReport`](crate::DispatchReport), not raised here.
#[derive(Error, Debug)]
pub enum PushError {
    /// Could not obtain an access token for the dispatch.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PushError>;
