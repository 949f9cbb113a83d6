//! # herald-shared
//!
//! Google Cloud plumbing shared by the herald crates: service-account
//! credential parsing and the OAuth2 access-token provider used by both the
//! Firestore store and the FCM push client.

pub mod constants;
pub mod credentials;
pub mod gcp;

mod error;

pub use credentials::ServiceAccountKey;
pub use error::{AuthError, CredentialError};
pub use gcp::TokenProvider;
