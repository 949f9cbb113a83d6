//! # herald-store
//!
//! Read-only access to the chat document database, backed by the Firestore
//! REST API.  The crate exposes typed point lookups for chats and device
//! registrations, plus a polling watcher that turns newly created messages
//! into a stream of change events.
//!
//! The relay never writes: chats, messages, and registrations are all owned
//! by the client applications.

pub mod firestore;
pub mod models;
pub mod watch;

mod error;

use async_trait::async_trait;

pub use error::{Result, StoreError};
pub use firestore::FirestoreClient;
pub use models::*;
pub use watch::MessageWatcher;

/// Point lookup of chat metadata.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Fetch a chat by id; `None` when the chat does not exist.
    async fn chat(&self, chat_id: &str) -> Result<Option<Chat>>;
}

/// Point lookup of device registrations.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user's registration record by id; `None` when absent.
    async fn active_user(&self, user_id: &str) -> Result<Option<ActiveUser>>;
}
