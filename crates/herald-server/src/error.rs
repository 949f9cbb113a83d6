use thiserror::Error;

use herald_push::PushError;
use herald_store::StoreError;

/// Per-event failures.  None of these are fatal: the event is logged and
/// abandoned, and the change feed keeps running.
#[derive(Error, Debug)]
pub enum EventError {
    /// The message references a chat that does not exist.
    #[error("Chat {chat_id} not found")]
    ChatNotFound { chat_id: String },

    /// Store failure while resolving the event.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Dispatch-level push failure.
    #[error(transparent)]
    Push(#[from] PushError),
}
