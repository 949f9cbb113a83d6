//! Domain models read from the chat document database.
//!
//! Everything here is externally owned and read-only from the relay's point
//! of view.  Message content is encrypted end-to-end by the clients; the
//! relay never decodes it, so no body field exists on [`Message`].

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message, as observed by the change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Document id of the message.
    pub id: String,
    /// Id of the chat the message belongs to (the message document's
    /// grand-parent in the `chats/{chat}/messages/{id}` path).
    pub chat_id: String,
    /// User id of the sender.
    pub sender_id: String,
    /// Sender's display name at send time, used as the push title.
    pub display_name: Option<String>,
    /// Creation timestamp written by the client.  Clients can omit or
    /// mangle it, so it stays optional here and the staleness rules decide
    /// what to do with it.
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Chat metadata: who is in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    /// Document id of the chat.
    pub id: String,
    /// Participant user ids in stored order.  Storage may contain
    /// duplicates; recipient resolution collapses them.
    pub participants: Vec<String>,
}

// ---------------------------------------------------------------------------
// ActiveUser
// ---------------------------------------------------------------------------

/// A user's device registration record, maintained by client login/logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUser {
    /// User id (the document id in `active_users`).
    pub user_id: String,
    /// Display name, if the client registered one.
    pub display_name: Option<String>,
    /// Current FCM device token.  `None` means no reachable device, which
    /// is a normal state, never an error.
    pub fcm_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Change events
// ---------------------------------------------------------------------------

/// What happened to a document in the source store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// A change observed on the messages collection group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub message: Message,
}
