//! Recipient resolution: who gets notified about a message.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use herald_store::ChatStore;

use crate::error::EventError;

/// Resolves a message's recipients from chat membership.
pub struct RecipientResolver {
    chats: Arc<dyn ChatStore>,
}

impl RecipientResolver {
    pub fn new(chats: Arc<dyn ChatStore>) -> Self {
        Self { chats }
    }

    /// Participants of `chat_id` minus the sender.  This is a set
    /// difference, not a list filter: duplicate entries in the stored
    /// participant list collapse to one recipient, keeping first-occurrence
    /// order so the result is deterministic.
    pub async fn resolve(
        &self,
        chat_id: &str,
        sender_id: &str,
    ) -> Result<Vec<String>, EventError> {
        let chat = self.chats.chat(chat_id).await?.ok_or_else(|| {
            EventError::ChatNotFound {
                chat_id: chat_id.to_string(),
            }
        })?;

        let mut seen = HashSet::new();
        let recipients: Vec<String> = chat
            .participants
            .into_iter()
            .filter(|p| p.as_str() != sender_id && seen.insert(p.clone()))
            .collect();

        debug!(
            chat_id,
            recipients = recipients.len(),
            "Resolved message recipients"
        );
        Ok(recipients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    use herald_store::{Chat, Result as StoreResult};

    struct FakeChats {
        chats: HashMap<String, Chat>,
    }

    impl FakeChats {
        fn with(participants: &[&str]) -> Self {
            let mut chats = HashMap::new();
            chats.insert(
                "chat-1".to_string(),
                Chat {
                    id: "chat-1".to_string(),
                    participants: participants.iter().map(|p| p.to_string()).collect(),
                },
            );
            Self { chats }
        }
    }

    #[async_trait]
    impl ChatStore for FakeChats {
        async fn chat(&self, chat_id: &str) -> StoreResult<Option<Chat>> {
            Ok(self.chats.get(chat_id).cloned())
        }
    }

    fn resolver(store: FakeChats) -> RecipientResolver {
        RecipientResolver::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_resolves_participants_minus_sender() {
        let r = resolver(FakeChats::with(&["alice", "bob", "carol"]));
        let recipients = r.resolve("chat-1", "alice").await.unwrap();
        assert_eq!(recipients, vec!["bob", "carol"]);
    }

    #[tokio::test]
    async fn test_duplicate_participants_collapse() {
        let r = resolver(FakeChats::with(&["alice", "bob", "bob", "carol", "bob"]));
        let recipients = r.resolve("chat-1", "alice").await.unwrap();
        assert_eq!(recipients, vec!["bob", "carol"]);
    }

    #[tokio::test]
    async fn test_sender_never_included_even_when_duplicated() {
        let r = resolver(FakeChats::with(&["alice", "alice", "bob"]));
        let recipients = r.resolve("chat-1", "alice").await.unwrap();
        assert_eq!(recipients, vec!["bob"]);
    }

    #[tokio::test]
    async fn test_empty_chat_resolves_to_empty() {
        let r = resolver(FakeChats::with(&[]));
        let recipients = r.resolve("chat-1", "alice").await.unwrap();
        assert!(recipients.is_empty());
    }

    #[tokio::test]
    async fn test_missing_chat_is_chat_not_found() {
        let r = resolver(FakeChats::with(&["alice"]));
        let err = r.resolve("chat-404", "alice").await.unwrap_err();
        assert!(matches!(
            err,
            EventError::ChatNotFound { ref chat_id } if chat_id == "chat-404"
        ));
    }
}
