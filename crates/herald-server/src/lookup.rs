//! Device token lookup for resolved recipients.
//!
//! One point lookup per recipient, in resolver order so the log lines match
//! the resolution.  Message bodies are never inspectable downstream, so the
//! per-recipient outcome logged here is the main operational signal when a
//! notification does not arrive.

use std::sync::Arc;

use tracing::{debug, warn};

use herald_store::UserStore;

/// Maps recipients to their registered device tokens.
pub struct TokenLookup {
    users: Arc<dyn UserStore>,
}

impl TokenLookup {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Collect the registered device tokens of `recipients`, preserving
    /// order.  Recipients without a record or without a token are skipped
    /// silently.  A store failure for one recipient is logged and skipped
    /// so it cannot block delivery to the rest.
    pub async fn lookup(&self, recipients: &[String]) -> Vec<String> {
        let mut tokens = Vec::with_capacity(recipients.len());

        for recipient in recipients {
            match self.users.active_user(recipient).await {
                Ok(Some(user)) => match user.fcm_token {
                    Some(token) => {
                        debug!(user = %recipient, "Device token found");
                        tokens.push(token);
                    }
                    None => {
                        debug!(user = %recipient, "No registered device, skipping");
                    }
                },
                Ok(None) => {
                    debug!(user = %recipient, "No active-user record, skipping");
                }
                Err(e) => {
                    warn!(
                        user = %recipient,
                        error = %e,
                        "Token lookup failed, skipping recipient"
                    );
                }
            }
        }

        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    use herald_store::{ActiveUser, Result as StoreResult, StoreError};

    struct FakeUsers {
        users: HashMap<String, ActiveUser>,
        fail_for: Option<String>,
    }

    impl FakeUsers {
        fn new() -> Self {
            Self {
                users: HashMap::new(),
                fail_for: None,
            }
        }

        fn user(mut self, id: &str, token: Option<&str>) -> Self {
            self.users.insert(
                id.to_string(),
                ActiveUser {
                    user_id: id.to_string(),
                    display_name: None,
                    fcm_token: token.map(str::to_string),
                },
            );
            self
        }

        fn failing_for(mut self, id: &str) -> Self {
            self.fail_for = Some(id.to_string());
            self
        }
    }

    #[async_trait]
    impl UserStore for FakeUsers {
        async fn active_user(&self, user_id: &str) -> StoreResult<Option<ActiveUser>> {
            if self.fail_for.as_deref() == Some(user_id) {
                return Err(StoreError::Api {
                    status: 503,
                    body: "backend unavailable".to_string(),
                });
            }
            Ok(self.users.get(user_id).cloned())
        }
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_collects_tokens_in_recipient_order() {
        let lookup = TokenLookup::new(Arc::new(
            FakeUsers::new()
                .user("bob", Some("tok-bob"))
                .user("carol", Some("tok-carol")),
        ));

        let tokens = lookup.lookup(&ids(&["carol", "bob"])).await;
        assert_eq!(tokens, vec!["tok-carol", "tok-bob"]);
    }

    #[tokio::test]
    async fn test_recipients_without_token_are_omitted() {
        let lookup = TokenLookup::new(Arc::new(
            FakeUsers::new()
                .user("bob", Some("tok-bob"))
                .user("carol", None),
        ));

        let tokens = lookup.lookup(&ids(&["bob", "carol"])).await;
        assert_eq!(tokens, vec!["tok-bob"]);
    }

    #[tokio::test]
    async fn test_unknown_recipients_are_omitted() {
        let lookup = TokenLookup::new(Arc::new(FakeUsers::new().user("bob", Some("tok-bob"))));

        let tokens = lookup.lookup(&ids(&["ghost", "bob"])).await;
        assert_eq!(tokens, vec!["tok-bob"]);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_isolated() {
        let lookup = TokenLookup::new(Arc::new(
            FakeUsers::new()
                .user("bob", Some("tok-bob"))
                .user("dave", Some("tok-dave"))
                .failing_for("carol"),
        ));

        // carol's store error must not abort bob's or dave's lookup.
        let tokens = lookup.lookup(&ids(&["bob", "carol", "dave"])).await;
        assert_eq!(tokens, vec!["tok-bob", "tok-dave"]);
    }

    #[tokio::test]
    async fn test_empty_recipient_list() {
        let lookup = TokenLookup::new(Arc::new(FakeUsers::new()));
        assert!(lookup.lookup(&[]).await.is_empty());
    }
}
