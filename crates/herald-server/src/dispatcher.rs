//! Notification dispatch.
//!
//! Builds the content-free notification and hands the whole token set to
//! the push sender as one multicast call, then logs the reconciled report.
//! Failed tokens are logged redacted and left to the external registration
//! lifecycle; nothing is retried here.

use std::sync::Arc;

use tracing::{debug, info, warn};

use herald_push::{redact_token, DispatchReport, NotificationContent, PushSender};
use herald_shared::constants::{NOTIFICATION_FALLBACK_TITLE, NOTIFICATION_PLACEHOLDER_BODY};

use crate::error::EventError;

/// Sends one notification per message event to all recipient devices.
pub struct NotificationDispatcher {
    sender: Arc<dyn PushSender>,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn PushSender>) -> Self {
        Self { sender }
    }

    /// Dispatch to every token.  No tokens means no dispatch and no error.
    /// The push body never carries message content; the title is the
    /// sender's display name when known.
    pub async fn dispatch(
        &self,
        chat_id: &str,
        sender_name: Option<&str>,
        tokens: &[String],
    ) -> Result<DispatchReport, EventError> {
        if tokens.is_empty() {
            debug!(chat_id, "No reachable devices, skipping dispatch");
            return Ok(DispatchReport::default());
        }

        let content = NotificationContent {
            title: sender_name.unwrap_or(NOTIFICATION_FALLBACK_TITLE).to_string(),
            body: NOTIFICATION_PLACEHOLDER_BODY.to_string(),
        };

        let report = self.sender.send_multicast(tokens, &content).await?;

        info!(
            chat_id,
            devices = tokens.len(),
            success = report.success_count,
            failed = report.failure_count,
            "Dispatched notifications"
        );
        for outcome in report.failures() {
            if let Some(ref failure) = outcome.error {
                warn!(
                    chat_id,
                    token = %redact_token(&outcome.token),
                    code = %failure.code,
                    message = %failure.message,
                    "Token delivery failed"
                );
            }
        }

        Ok(report)
    }
}
