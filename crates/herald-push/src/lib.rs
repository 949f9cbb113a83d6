//! # herald-push
//!
//! Push delivery over the FCM HTTP v1 API: a multicast send primitive with
//! per-token outcome reconciliation and provider error classification.
//!
//! Delivery is best-effort by design.  Expired or invalid tokens are
//! reported, never retried; pruning them from the registration store is the
//! client lifecycle's job.

pub mod fcm;
pub mod report;

mod error;

use async_trait::async_trait;

pub use error::{PushError, Result};
pub use fcm::FcmClient;
pub use report::{
    redact_token, DispatchReport, FcmErrorCode, NotificationContent, SendFailure, TokenOutcome,
};

/// Multicast push delivery seam.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Deliver one notification to every token in `tokens`, returning an
    /// outcome per token in input order.  An empty token slice is a no-op
    /// that performs no network call.
    async fn send_multicast(
        &self,
        tokens: &[String],
        notification: &NotificationContent,
    ) -> Result<DispatchReport>;
}
