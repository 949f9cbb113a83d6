//! Dispatch outcome accounting.
//!
//! A multicast dispatch produces one outcome per attempted token, aligned
//! with the input order.  Failures carry the provider's classification so
//! operators (and an eventual external token-hygiene job) can tell an
//! expired token from a provider outage.

use std::fmt;

use herald_shared::constants::TOKEN_REDACT_SUFFIX_LEN;

/// Title and body of a push notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

/// Provider-side failure classification for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FcmErrorCode {
    /// Token is no longer registered (app uninstalled, token rotated).
    Unregistered,
    /// Malformed token or payload.
    InvalidArgument,
    /// Token belongs to a different sender project.
    SenderIdMismatch,
    /// Sending quota exhausted.
    QuotaExceeded,
    /// Provider or transport temporarily unavailable.
    Unavailable,
    /// Provider-side internal error.
    Internal,
    /// Upstream APNs/web-push credentials rejected.
    ThirdPartyAuth,
    /// Anything the provider reports that is not classified above.
    Unknown,
}

impl FcmErrorCode {
    /// Map the `error.status` field of an FCM v1 error response.
    pub fn from_status(status: &str) -> Self {
        match status {
            "UNREGISTERED" | "NOT_FOUND" => Self::Unregistered,
            "INVALID_ARGUMENT" => Self::InvalidArgument,
            "SENDER_ID_MISMATCH" | "PERMISSION_DENIED" => Self::SenderIdMismatch,
            "QUOTA_EXCEEDED" | "RESOURCE_EXHAUSTED" => Self::QuotaExceeded,
            "UNAVAILABLE" => Self::Unavailable,
            "INTERNAL" => Self::Internal,
            "THIRD_PARTY_AUTH_ERROR" => Self::ThirdPartyAuth,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::InvalidArgument => "invalid-argument",
            Self::SenderIdMismatch => "sender-id-mismatch",
            Self::QuotaExceeded => "quota-exceeded",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
            Self::ThirdPartyAuth => "third-party-auth",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FcmErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified per-token failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFailure {
    pub code: FcmErrorCode,
    pub message: String,
}

/// Outcome of one token within a multicast dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenOutcome {
    /// The token the send was attempted for.
    pub token: String,
    /// `None` on success.
    pub error: Option<SendFailure>,
}

/// Aggregate result of one multicast dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub success_count: usize,
    pub failure_count: usize,
    /// One outcome per attempted token, in input order.
    pub outcomes: Vec<TokenOutcome>,
}

impl DispatchReport {
    pub fn push(&mut self, outcome: TokenOutcome) {
        if outcome.error.is_some() {
            self.failure_count += 1;
        } else {
            self.success_count += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Failed outcomes only.
    pub fn failures(&self) -> impl Iterator<Item = &TokenOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Keep only a short suffix of a device token for logs.  Full tokens are
/// delivery credentials and must never be logged.
pub fn redact_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let start = chars.len().saturating_sub(TOKEN_REDACT_SUFFIX_LEN);
    let suffix: String = chars[start..].iter().collect();
    format!("…{suffix}")
}
