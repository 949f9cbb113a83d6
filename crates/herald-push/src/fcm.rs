//! FCM HTTP v1 client.
//!
//! One multicast call fans the token set out over the provider's current
//! HTTP v1 send endpoint: tokens are chunked at the provider's multicast
//! limit and each chunk's sends go out concurrently over the shared
//! connection pool, matching the reconciliation contract of the provider
//! SDK's multicast interface.  The legacy single-shot device-group/batch
//! endpoints are discontinued and deliberately not used.
//!
//! Per-token failures become report outcomes; only an auth failure aborts
//! the call as a whole.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use tracing::debug;

use herald_shared::constants::FCM_MULTICAST_LIMIT;
use herald_shared::TokenProvider;

use crate::error::Result;
use crate::report::{
    DispatchReport, FcmErrorCode, NotificationContent, SendFailure, TokenOutcome,
};
use crate::PushSender;

const FCM_BASE_URL: &str = "https://fcm.googleapis.com/v1";

/// Authenticated FCM v1 client.
#[derive(Clone)]
pub struct FcmClient {
    http: reqwest::Client,
    auth: Arc<TokenProvider>,
    base_url: String,
}

impl FcmClient {
    pub fn new(auth: Arc<TokenProvider>, http: reqwest::Client) -> Self {
        Self {
            http,
            auth,
            base_url: FCM_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn send_url(&self) -> String {
        format!(
            "{}/projects/{}/messages:send",
            self.base_url,
            self.auth.project_id()
        )
    }

    async fn send_one(
        &self,
        url: &str,
        bearer: &str,
        token: &str,
        notification: &NotificationContent,
    ) -> TokenOutcome {
        let resp = self
            .http
            .post(url)
            .bearer_auth(bearer)
            .json(&message_body(token, notification))
            .send()
            .await;

        let error = match resp {
            Ok(resp) if resp.status().is_success() => None,
            Ok(resp) => Some(classify_response(resp).await),
            // Transport failure for this token only; the provider may be
            // reachable again for the next event.
            Err(e) => Some(SendFailure {
                code: FcmErrorCode::Unavailable,
                message: e.to_string(),
            }),
        };

        TokenOutcome {
            token: token.to_string(),
            error,
        }
    }
}

fn message_body(token: &str, notification: &NotificationContent) -> serde_json::Value {
    json!({
        "message": {
            "token": token,
            "notification": {
                "title": notification.title,
                "body": notification.body,
            }
        }
    })
}

async fn classify_response(resp: reqwest::Response) -> SendFailure {
    let http_status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    match parse_error_body(&body) {
        Some((code, message)) => SendFailure { code, message },
        None => SendFailure {
            code: FcmErrorCode::Unknown,
            message: format!("HTTP {http_status}"),
        },
    }
}

fn parse_error_body(body: &str) -> Option<(FcmErrorCode, String)> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let status = error.get("status").and_then(|s| s.as_str())?;
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or(status)
        .to_string();
    Some((FcmErrorCode::from_status(status), message))
}

#[async_trait]
impl PushSender for FcmClient {
    async fn send_multicast(
        &self,
        tokens: &[String],
        notification: &NotificationContent,
    ) -> Result<DispatchReport> {
        if tokens.is_empty() {
            return Ok(DispatchReport::default());
        }

        let bearer = self.auth.access_token().await?;
        let url = self.send_url();
        debug!(devices = tokens.len(), "Sending multicast push");

        let mut report = DispatchReport::default();
        for chunk in tokens.chunks(FCM_MULTICAST_LIMIT) {
            let sends = chunk
                .iter()
                .map(|token| self.send_one(&url, &bearer, token, notification));
            for outcome in join_all(sends).await {
                report.push(outcome);
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_shared::ServiceAccountKey;

    fn offline_client() -> FcmClient {
        let key = ServiceAccountKey {
            project_id: "herald-test".to_string(),
            private_key: "not-a-real-key".to_string(),
            client_email: "relay@herald-test.iam.gserviceaccount.com".to_string(),
            token_uri: "http://127.0.0.1:1/token".to_string(),
        };
        let auth = Arc::new(TokenProvider::new(key, reqwest::Client::new()));
        FcmClient::new(auth, reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_empty_multicast_is_a_no_op() {
        // Short-circuits before auth or any network traffic; the bogus
        // credentials above would fail anything else.
        let client = offline_client();
        let content = NotificationContent {
            title: "Alice".to_string(),
            body: "New Message 🔒".to_string(),
        };

        let report = client.send_multicast(&[], &content).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.success_count, 0);
        assert_eq!(report.failure_count, 0);
    }

    #[test]
    fn test_message_body_shape() {
        let content = NotificationContent {
            title: "Alice".to_string(),
            body: "New Message 🔒".to_string(),
        };
        let body = message_body("tok-1", &content);

        assert_eq!(body["message"]["token"], "tok-1");
        assert_eq!(body["message"]["notification"]["title"], "Alice");
        assert_eq!(body["message"]["notification"]["body"], "New Message 🔒");
        // Content-free by construction: nothing but title and body goes out.
        assert!(body["message"].get("data").is_none());
    }

    #[test]
    fn test_parse_error_body_unregistered() {
        let body = r#"{
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND",
                "details": [{
                    "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                    "errorCode": "UNREGISTERED"
                }]
            }
        }"#;

        let (code, message) = parse_error_body(body).unwrap();
        assert_eq!(code, FcmErrorCode::Unregistered);
        assert_eq!(message, "Requested entity was not found.");
    }

    #[test]
    fn test_parse_error_body_rejects_non_json() {
        assert!(parse_error_body("<html>bad gateway</html>").is_none());
        assert!(parse_error_body("{}").is_none());
    }
}
