//! OAuth2 access tokens for Google APIs.
//!
//! Firestore and FCM both authenticate with a bearer token minted from the
//! service-account key: the provider signs a short-lived RS256 assertion and
//! exchanges it at the key's token endpoint.  Tokens are cached behind a
//! mutex and refreshed shortly before they expire, so concurrent pipeline
//! tasks share one token instead of hammering the token endpoint.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::constants::{JWT_BEARER_GRANT_TYPE, OAUTH_SCOPES, TOKEN_EXPIRY_LEEWAY_SECS};
use crate::credentials::ServiceAccountKey;
use crate::error::AuthError;

/// Assertion lifetime requested from the token endpoint.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_EXPIRY_LEEWAY_SECS) < self.expires_at
    }
}

/// Mints and caches OAuth2 access tokens for the service account.
pub struct TokenProvider {
    key: ServiceAccountKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Self {
        Self {
            key,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Project id of the underlying service account.
    pub fn project_id(&self) -> &str {
        &self.key.project_id
    }

    /// Return a valid access token, minting a new one when the cached token
    /// is absent or about to expire.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(tok) = cached.as_ref() {
            if tok.is_fresh(Utc::now()) {
                return Ok(tok.token.clone());
            }
        }

        let minted = self.exchange().await?;
        debug!(
            expires_at = %minted.expires_at,
            "Minted new service-account access token"
        );
        let token = minted.token.clone();
        *cached = Some(minted);
        Ok(token)
    }

    async fn exchange(&self) -> Result<CachedToken, AuthError> {
        let now = Utc::now();
        let assertion = self.signed_assertion(now)?;

        let resp = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Exchange { status, body });
        }

        let token: TokenResponse = resp.json().await?;
        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: OAUTH_SCOPES.join(" "),
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }
}
