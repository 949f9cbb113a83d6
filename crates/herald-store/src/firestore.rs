//! Firestore REST client.
//!
//! Thin typed wrapper over the `v1` REST surface: authenticated point
//! lookups (`GET …/documents/{collection}/{id}`) and the collection-group
//! query used by the change feed (`POST …/documents:runQuery`).  Firestore
//! returns every field as a typed JSON object (`{"stringValue": …}`), so the
//! decoding helpers here map that wire shape onto the domain models.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use herald_shared::TokenProvider;

use crate::error::{Result, StoreError};
use crate::models::{ActiveUser, Chat, Message};
use crate::{ChatStore, UserStore};

/// Collection holding chat metadata.
const CHATS_COLLECTION: &str = "chats";
/// Collection holding device registration records.
const ACTIVE_USERS_COLLECTION: &str = "active_users";
/// Sub-collection (queried as a collection group) holding chat messages.
const MESSAGES_COLLECTION: &str = "messages";

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Authenticated Firestore REST client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    auth: Arc<TokenProvider>,
    base_url: String,
}

impl FirestoreClient {
    pub fn new(auth: Arc<TokenProvider>, http: reqwest::Client) -> Self {
        Self {
            http,
            auth,
            base_url: FIRESTORE_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (Firestore emulator).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents",
            self.auth.project_id()
        )
    }

    /// Point lookup of a single document.  A 404 maps to `Ok(None)`.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let url = format!(
            "{}/{}/{}/{}",
            self.base_url,
            self.documents_root(),
            collection,
            id
        );
        let token = self.auth.access_token().await?;
        let resp = self.http.get(&url).bearer_auth(token).send().await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        Ok(Some(resp.json().await?))
    }

    /// Collection-group query for messages created strictly after `after`,
    /// oldest first.  Documents that fail to decode are logged and skipped
    /// so one malformed message cannot stall the change feed.
    pub async fn messages_created_after(&self, after: DateTime<Utc>) -> Result<Vec<Message>> {
        let url = format!("{}/{}:runQuery", self.base_url, self.documents_root());
        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&run_query_body(after))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let rows: Vec<QueryRow> = resp.json().await?;
        let mut messages = Vec::new();
        for row in rows {
            let Some(doc) = row.document else {
                continue;
            };
            match Message::try_from(doc) {
                Ok(message) => messages.push(message),
                Err(e) => warn!(error = %e, "Skipping undecodable message document"),
            }
        }
        Ok(messages)
    }
}

async fn api_error(resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    StoreError::Api { status, body }
}

/// Body of the `runQuery` call: all `messages` sub-collections, lower-bounded
/// by `createdAt`, ascending.
fn run_query_body(after: DateTime<Utc>) -> serde_json::Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": MESSAGES_COLLECTION, "allDescendants": true }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "createdAt" },
                    "op": "GREATER_THAN",
                    "value": {
                        "timestampValue": after.to_rfc3339_opts(SecondsFormat::Micros, true)
                    }
                }
            },
            "orderBy": [
                { "field": { "fieldPath": "createdAt" }, "direction": "ASCENDING" }
            ]
        }
    })
}

#[async_trait]
impl ChatStore for FirestoreClient {
    async fn chat(&self, chat_id: &str) -> Result<Option<Chat>> {
        match self.get_document(CHATS_COLLECTION, chat_id).await? {
            Some(doc) => Ok(Some(Chat::try_from(doc)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for FirestoreClient {
    async fn active_user(&self, user_id: &str) -> Result<Option<ActiveUser>> {
        match self.get_document(ACTIVE_USERS_COLLECTION, user_id).await? {
            Some(doc) => Ok(Some(ActiveUser::try_from(doc)?)),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One result row of a `runQuery` response.  Rows that only carry a
/// `readTime` have no document.
#[derive(Debug, Deserialize)]
struct QueryRow {
    document: Option<Document>,
}

/// Raw Firestore document as returned by the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    /// Full resource name, e.g.
    /// `projects/p/databases/(default)/documents/chats/{chat}/messages/{id}`.
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
}

/// A single Firestore typed value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    StringValue(String),
    TimestampValue(DateTime<Utc>),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    NullValue(Option<()>),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
}

impl FieldValue {
    fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::StringValue(s) => Some(s),
            _ => None,
        }
    }

    fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::TimestampValue(ts) => Some(*ts),
            _ => None,
        }
    }

    fn as_string_array(&self) -> Option<Vec<String>> {
        match self {
            FieldValue::ArrayValue(arr) => Some(
                arr.values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl Document {
    /// Last path segment: the document's own id.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Id of the document owning this document's parent collection, e.g.
    /// the chat id for a `chats/{chat}/messages/{id}` message.
    pub fn parent_document_id(&self) -> Option<&str> {
        let mut segments = self.name.rsplit('/');
        segments.next()?; // own id
        segments.next()?; // own collection
        segments.next()
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(FieldValue::as_str)
    }

    fn decode_error(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Decode {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Document → model conversions
// ---------------------------------------------------------------------------

impl TryFrom<Document> for Message {
    type Error = StoreError;

    fn try_from(doc: Document) -> Result<Self> {
        let chat_id = doc
            .parent_document_id()
            .ok_or_else(|| doc.decode_error("message path has no parent chat"))?
            .to_string();
        let sender_id = doc
            .str_field("uid")
            .ok_or_else(|| doc.decode_error("missing uid field"))?
            .to_string();

        Ok(Message {
            id: doc.id().to_string(),
            chat_id,
            sender_id,
            display_name: doc.str_field("displayName").map(str::to_string),
            // A missing or mistyped createdAt is decoded as None, not an
            // error; the staleness rules own that policy.
            created_at: doc.fields.get("createdAt").and_then(FieldValue::as_timestamp),
        })
    }
}

impl TryFrom<Document> for Chat {
    type Error = StoreError;

    fn try_from(doc: Document) -> Result<Self> {
        let participants = doc
            .fields
            .get("participants")
            .and_then(FieldValue::as_string_array)
            .unwrap_or_default();

        Ok(Chat {
            id: doc.id().to_string(),
            participants,
        })
    }
}

impl TryFrom<Document> for ActiveUser {
    type Error = StoreError;

    fn try_from(doc: Document) -> Result<Self> {
        // An empty token string means the client logged out without deleting
        // the record; normalize it to "no device".
        let fcm_token = doc
            .str_field("fcmToken")
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(ActiveUser {
            user_id: doc.id().to_string(),
            display_name: doc.str_field("name").map(str::to_string),
            fcm_token,
        })
    }
}
