/// Environment variable holding the service-account JSON blob
pub const SERVICE_ACCOUNT_ENV: &str = "FIREBASE_SERVICE_ACCOUNT";

/// OAuth2 scopes required for Firestore reads and FCM sends
pub const OAUTH_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/datastore",
    "https://www.googleapis.com/auth/firebase.messaging",
];

/// OAuth2 JWT-bearer grant type
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Seconds before expiry at which a cached access token is refreshed
pub const TOKEN_EXPIRY_LEEWAY_SECS: i64 = 60;

/// Default HTTP port for the liveness endpoint
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Messages created up to this long before startup are still delivered
pub const DEFAULT_STARTUP_GRACE_SECS: u64 = 60;

/// Delivered messages older than this are dropped instead of dispatched
pub const DEFAULT_MAX_EVENT_AGE_SECS: u64 = 90;

/// Default interval between Firestore change polls
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Default cap on concurrently processed message events
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Maximum device tokens per FCM multicast call
pub const FCM_MULTICAST_LIMIT: usize = 500;

/// Push title used when the sender has no display name
pub const NOTIFICATION_FALLBACK_TITLE: &str = "New message";

/// Push body is always this placeholder; message content never leaves the database
pub const NOTIFICATION_PLACEHOLDER_BODY: &str = "New Message 🔒";

/// Trailing characters of a device token kept when logging
pub const TOKEN_REDACT_SUFFIX_LEN: usize = 6;
