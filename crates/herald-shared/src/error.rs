use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("Malformed service-account JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Service-account key has an empty {0}")]
    EmptyField(&'static str),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to sign service-account assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Token endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token exchange rejected: HTTP {status}: {body}")]
    Exchange { status: u16, body: String },
}
