//! Relay configuration loaded from environment variables.
//!
//! Every tuning knob has a sensible default so the relay can start with
//! nothing but the service-account credential set.  The credential itself is
//! loaded separately (see `herald_shared::credentials`) because its absence
//! is fatal, while everything here warns and falls back.

use std::net::SocketAddr;

use herald_shared::constants::{
    DEFAULT_HTTP_PORT, DEFAULT_MAX_EVENT_AGE_SECS, DEFAULT_MAX_IN_FLIGHT,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_STARTUP_GRACE_SECS,
};

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address of the liveness HTTP endpoint.
    /// Env: `PORT` (port number only; always binds 0.0.0.0)
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Messages created up to this long before startup are still delivered.
    /// Env: `STARTUP_GRACE_SECS`
    /// Default: `60`
    pub startup_grace_secs: u64,

    /// Delivered messages older than this are dropped, not dispatched.
    /// Env: `MAX_EVENT_AGE_SECS`
    /// Default: `90`
    pub max_event_age_secs: u64,

    /// Interval between change-feed polls.
    /// Env: `POLL_INTERVAL_SECS`
    /// Default: `2`
    pub poll_interval_secs: u64,

    /// Cap on concurrently processed message events.
    /// Env: `MAX_IN_FLIGHT`
    /// Default: `64`
    pub max_in_flight: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            startup_grace_secs: DEFAULT_STARTUP_GRACE_SECS,
            max_event_age_secs: DEFAULT_MAX_EVENT_AGE_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("PORT") {
            match parse_port(&port) {
                Some(port) => config.http_addr = ([0, 0, 0, 0], port).into(),
                None => {
                    tracing::warn!(value = %port, "Invalid PORT, using default");
                }
            }
        }

        if let Some(secs) = env_u64("STARTUP_GRACE_SECS") {
            config.startup_grace_secs = secs;
        }

        if let Some(secs) = env_u64("MAX_EVENT_AGE_SECS") {
            config.max_event_age_secs = secs;
        }

        if let Some(secs) = env_u64("POLL_INTERVAL_SECS") {
            // A zero interval would spin against the database.
            config.poll_interval_secs = secs.max(1);
        }

        if let Some(n) = env_u64("MAX_IN_FLIGHT") {
            config.max_in_flight = (n as usize).max(1);
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn parse_port(value: &str) -> Option<u16> {
    value.trim().parse::<u16>().ok().filter(|p| *p != 0)
}

fn env_u64(name: &str) -> Option<u64> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(var = name, value = %value, "Invalid value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.startup_grace_secs, 60);
        assert_eq!(config.max_event_age_secs, 90);
        assert_eq!(config.max_in_flight, 64);
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("3000"), Some(3000));
        assert_eq!(parse_port(" 8080 "), Some(8080));
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("not-a-port"), None);
        assert_eq!(parse_port("99999"), None);
    }
}
