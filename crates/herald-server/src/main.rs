//! # herald-server
//!
//! Push-notification relay for the chat database.
//!
//! This binary provides:
//! - **Change feed** over the Firestore `messages` collection group,
//!   lower-bounded so a restart never replays history
//! - **Fan-out pipeline** that resolves a message's recipients, looks up
//!   their device tokens, and dispatches one multicast push per message
//! - **Staleness guards** so an outage backlog is dropped instead of
//!   arriving as a notification storm
//! - **Liveness endpoint** (axum) for the hosting platform's keepalive
//!   probe
//!
//! Message content stays encrypted end to end; pushes carry only the
//! sender's name and a placeholder body.

mod api;
mod config;
mod dispatcher;
mod error;
mod filter;
mod lookup;
mod pipeline;
mod resolver;

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use herald_push::FcmClient;
use herald_shared::{ServiceAccountKey, TokenProvider};
use herald_store::{FirestoreClient, MessageWatcher};

use crate::config::ServerConfig;
use crate::dispatcher::NotificationDispatcher;
use crate::filter::StalenessFilter;
use crate::lookup::TokenLookup;
use crate::pipeline::Pipeline;
use crate::resolver::RecipientResolver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,herald_server=debug")),
        )
        .init();

    info!("Starting herald relay v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration and credentials
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // No credential, no relay: bail out before serving anything.
    let key = ServiceAccountKey::from_env()?;
    info!(
        project = %key.project_id,
        account = %key.client_email,
        "Loaded service-account credentials"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let http = reqwest::Client::new();
    let auth = Arc::new(TokenProvider::new(key, http.clone()));

    let firestore = FirestoreClient::new(auth.clone(), http.clone());
    let fcm = FcmClient::new(auth, http);

    let started_at = Utc::now();
    let staleness = StalenessFilter::new(
        started_at,
        config.startup_grace_secs,
        config.max_event_age_secs,
    );

    let pipeline = Pipeline::new(
        staleness.clone(),
        RecipientResolver::new(Arc::new(firestore.clone())),
        TokenLookup::new(Arc::new(firestore.clone())),
        NotificationDispatcher::new(Arc::new(fcm)),
        config.max_in_flight,
    );

    // -----------------------------------------------------------------------
    // 4. Start the change feed
    // -----------------------------------------------------------------------
    let watcher = MessageWatcher::new(
        firestore,
        staleness.lower_bound(),
        std::time::Duration::from_secs(config.poll_interval_secs),
    );
    let events = watcher.spawn();
    info!(started_at = %started_at, "Listening for new messages");

    // -----------------------------------------------------------------------
    // 5. Run the pipeline and the liveness endpoint until shutdown
    // -----------------------------------------------------------------------
    tokio::select! {
        _ = pipeline.run(events) => {
            anyhow::bail!("Change feed terminated unexpectedly");
        }
        result = api::serve(config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Liveness endpoint failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
