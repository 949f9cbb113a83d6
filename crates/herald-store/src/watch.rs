//! Change feed over the messages collection group.
//!
//! The REST surface has no streaming listener, so the watcher polls
//! `runQuery` with a strictly-greater `createdAt` watermark and synthesizes
//! an `Added` change event per new document.  The watermark starts at the
//! caller-supplied lower bound (service start minus the startup grace, so
//! messages created in the race between process start and the first poll are
//! not lost) and advances to the newest timestamp seen.
//!
//! A failed poll is logged and retried on the next tick; the feed never
//! terminates on its own.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::firestore::FirestoreClient;
use crate::models::{ChangeEvent, ChangeKind};

/// Buffered change events before the poll loop blocks.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Polls Firestore for newly created messages.
pub struct MessageWatcher {
    client: FirestoreClient,
    poll_interval: std::time::Duration,
    watermark: DateTime<Utc>,
}

impl MessageWatcher {
    /// `lower_bound` is the admission threshold: only messages created
    /// strictly after it are ever delivered.
    pub fn new(
        client: FirestoreClient,
        lower_bound: DateTime<Utc>,
        poll_interval: std::time::Duration,
    ) -> Self {
        Self {
            client,
            poll_interval,
            watermark: lower_bound,
        }
    }

    /// Spawn the poll loop; change events arrive on the returned channel.
    /// The loop stops when the receiver is dropped.
    pub fn spawn(mut self) -> mpsc::Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let batch = match self.client.messages_created_after(self.watermark).await {
                    Ok(batch) => batch,
                    Err(e) => {
                        warn!(error = %e, "Message poll failed, retrying on next tick");
                        continue;
                    }
                };

                for message in batch {
                    self.watermark = advance_watermark(self.watermark, message.created_at);
                    let event = ChangeEvent {
                        kind: ChangeKind::Added,
                        message,
                    };
                    if tx.send(event).await.is_err() {
                        debug!("Event receiver dropped, stopping message watcher");
                        return;
                    }
                }
            }
        });

        rx
    }
}

fn advance_watermark(
    current: DateTime<Utc>,
    seen: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    match seen {
        Some(ts) if ts > current => ts,
        _ => current,
    }
}
