//! The event pipeline: receive → admit → resolve → look up → dispatch.
//!
//! Each admitted event runs in its own task so one slow chat fetch cannot
//! hold back the feed; a semaphore caps the number of in-flight tasks to
//! give backpressure against provider rate limits.  Events are independent
//! and idempotent, so no ordering is guaranteed across them.  A failure
//! abandons that one event and never stops the loop.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use herald_push::DispatchReport;
use herald_store::{ChangeEvent, Message};

use crate::dispatcher::NotificationDispatcher;
use crate::error::EventError;
use crate::filter::{Admission, StalenessFilter};
use crate::lookup::TokenLookup;
use crate::resolver::RecipientResolver;

/// Drives change events through the fan-out stages.
pub struct Pipeline {
    filter: StalenessFilter,
    resolver: Arc<RecipientResolver>,
    lookup: Arc<TokenLookup>,
    dispatcher: Arc<NotificationDispatcher>,
    in_flight: Arc<Semaphore>,
    max_in_flight: usize,
}

impl Pipeline {
    pub fn new(
        filter: StalenessFilter,
        resolver: RecipientResolver,
        lookup: TokenLookup,
        dispatcher: NotificationDispatcher,
        max_in_flight: usize,
    ) -> Self {
        Self {
            filter,
            resolver: Arc::new(resolver),
            lookup: Arc::new(lookup),
            dispatcher: Arc::new(dispatcher),
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    /// Consume the change feed until it closes, then wait for in-flight
    /// event tasks to finish.
    pub async fn run(&self, mut events: mpsc::Receiver<ChangeEvent>) {
        while let Some(event) = events.recv().await {
            match self.filter.admit(&event) {
                Admission::Admitted => {}
                reason => {
                    debug!(
                        message_id = %event.message.id,
                        chat_id = %event.message.chat_id,
                        ?reason,
                        "Dropped change event"
                    );
                    continue;
                }
            }

            info!(
                message_id = %event.message.id,
                chat_id = %event.message.chat_id,
                sender = %event.message.sender_id,
                "New message event admitted"
            );

            let permit = match self.in_flight.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let resolver = self.resolver.clone();
            let lookup = self.lookup.clone();
            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                let message = event.message;
                if let Err(e) = process_message(&resolver, &lookup, &dispatcher, &message).await
                {
                    match e {
                        EventError::ChatNotFound { ref chat_id } => warn!(
                            message_id = %message.id,
                            chat_id = %chat_id,
                            "Chat not found, abandoning event"
                        ),
                        other => warn!(
                            message_id = %message.id,
                            chat_id = %message.chat_id,
                            error = %other,
                            "Event processing failed"
                        ),
                    }
                }
                drop(permit);
            });
        }

        // Feed closed; let the stragglers finish before reporting.
        let _ = self.in_flight.acquire_many(self.max_in_flight as u32).await;
        info!("Change feed closed, pipeline stopped");
    }
}

async fn process_message(
    resolver: &RecipientResolver,
    lookup: &TokenLookup,
    dispatcher: &NotificationDispatcher,
    message: &Message,
) -> Result<DispatchReport, EventError> {
    let recipients = resolver
        .resolve(&message.chat_id, &message.sender_id)
        .await?;
    let tokens = lookup.lookup(&recipients).await;
    dispatcher
        .dispatch(&message.chat_id, message.display_name.as_deref(), &tokens)
        .await
}
