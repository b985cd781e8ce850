use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::error::NotificationError;
use crate::models::{AppointmentNotification, DispatchOutcome, DispatcherConfig, NotificationEvent};
use crate::services::sender::{LogSender, NotificationSender, WebhookSender};

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: AppointmentNotification) -> Result<DispatchOutcome, NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LedgerState {
    InFlight,
    Delivered,
}

/// Delivers each (appointment, event) pair at most once, retrying failed attempts with
/// capped exponential backoff.
pub struct RetryingDispatcher<S: NotificationSender> {
    sender: S,
    config: DispatcherConfig,
    ledger: DashMap<(Uuid, NotificationEvent), LedgerState>,
}

impl<S: NotificationSender> RetryingDispatcher<S> {
    pub fn new(sender: S, config: DispatcherConfig) -> Self {
        Self {
            sender,
            config,
            ledger: DashMap::new(),
        }
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn is_delivered(&self, appointment_id: Uuid, event: NotificationEvent) -> bool {
        self.ledger
            .get(&(appointment_id, event))
            .is_some_and(|state| *state == LedgerState::Delivered)
    }

    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`, capped at
    /// `max_delay`, plus up to a quarter of that in jitter. Never exceeds `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.config.base_delay.as_millis() as u64;
        let max_ms = self.config.max_delay.as_millis() as u64;

        let exponential = base_ms.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exponential.min(max_ms);
        let jitter = if capped >= 4 {
            rand::thread_rng().gen_range(0..=capped / 4)
        } else {
            0
        };

        Duration::from_millis(capped.saturating_add(jitter).min(max_ms))
    }

    fn claim(&self, key: (Uuid, NotificationEvent)) -> bool {
        match self.ledger.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(LedgerState::InFlight);
                true
            }
        }
    }
}

#[async_trait]
impl<S: NotificationSender> NotificationDispatcher for RetryingDispatcher<S> {
    #[instrument(skip(self, notification), fields(appointment_id = %notification.appointment_id, event = %notification.event))]
    async fn dispatch(&self, notification: AppointmentNotification) -> Result<DispatchOutcome, NotificationError> {
        let key = notification.ledger_key();
        if !self.claim(key) {
            debug!("Skipping duplicate {} notification", notification.event);
            return Ok(DispatchOutcome::Duplicate);
        }

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.sender.send(&notification).await {
                Ok(()) => {
                    self.ledger.insert(key, LedgerState::Delivered);
                    info!(
                        "Delivered {} notification via {} after {} attempt(s)",
                        notification.event,
                        self.sender.name(),
                        attempt
                    );
                    return Ok(DispatchOutcome::Sent { attempts: attempt });
                }
                Err(e) if attempt > self.config.max_retries => {
                    // released so a later dispatch may try again
                    self.ledger.remove(&key);
                    error!("Giving up on {} notification: {}", notification.event, e);
                    return Err(NotificationError::MaxRetriesExceeded {
                        appointment_id: notification.appointment_id,
                        event: notification.event,
                        max_retries: self.config.max_retries,
                    });
                }
                Err(e) => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        "Notification attempt {}/{} failed: {} - retrying in {}ms",
                        attempt,
                        self.config.max_retries + 1,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Webhook delivery when a gateway URL is configured, log-only otherwise.
pub fn build_dispatcher(config: &AppConfig) -> Arc<dyn NotificationDispatcher> {
    let dispatcher_config = DispatcherConfig::from(config);

    match &config.notification_webhook_url {
        Some(url) => {
            info!("Notifications will be delivered to {}", url);
            Arc::new(RetryingDispatcher::new(WebhookSender::new(url.clone()), dispatcher_config))
        }
        None => {
            warn!("NOTIFICATION_WEBHOOK_URL not set, notifications will only be logged");
            Arc::new(RetryingDispatcher::new(LogSender, dispatcher_config))
        }
    }
}

/// Fire-and-forget: the caller never waits on delivery and failures end up in the logs.
pub fn spawn_dispatch(
    dispatcher: Arc<dyn NotificationDispatcher>,
    notification: AppointmentNotification,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let appointment_id = notification.appointment_id;
        let event = notification.event;
        if let Err(e) = dispatcher.dispatch(notification).await {
            error!("Failed to notify {} for appointment {}: {}", event, appointment_id, e);
        }
    })
}
