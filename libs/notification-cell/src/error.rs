use thiserror::Error;
use uuid::Uuid;

use crate::models::NotificationEvent;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Maximum retry attempts ({max_retries}) exceeded for {event} notification of appointment {appointment_id}")]
    MaxRetriesExceeded {
        appointment_id: Uuid,
        event: NotificationEvent,
        max_retries: u32,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
