use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::NotificationError;
use crate::models::AppointmentNotification;

/// One delivery attempt. Retrying is the dispatcher's job.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, notification: &AppointmentNotification) -> Result<(), NotificationError>;
}

/// Posts the notification as JSON to the email/WhatsApp gateway.
pub struct WebhookSender {
    client: Client,
    url: String,
}

impl WebhookSender {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationSender for WebhookSender {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, notification: &AppointmentNotification) -> Result<(), NotificationError> {
        let body = serde_json::to_value(notification)?;
        debug!("POST {} for {} of appointment {}", self.url, notification.event, notification.appointment_id);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::DeliveryFailed(format!("gateway unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NotificationError::DeliveryFailed(format!(
                "gateway responded {}: {}",
                status, text
            )));
        }

        Ok(())
    }
}

/// Used when no gateway is configured: the notification only reaches the logs.
#[derive(Debug, Default)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, notification: &AppointmentNotification) -> Result<(), NotificationError> {
        info!(
            "Notification {} for appointment {} ({} via {:?})",
            notification.event, notification.appointment_id, notification.client_name, notification.channels
        );
        Ok(())
    }
}
