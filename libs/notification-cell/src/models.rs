use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    Created,
    Confirmed,
    Cancelled,
    Rescheduled,
    Reminder,
}

impl NotificationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationEvent::Created => "created",
            NotificationEvent::Confirmed => "confirmed",
            NotificationEvent::Cancelled => "cancelled",
            NotificationEvent::Rescheduled => "rescheduled",
            NotificationEvent::Reminder => "reminder",
        }
    }
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Whatsapp,
}

/// Payload handed to the delivery gateway for one appointment event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentNotification {
    pub appointment_id: Uuid,
    pub company_id: Uuid,
    pub professional_id: Uuid,
    pub event: NotificationEvent,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: String,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub channels: Vec<NotificationChannel>,
}

impl AppointmentNotification {
    /// Channels follow the contact data on file: email when there is an address,
    /// WhatsApp when there is a phone.
    pub fn channels_for(client_email: Option<&str>, client_phone: Option<&str>) -> Vec<NotificationChannel> {
        let mut channels = Vec::with_capacity(2);
        if client_email.is_some_and(|e| !e.trim().is_empty()) {
            channels.push(NotificationChannel::Email);
        }
        if client_phone.is_some_and(|p| !p.trim().is_empty()) {
            channels.push(NotificationChannel::Whatsapp);
        }
        channels
    }

    pub fn ledger_key(&self) -> (Uuid, NotificationEvent) {
        (self.appointment_id, self.event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent { attempts: u32 },
    /// The same (appointment, event) pair was already delivered or is in flight.
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl From<&AppConfig> for DispatcherConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_retries: config.notification_max_retries,
            base_delay: Duration::from_millis(config.notification_base_delay_ms),
            max_delay: Duration::from_millis(config.notification_max_delay_ms.max(config.notification_base_delay_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channels_follow_contact_data() {
        assert_eq!(
            AppointmentNotification::channels_for(Some("ana@example.com"), Some("+5511999990000")),
            vec![NotificationChannel::Email, NotificationChannel::Whatsapp]
        );
        assert_eq!(
            AppointmentNotification::channels_for(Some("  "), Some("+5511999990000")),
            vec![NotificationChannel::Whatsapp]
        );
        assert!(AppointmentNotification::channels_for(None, None).is_empty());
    }

    #[test]
    fn test_outcome_wire_format() {
        assert_eq!(
            serde_json::to_value(DispatchOutcome::Sent { attempts: 2 }).unwrap(),
            json!({ "outcome": "sent", "attempts": 2 })
        );
        assert_eq!(serde_json::to_value(NotificationEvent::Rescheduled).unwrap(), json!("rescheduled"));
    }

    #[test]
    fn test_dispatcher_config_from_app_config() {
        let app = AppConfig {
            notification_max_retries: 5,
            notification_base_delay_ms: 200,
            notification_max_delay_ms: 100,
            ..AppConfig::default()
        };
        let config = DispatcherConfig::from(&app);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay, Duration::from_millis(200));
        // cap never sits below the base delay
        assert_eq!(config.max_delay, Duration::from_millis(200));
    }
}
