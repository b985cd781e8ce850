use std::time::Duration;

use assert_matches::assert_matches;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::{
    build_dispatcher, AppointmentNotification, DispatchOutcome, DispatcherConfig, NotificationChannel,
    NotificationDispatcher, NotificationError, NotificationEvent, NotificationSender, RetryingDispatcher,
    WebhookSender,
};
use shared_utils::test_utils::{utc, TestConfig};

fn notification(event: NotificationEvent) -> AppointmentNotification {
    AppointmentNotification {
        appointment_id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        professional_id: Uuid::new_v4(),
        event,
        starts_at: utc(2026, 3, 9, 13, 0),
        ends_at: utc(2026, 3, 9, 14, 0),
        status: "pendente".to_string(),
        client_name: "Bruna Lima".to_string(),
        client_email: None,
        client_phone: Some("+5511988887777".to_string()),
        channels: AppointmentNotification::channels_for(None, Some("+5511988887777")),
    }
}

fn fast_config(max_retries: u32) -> DispatcherConfig {
    DispatcherConfig {
        max_retries,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

#[tokio::test]
async fn test_webhook_posts_notification_json() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .and(body_partial_json(serde_json::json!({
            "event": "created",
            "status": "pendente",
            "channels": ["whatsapp"]
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sender = WebhookSender::new(format!("{}/notify", mock_server.uri()));
    let n = notification(NotificationEvent::Created);
    assert_eq!(n.channels, vec![NotificationChannel::Whatsapp]);

    sender.send(&n).await.unwrap();
}

#[tokio::test]
async fn test_webhook_error_status_is_delivery_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let sender = WebhookSender::new(mock_server.uri());
    let result = sender.send(&notification(NotificationEvent::Reminder)).await;
    assert_matches!(result, Err(NotificationError::DeliveryFailed(msg)) if msg.contains("503"));
}

#[tokio::test]
async fn test_dispatcher_retries_gateway_failures() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let dispatcher = RetryingDispatcher::new(WebhookSender::new(mock_server.uri()), fast_config(3));
    let outcome = dispatcher.dispatch(notification(NotificationEvent::Confirmed)).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Sent { attempts: 3 });
}

#[tokio::test]
async fn test_built_dispatcher_uses_configured_webhook() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = TestConfig::default().to_app_config();
    config.notification_webhook_url = Some(format!("{}/hooks/appointments", mock_server.uri()));

    let dispatcher = build_dispatcher(&config);
    let n = notification(NotificationEvent::Rescheduled);
    assert_eq!(dispatcher.dispatch(n.clone()).await.unwrap(), DispatchOutcome::Sent { attempts: 1 });
    assert_eq!(dispatcher.dispatch(n).await.unwrap(), DispatchOutcome::Duplicate);
}

#[tokio::test]
async fn test_without_webhook_notifications_are_logged() {
    let config = TestConfig::default().to_app_config();
    let dispatcher = build_dispatcher(&config);

    let outcome = dispatcher.dispatch(notification(NotificationEvent::Cancelled)).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Sent { attempts: 1 });
}
