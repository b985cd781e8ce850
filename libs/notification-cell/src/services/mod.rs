pub mod sender;
pub mod dispatcher;

pub use sender::{LogSender, NotificationSender, WebhookSender};
pub use dispatcher::{build_dispatcher, spawn_dispatch, NotificationDispatcher, RetryingDispatcher};
