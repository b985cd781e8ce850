use std::sync::Arc;

use notification_cell::NotificationDispatcher;
use shared_config::AppConfig;

use crate::services::{AvailabilityService, BookingCommitter, Clock, SchedulingStore, WorkingWindowService};

/// Everything the booking handlers share.
pub struct BookingState {
    pub availability: Arc<AvailabilityService>,
    pub committer: BookingCommitter,
    pub windows: WorkingWindowService,
    pub clock: Arc<dyn Clock>,
}

impl BookingState {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn SchedulingStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let availability = Arc::new(AvailabilityService::new(config, store.clone()));

        Self {
            committer: BookingCommitter::new(availability.clone(), store.clone(), dispatcher),
            windows: WorkingWindowService::new(store),
            availability,
            clock,
        }
    }
}
