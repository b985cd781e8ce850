// libs/booking-cell/src/services/availability.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use scheduling_cell::{
    AvailabilityEngine, Candidate, ProfessionalSelector, ScheduleSnapshot, SchedulingError, SlotListing, SlotRequest,
    TimeOfDay,
};
use shared_config::AppConfig;
use shared_utils::time::day_bounds;

use crate::error::BookingError;
use crate::services::store::SchedulingStore;

/// Reads a request's snapshot from the store, then hands it to the engine.
pub struct AvailabilityService {
    store: Arc<dyn SchedulingStore>,
    engine: AvailabilityEngine,
    store_timeout: Duration,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig, store: Arc<dyn SchedulingStore>) -> Self {
        Self {
            store,
            engine: AvailabilityEngine::from_config(config),
            store_timeout: Duration::from_secs(config.store_timeout_seconds),
        }
    }

    pub async fn list_slots(&self, request: &SlotRequest, now: DateTime<Utc>) -> Result<SlotListing, BookingError> {
        let snapshot = self.snapshot(request).await?;
        Ok(self.engine.list_slots(request, &snapshot, now)?)
    }

    pub async fn validate(&self, request: &SlotRequest, time: TimeOfDay, now: DateTime<Utc>) -> Result<(), BookingError> {
        self.check(request, time, now).await.map(|_| ())
    }

    /// Validation that also yields the interval to persist.
    pub async fn check(
        &self,
        request: &SlotRequest,
        time: TimeOfDay,
        now: DateTime<Utc>,
    ) -> Result<Candidate, BookingError> {
        if request.professional == ProfessionalSelector::Any {
            return Err(SchedulingError::invalid("a specific professional is required to book").into());
        }

        let snapshot = self.snapshot(request).await?;
        Ok(self.engine.check(request, time, &snapshot, now)?)
    }

    /// All store reads for one request, issued together under one timeout.
    ///
    /// An empty service selection is rejected before any I/O.
    #[instrument(skip(self, request), fields(company_id = %request.company_id, date = %request.date))]
    pub async fn snapshot(&self, request: &SlotRequest) -> Result<ScheduleSnapshot, BookingError> {
        let service_ids = request.distinct_service_ids();
        if service_ids.is_empty() {
            return Err(SchedulingError::invalid("at least one service must be selected").into());
        }

        let snapshot = match timeout(self.store_timeout, self.fetch_snapshot(request, &service_ids)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("Store did not answer within {:?}", self.store_timeout);
                return Err(BookingError::StoreTimeout {
                    seconds: self.store_timeout.as_secs(),
                });
            }
        };

        debug!(
            "Snapshot: {} windows, {} services, {} appointments",
            snapshot.windows.len(),
            snapshot.services.len(),
            snapshot.appointments.len()
        );
        Ok(snapshot)
    }

    async fn fetch_snapshot(
        &self,
        request: &SlotRequest,
        service_ids: &[Uuid],
    ) -> Result<ScheduleSnapshot, BookingError> {
        let company_id = request.company_id;
        let weekday = request.date.weekday();
        let store = &self.store;

        match request.professional {
            ProfessionalSelector::Specific(professional_id) => {
                let (from, to) = day_bounds(self.engine.timezone(), request.date).ok_or_else(|| {
                    BookingError::ValidationError(format!("{} has no valid local time", request.date))
                })?;

                let (exists, windows, services, appointments) = futures::try_join!(
                    store.professional_exists(company_id, professional_id),
                    store.get_working_windows(company_id, professional_id, weekday),
                    store.get_services(company_id, service_ids),
                    store.get_appointments(company_id, professional_id, from, to),
                )?;

                if !exists {
                    return Err(BookingError::ProfessionalNotFound(professional_id));
                }

                Ok(ScheduleSnapshot {
                    windows,
                    services,
                    appointments,
                })
            }
            ProfessionalSelector::Any => {
                let (windows, services) = futures::try_join!(
                    store.get_business_hours(company_id, weekday),
                    store.get_services(company_id, service_ids),
                )?;

                Ok(ScheduleSnapshot {
                    windows,
                    services,
                    appointments: Vec::new(),
                })
            }
        }
    }
}
