// libs/booking-cell/src/services/committer.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use notification_cell::{spawn_dispatch, AppointmentNotification, DispatchOutcome, NotificationDispatcher, NotificationEvent};
use scheduling_cell::{AppointmentStatus, SlotRequest};

use crate::error::BookingError;
use crate::models::{AppointmentRecord, BookAppointmentRequest, NewAppointment, RescheduleRequest};
use crate::services::availability::AvailabilityService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::store::SchedulingStore;

/// Persists bookings. Validation and the write it guards run under one lock per
/// professional, so two requests can never both claim the same time.
pub struct BookingCommitter {
    availability: Arc<AvailabilityService>,
    store: Arc<dyn SchedulingStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    lifecycle: AppointmentLifecycleService,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl BookingCommitter {
    pub fn new(
        availability: Arc<AvailabilityService>,
        store: Arc<dyn SchedulingStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            availability,
            store,
            dispatcher,
            lifecycle: AppointmentLifecycleService::new(),
            locks: DashMap::new(),
        }
    }

    async fn lock_professional(&self, professional_id: Uuid) -> ProfessionalGuard<'_> {
        let lock = self
            .locks
            .entry(professional_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        ProfessionalGuard {
            locks: &self.locks,
            professional_id,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[instrument(skip(self, request), fields(professional_id = %request.professional_id, date = %request.date))]
    pub async fn book(
        &self,
        company_id: Uuid,
        request: BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<AppointmentRecord, BookingError> {
        if request.client_name.trim().is_empty() {
            return Err(BookingError::ValidationError("client_name is required".to_string()));
        }
        let (slot_request, time) = request.to_slot_request(company_id)?;

        let record = {
            let _guard = self.lock_professional(request.professional_id).await;

            let candidate = self.availability.check(&slot_request, time, now).await?;
            self.store
                .insert_appointment(NewAppointment {
                    company_id,
                    professional_id: request.professional_id,
                    service_ids: slot_request.distinct_service_ids(),
                    start_at: candidate.starts_at,
                    end_at: candidate.ends_at,
                    status: AppointmentStatus::Pending,
                    client_name: request.client_name.trim().to_string(),
                    client_phone: request.client_phone,
                    client_email: request.client_email,
                    notes: request.notes,
                })
                .await?
        };

        info!("Booked appointment {} at {}", record.id, record.start_at);
        self.notify(&record, NotificationEvent::Created);
        Ok(record)
    }

    #[instrument(skip(self, request))]
    pub async fn reschedule(
        &self,
        company_id: Uuid,
        appointment_id: Uuid,
        request: RescheduleRequest,
        now: DateTime<Utc>,
    ) -> Result<AppointmentRecord, BookingError> {
        let time = request.parsed_time()?;
        let current = self.load(company_id, appointment_id).await?;

        let guard = self.lock_professional(current.professional_id).await;

        // re-read under the lock; status may have moved since
        let current = self.load(company_id, appointment_id).await?;
        if current.status.is_terminal() {
            return Err(BookingError::AppointmentClosed(current.status));
        }

        let service_ids = request.service_ids.unwrap_or_else(|| current.service_ids.clone());
        let slot_request =
            SlotRequest::new(company_id, current.professional_id, request.date, service_ids).excluding(current.id);

        let candidate = self.availability.check(&slot_request, time, now).await?;
        let record = self
            .store
            .update_appointment_schedule(
                company_id,
                appointment_id,
                candidate.starts_at,
                candidate.ends_at,
                &slot_request.distinct_service_ids(),
            )
            .await?;
        drop(guard);

        info!("Rescheduled appointment {} to {}", record.id, record.start_at);
        self.notify(&record, NotificationEvent::Rescheduled);
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn transition_status(
        &self,
        company_id: Uuid,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<AppointmentRecord, BookingError> {
        let professional_id = self.load(company_id, appointment_id).await?.professional_id;

        let record = {
            let _guard = self.lock_professional(professional_id).await;

            let current = self.load(company_id, appointment_id).await?;
            self.lifecycle.validate_status_transition(current.status, status)?;
            self.store
                .update_appointment_status(company_id, appointment_id, status)
                .await?
        };

        info!("Appointment {} is now {}", record.id, record.status);
        if let Some(event) = self.lifecycle.notification_for(status) {
            self.notify(&record, event);
        }
        Ok(record)
    }

    /// Sends the reminder and waits for the outcome, unlike the other events.
    pub async fn send_reminder(&self, company_id: Uuid, appointment_id: Uuid) -> Result<DispatchOutcome, BookingError> {
        let record = self.load(company_id, appointment_id).await?;
        if record.status.is_terminal() {
            return Err(BookingError::AppointmentClosed(record.status));
        }

        self.dispatcher
            .dispatch(notification_for(&record, NotificationEvent::Reminder))
            .await
            .map_err(|e| BookingError::NotificationFailed(e.to_string()))
    }

    async fn load(&self, company_id: Uuid, appointment_id: Uuid) -> Result<AppointmentRecord, BookingError> {
        self.store
            .get_appointment(company_id, appointment_id)
            .await?
            .ok_or(BookingError::AppointmentNotFound(appointment_id))
    }

    fn notify(&self, record: &AppointmentRecord, event: NotificationEvent) {
        if record.client_email.is_none() && record.client_phone.is_none() {
            warn!("Appointment {} has no contact data for {} notification", record.id, event);
        }
        spawn_dispatch(self.dispatcher.clone(), notification_for(record, event));
    }
}

/// Holds one professional's commit lock. The map entry goes away with the last holder,
/// so the map only keeps professionals with a commit in flight.
struct ProfessionalGuard<'a> {
    locks: &'a DashMap<Uuid, Arc<Mutex<()>>>,
    professional_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ProfessionalGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.professional_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

fn notification_for(record: &AppointmentRecord, event: NotificationEvent) -> AppointmentNotification {
    AppointmentNotification {
        appointment_id: record.id,
        company_id: record.company_id,
        professional_id: record.professional_id,
        event,
        starts_at: record.start_at,
        ends_at: record.end_at,
        status: record.status.to_string(),
        client_name: record.client_name.clone(),
        client_email: record.client_email.clone(),
        client_phone: record.client_phone.clone(),
        channels: AppointmentNotification::channels_for(record.client_email.as_deref(), record.client_phone.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Weekday;

    use notification_cell::build_dispatcher;
    use scheduling_cell::{SchedulingError, Service, WorkingWindow};
    use shared_utils::test_utils::{date, utc, TestConfig};

    use crate::services::memory_store::MemoryStore;

    async fn committer() -> (BookingCommitter, Uuid, Uuid, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let company = Uuid::new_v4();
        let professional = Uuid::new_v4();
        let service = Uuid::new_v4();

        store.add_professional(company, professional).await;
        store
            .add_service(Service {
                id: service,
                company_id: company,
                name: "Escova".to_string(),
                duration_minutes: 30,
                active: true,
            })
            .await;
        store
            .add_window(
                WorkingWindow::new(
                    company,
                    Some(professional),
                    Weekday::Mon,
                    "09:00".parse().unwrap(),
                    "10:00".parse().unwrap(),
                )
                .unwrap(),
            )
            .await;

        let config = TestConfig::default().to_app_config();
        let availability = Arc::new(AvailabilityService::new(&config, store.clone()));
        let committer = BookingCommitter::new(availability, store, build_dispatcher(&config));
        (committer, company, professional, service)
    }

    fn request(professional: Uuid, service: Uuid) -> BookAppointmentRequest {
        BookAppointmentRequest {
            professional_id: professional,
            date: date(2026, 3, 9),
            time: "09:00".to_string(),
            service_ids: vec![service],
            client_name: "Joana".to_string(),
            client_phone: None,
            client_email: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_lock_entry_released_with_last_holder() {
        let (committer, _, professional, _) = committer().await;

        let guard = committer.lock_professional(professional).await;
        assert_eq!(committer.locks.len(), 1);

        drop(guard);
        assert!(committer.locks.is_empty());
    }

    #[tokio::test]
    async fn test_lock_entry_kept_while_another_commit_waits() {
        let (committer, _, professional, _) = committer().await;
        let committer = Arc::new(committer);

        let first = committer.lock_professional(professional).await;
        let waiter = {
            let committer = committer.clone();
            tokio::spawn(async move {
                let _second = committer.lock_professional(professional).await;
            })
        };
        // let the waiter clone the mutex and park on it
        while Arc::strong_count(committer.locks.get(&professional).unwrap().value()) < 3 {
            tokio::task::yield_now().await;
        }

        drop(first);
        assert_eq!(committer.locks.len(), 1);

        waiter.await.unwrap();
        assert!(committer.locks.is_empty());
    }

    #[tokio::test]
    async fn test_commits_leave_no_lock_entries() {
        let (committer, company, professional, service) = committer().await;
        let now = utc(2026, 3, 1, 12, 0);

        committer.book(company, request(professional, service), now).await.unwrap();
        assert_matches!(
            committer.book(company, request(professional, service), now).await,
            Err(BookingError::Rejected(SchedulingError::Conflict))
        );

        assert!(committer.locks.is_empty());
    }
}
