use async_trait::async_trait;
use chrono::{DateTime, Utc, Weekday};
use uuid::Uuid;

use scheduling_cell::{Appointment, AppointmentStatus, Service, WorkingWindow};

use crate::error::BookingError;
use crate::models::{AppointmentRecord, NewAppointment};

/// Persistence the booking surface depends on. Every call is scoped by `company_id`.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn professional_exists(&self, company_id: Uuid, professional_id: Uuid) -> Result<bool, BookingError>;

    /// The professional's windows for one weekday, enabled or not.
    async fn get_working_windows(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
        weekday: Weekday,
    ) -> Result<Vec<WorkingWindow>, BookingError>;

    /// Company-wide opening hours (windows without a professional).
    async fn get_business_hours(&self, company_id: Uuid, weekday: Weekday) -> Result<Vec<WorkingWindow>, BookingError>;

    /// Requested services that exist, inactive ones included.
    async fn get_services(&self, company_id: Uuid, service_ids: &[Uuid]) -> Result<Vec<Service>, BookingError>;

    /// Appointments of every status intersecting `[from, to)`.
    async fn get_appointments(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, BookingError>;

    async fn get_appointment(
        &self,
        company_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Option<AppointmentRecord>, BookingError>;

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<AppointmentRecord, BookingError>;

    async fn update_appointment_schedule(
        &self,
        company_id: Uuid,
        appointment_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        service_ids: &[Uuid],
    ) -> Result<AppointmentRecord, BookingError>;

    async fn update_appointment_status(
        &self,
        company_id: Uuid,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<AppointmentRecord, BookingError>;

    async fn list_working_windows(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
    ) -> Result<Vec<WorkingWindow>, BookingError>;

    async fn replace_working_windows(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
        windows: Vec<WorkingWindow>,
    ) -> Result<Vec<WorkingWindow>, BookingError>;
}
