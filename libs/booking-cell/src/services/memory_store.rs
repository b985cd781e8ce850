use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc, Weekday};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use scheduling_cell::{Appointment, AppointmentStatus, Service, WorkingWindow};

use crate::error::BookingError;
use crate::models::{AppointmentRecord, NewAppointment};
use crate::services::store::SchedulingStore;

#[derive(Default)]
struct MemoryData {
    professionals: HashSet<(Uuid, Uuid)>,
    services: Vec<Service>,
    windows: Vec<WorkingWindow>,
    appointments: Vec<AppointmentRecord>,
}

/// Process-local store, used when Supabase is not configured and in tests.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_professional(&self, company_id: Uuid, professional_id: Uuid) {
        self.data.write().await.professionals.insert((company_id, professional_id));
    }

    pub async fn add_service(&self, service: Service) {
        self.data.write().await.services.push(service);
    }

    pub async fn add_window(&self, window: WorkingWindow) {
        self.data.write().await.windows.push(window);
    }

    pub async fn appointments(&self) -> Vec<AppointmentRecord> {
        self.data.read().await.appointments.clone()
    }
}

#[async_trait]
impl SchedulingStore for MemoryStore {
    async fn professional_exists(&self, company_id: Uuid, professional_id: Uuid) -> Result<bool, BookingError> {
        Ok(self.data.read().await.professionals.contains(&(company_id, professional_id)))
    }

    async fn get_working_windows(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
        weekday: Weekday,
    ) -> Result<Vec<WorkingWindow>, BookingError> {
        let data = self.data.read().await;
        Ok(data
            .windows
            .iter()
            .filter(|w| w.company_id == company_id && w.professional_id == Some(professional_id) && w.weekday == weekday)
            .cloned()
            .collect())
    }

    async fn get_business_hours(&self, company_id: Uuid, weekday: Weekday) -> Result<Vec<WorkingWindow>, BookingError> {
        let data = self.data.read().await;
        Ok(data
            .windows
            .iter()
            .filter(|w| w.company_id == company_id && w.professional_id.is_none() && w.weekday == weekday)
            .cloned()
            .collect())
    }

    async fn get_services(&self, company_id: Uuid, service_ids: &[Uuid]) -> Result<Vec<Service>, BookingError> {
        let data = self.data.read().await;
        Ok(data
            .services
            .iter()
            .filter(|s| s.company_id == company_id && service_ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn get_appointments(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, BookingError> {
        let data = self.data.read().await;
        let appointments: Vec<Appointment> = data
            .appointments
            .iter()
            .filter(|a| {
                a.company_id == company_id && a.professional_id == professional_id && a.start_at < to && a.end_at > from
            })
            .map(AppointmentRecord::as_appointment)
            .collect();

        debug!("Memory store returned {} appointments for {}", appointments.len(), professional_id);
        Ok(appointments)
    }

    async fn get_appointment(
        &self,
        company_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Option<AppointmentRecord>, BookingError> {
        let data = self.data.read().await;
        Ok(data
            .appointments
            .iter()
            .find(|a| a.company_id == company_id && a.id == appointment_id)
            .cloned())
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<AppointmentRecord, BookingError> {
        let now = Utc::now();
        let record = AppointmentRecord {
            id: Uuid::new_v4(),
            company_id: appointment.company_id,
            professional_id: appointment.professional_id,
            service_ids: appointment.service_ids,
            start_at: appointment.start_at,
            end_at: appointment.end_at,
            status: appointment.status,
            client_name: appointment.client_name,
            client_phone: appointment.client_phone,
            client_email: appointment.client_email,
            notes: appointment.notes,
            created_at: now,
            updated_at: now,
        };

        self.data.write().await.appointments.push(record.clone());
        Ok(record)
    }

    async fn update_appointment_schedule(
        &self,
        company_id: Uuid,
        appointment_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        service_ids: &[Uuid],
    ) -> Result<AppointmentRecord, BookingError> {
        let mut data = self.data.write().await;
        let record = data
            .appointments
            .iter_mut()
            .find(|a| a.company_id == company_id && a.id == appointment_id)
            .ok_or(BookingError::AppointmentNotFound(appointment_id))?;

        record.start_at = start_at;
        record.end_at = end_at;
        record.service_ids = service_ids.to_vec();
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn update_appointment_status(
        &self,
        company_id: Uuid,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<AppointmentRecord, BookingError> {
        let mut data = self.data.write().await;
        let record = data
            .appointments
            .iter_mut()
            .find(|a| a.company_id == company_id && a.id == appointment_id)
            .ok_or(BookingError::AppointmentNotFound(appointment_id))?;

        record.status = status;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn list_working_windows(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
    ) -> Result<Vec<WorkingWindow>, BookingError> {
        let data = self.data.read().await;
        Ok(data
            .windows
            .iter()
            .filter(|w| w.company_id == company_id && w.professional_id == Some(professional_id))
            .cloned()
            .collect())
    }

    async fn replace_working_windows(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
        windows: Vec<WorkingWindow>,
    ) -> Result<Vec<WorkingWindow>, BookingError> {
        let mut data = self.data.write().await;
        data.windows
            .retain(|w| !(w.company_id == company_id && w.professional_id == Some(professional_id)));
        data.windows.extend(windows.iter().cloned());
        Ok(windows)
    }
}
