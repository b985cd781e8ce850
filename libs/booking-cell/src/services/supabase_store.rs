// libs/booking-cell/src/services/supabase_store.rs
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc, Weekday};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use uuid::Uuid;

use scheduling_cell::{day_of_week, Appointment, AppointmentStatus, SchedulingError, Service, WorkingWindow};
use shared_config::AppConfig;
use shared_database::supabase::{SupabaseClient, CONSTRAINT_VIOLATION};

use crate::error::BookingError;
use crate::models::{AppointmentRecord, NewAppointment};
use crate::services::store::SchedulingStore;

/// PostgREST-backed store. Tables: `professionals`, `services`, `appointments` and
/// `working_windows` (rows without `professional_id` are business hours).
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, BookingError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, None)
            .await
            .map_err(database_error)?;

        decode_rows(result)
    }

    async fn write<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<Value>) -> Result<Vec<T>, BookingError> {
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(method, path, body, Some(SupabaseClient::representation_headers()))
            .await
            .map_err(write_error)?;

        decode_rows(result)
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, BookingError> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| BookingError::DatabaseError(format!("Unexpected row shape: {}", e)))
}

fn database_error(e: anyhow::Error) -> BookingError {
    error!("Supabase request failed: {}", e);
    BookingError::DatabaseError(e.to_string())
}

/// An exclusion constraint on (professional, time range) surfaces as 409; it means the
/// slot was taken by a writer that bypassed the application lock.
fn write_error(e: anyhow::Error) -> BookingError {
    if e.to_string().starts_with(CONSTRAINT_VIOLATION) {
        info!("Store rejected overlapping appointment: {}", e);
        return BookingError::Rejected(SchedulingError::Conflict);
    }
    database_error(e)
}

fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn first_row<T>(rows: Vec<T>, appointment_id: Uuid) -> Result<T, BookingError> {
    rows.into_iter()
        .next()
        .ok_or(BookingError::AppointmentNotFound(appointment_id))
}

#[async_trait]
impl SchedulingStore for SupabaseStore {
    async fn professional_exists(&self, company_id: Uuid, professional_id: Uuid) -> Result<bool, BookingError> {
        let path = format!(
            "/rest/v1/professionals?id=eq.{}&company_id=eq.{}&select=id",
            professional_id, company_id
        );
        let rows: Vec<Value> = self.fetch(&path).await?;
        Ok(!rows.is_empty())
    }

    async fn get_working_windows(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
        weekday: Weekday,
    ) -> Result<Vec<WorkingWindow>, BookingError> {
        let path = format!(
            "/rest/v1/working_windows?company_id=eq.{}&professional_id=eq.{}&day_of_week=eq.{}&order=start.asc",
            company_id,
            professional_id,
            day_of_week::to_index(weekday)
        );
        self.fetch(&path).await
    }

    async fn get_business_hours(&self, company_id: Uuid, weekday: Weekday) -> Result<Vec<WorkingWindow>, BookingError> {
        let path = format!(
            "/rest/v1/working_windows?company_id=eq.{}&professional_id=is.null&day_of_week=eq.{}&order=start.asc",
            company_id,
            day_of_week::to_index(weekday)
        );
        self.fetch(&path).await
    }

    async fn get_services(&self, company_id: Uuid, service_ids: &[Uuid]) -> Result<Vec<Service>, BookingError> {
        if service_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = service_ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
        let path = format!("/rest/v1/services?company_id=eq.{}&id=in.({})", company_id, ids);
        self.fetch(&path).await
    }

    async fn get_appointments(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, BookingError> {
        let path = format!(
            "/rest/v1/appointments?company_id=eq.{}&professional_id=eq.{}&start_at=lt.{}&end_at=gt.{}&order=start_at.asc",
            company_id,
            professional_id,
            timestamp(to),
            timestamp(from)
        );
        let records: Vec<AppointmentRecord> = self.fetch(&path).await?;
        debug!("Fetched {} appointments for professional {}", records.len(), professional_id);

        Ok(records.iter().map(AppointmentRecord::as_appointment).collect())
    }

    async fn get_appointment(
        &self,
        company_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Option<AppointmentRecord>, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&company_id=eq.{}", appointment_id, company_id);
        let records: Vec<AppointmentRecord> = self.fetch(&path).await?;
        Ok(records.into_iter().next())
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<AppointmentRecord, BookingError> {
        let body = serde_json::to_value(&appointment)
            .map_err(|e| BookingError::DatabaseError(format!("Failed to encode appointment: {}", e)))?;

        let records: Vec<AppointmentRecord> = self.write(Method::POST, "/rest/v1/appointments", Some(body)).await?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::DatabaseError("Insert returned no appointment".to_string()))
    }

    async fn update_appointment_schedule(
        &self,
        company_id: Uuid,
        appointment_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        service_ids: &[Uuid],
    ) -> Result<AppointmentRecord, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&company_id=eq.{}", appointment_id, company_id);
        let body = json!({
            "start_at": timestamp(start_at),
            "end_at": timestamp(end_at),
            "service_ids": service_ids,
            "updated_at": timestamp(Utc::now()),
        });

        let records: Vec<AppointmentRecord> = self.write(Method::PATCH, &path, Some(body)).await?;
        first_row(records, appointment_id)
    }

    async fn update_appointment_status(
        &self,
        company_id: Uuid,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<AppointmentRecord, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&company_id=eq.{}", appointment_id, company_id);
        let body = json!({
            "status": status,
            "updated_at": timestamp(Utc::now()),
        });

        let records: Vec<AppointmentRecord> = self.write(Method::PATCH, &path, Some(body)).await?;
        first_row(records, appointment_id)
    }

    async fn list_working_windows(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
    ) -> Result<Vec<WorkingWindow>, BookingError> {
        let path = format!(
            "/rest/v1/working_windows?company_id=eq.{}&professional_id=eq.{}&order=day_of_week.asc,start.asc",
            company_id, professional_id
        );
        self.fetch(&path).await
    }

    // TODO: move to a Postgres function so delete and insert share one transaction
    async fn replace_working_windows(
        &self,
        company_id: Uuid,
        professional_id: Uuid,
        windows: Vec<WorkingWindow>,
    ) -> Result<Vec<WorkingWindow>, BookingError> {
        let path = format!(
            "/rest/v1/working_windows?company_id=eq.{}&professional_id=eq.{}",
            company_id, professional_id
        );
        let removed: Vec<Value> = self.write(Method::DELETE, &path, None).await?;
        debug!("Removed {} working windows of professional {}", removed.len(), professional_id);

        if windows.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::to_value(&windows)
            .map_err(|e| BookingError::DatabaseError(format!("Failed to encode working windows: {}", e)))?;
        self.write(Method::POST, "/rest/v1/working_windows", Some(body)).await
    }
}
