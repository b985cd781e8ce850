// libs/booking-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scheduling_cell::{
    day_of_week, Appointment, AppointmentStatus, ProfessionalSelector, SchedulingError, SlotRequest, TimeOfDay,
    WorkingWindow,
};

// ==============================================================================
// PERSISTED APPOINTMENTS
// ==============================================================================

/// Row of the `appointments` table. The scheduling rules only look at the
/// [`Appointment`] projection; client fields travel along for notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub professional_id: Uuid,
    #[serde(default)]
    pub service_ids: Vec<Uuid>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub client_email: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentRecord {
    pub fn as_appointment(&self) -> Appointment {
        Appointment {
            id: self.id,
            company_id: self.company_id,
            professional_id: self.professional_id,
            start_at: self.start_at,
            end_at: self.end_at,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub company_id: Uuid,
    pub professional_id: Uuid,
    pub service_ids: Vec<Uuid>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub client_email: Option<String>,
    pub notes: Option<String>,
}

// ==============================================================================
// REQUEST DTOS
// ==============================================================================

fn parse_time(raw: &str) -> Result<TimeOfDay, SchedulingError> {
    raw.parse()
}

/// `GET /slots` query. `service_ids` is a comma separated list.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotsQuery {
    pub professional_id: ProfessionalSelector,
    pub date: NaiveDate,
    pub service_ids: String,
    pub exclude_appointment_id: Option<Uuid>,
}

impl SlotsQuery {
    pub fn to_slot_request(&self, company_id: Uuid) -> Result<SlotRequest, SchedulingError> {
        let service_ids = parse_service_ids(&self.service_ids)?;
        let mut request = SlotRequest::new(company_id, self.professional_id, self.date, service_ids);
        request.exclude_appointment_id = self.exclude_appointment_id;
        Ok(request)
    }
}

pub fn parse_service_ids(raw: &str) -> Result<Vec<Uuid>, SchedulingError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            Uuid::parse_str(part).map_err(|_| SchedulingError::invalid(format!("invalid service id '{}'", part)))
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateSlotRequest {
    pub professional_id: ProfessionalSelector,
    pub date: NaiveDate,
    pub time: String,
    pub service_ids: Vec<Uuid>,
    pub exclude_appointment_id: Option<Uuid>,
}

impl ValidateSlotRequest {
    pub fn to_slot_request(&self, company_id: Uuid) -> Result<(SlotRequest, TimeOfDay), SchedulingError> {
        let time = parse_time(&self.time)?;
        let mut request = SlotRequest::new(company_id, self.professional_id, self.date, self.service_ids.clone());
        request.exclude_appointment_id = self.exclude_appointment_id;
        Ok((request, time))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub professional_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub service_ids: Vec<Uuid>,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub client_email: Option<String>,
    pub notes: Option<String>,
}

impl BookAppointmentRequest {
    pub fn to_slot_request(&self, company_id: Uuid) -> Result<(SlotRequest, TimeOfDay), SchedulingError> {
        let time = parse_time(&self.time)?;
        let request = SlotRequest::new(company_id, self.professional_id, self.date, self.service_ids.clone());
        Ok((request, time))
    }
}

/// Moves an appointment. Without `service_ids` the booked services are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub time: String,
    pub service_ids: Option<Vec<Uuid>>,
}

impl RescheduleRequest {
    pub fn parsed_time(&self) -> Result<TimeOfDay, SchedulingError> {
        parse_time(&self.time)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// WORKING WINDOW ADMINISTRATION
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct WorkingWindowInput {
    #[serde(with = "day_of_week")]
    pub day_of_week: Weekday,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceWindowsRequest {
    pub windows: Vec<WorkingWindowInput>,
}

impl WorkingWindowInput {
    /// Owner and tenant always come from the path, never from the body.
    pub fn into_window(self, company_id: Uuid, professional_id: Uuid) -> WorkingWindow {
        WorkingWindow {
            id: Uuid::new_v4(),
            company_id,
            professional_id: Some(professional_id),
            weekday: self.day_of_week,
            start: self.start,
            end: self.end,
            enabled: self.enabled,
        }
    }
}
