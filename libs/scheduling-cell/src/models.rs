// libs/scheduling-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use shared_utils::time::MINUTES_PER_DAY;

use crate::error::SchedulingError;

// ==============================================================================
// TIME OF DAY
// ==============================================================================

/// Wall-clock time with minute precision, `00:00..=24:00`.
///
/// `24:00` only makes sense as a window end; no slot can start there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(MINUTES_PER_DAY as u16);

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if minute >= 60 {
            return None;
        }
        Self::from_minutes(hour * 60 + minute)
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        if minutes > MINUTES_PER_DAY {
            return None;
        }
        Some(TimeOfDay(minutes as u16))
    }

    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }

    pub fn hour(self) -> u32 {
        self.minutes() / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes() % 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = SchedulingError;

    /// Accepts `HH:MM`, and `HH:MM:SS` when the seconds are zero (Postgres `time` columns).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SchedulingError::invalid(format!("malformed time of day '{}'", s));

        let mut parts = s.trim().split(':');
        let hour: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        let minute: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;

        if let Some(seconds) = parts.next() {
            let seconds: f64 = seconds.parse().map_err(|_| malformed())?;
            if seconds != 0.0 {
                return Err(SchedulingError::invalid(format!(
                    "time of day '{}' must have minute precision",
                    s
                )));
            }
        }
        if parts.next().is_some() {
            return Err(malformed());
        }

        TimeOfDay::from_hm(hour, minute).ok_or_else(malformed)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Weekdays on the wire are `0 = Sunday .. 6 = Saturday`.
pub mod day_of_week {
    use chrono::Weekday;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn to_index(weekday: Weekday) -> u8 {
        weekday.num_days_from_sunday() as u8
    }

    pub fn from_index(index: i64) -> Option<Weekday> {
        match index {
            0 => Some(Weekday::Sun),
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            _ => None,
        }
    }

    pub fn serialize<S: Serializer>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(to_index(*weekday))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let index = i64::deserialize(deserializer)?;
        from_index(index).ok_or_else(|| {
            serde::de::Error::custom(format!("day_of_week must be between 0 (Sunday) and 6 (Saturday), got {}", index))
        })
    }
}

// ==============================================================================
// WORKING WINDOWS
// ==============================================================================

/// One bookable interval on one weekday.
///
/// Windows without a `professional_id` are the company's generic business hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingWindow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub professional_id: Option<Uuid>,
    #[serde(rename = "day_of_week", with = "day_of_week")]
    pub weekday: Weekday,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub enabled: bool,
}

impl WorkingWindow {
    pub fn new(
        company_id: Uuid,
        professional_id: Option<Uuid>,
        weekday: Weekday,
        start: TimeOfDay,
        end: TimeOfDay,
    ) -> Result<Self, SchedulingError> {
        let window = Self {
            id: Uuid::new_v4(),
            company_id,
            professional_id,
            weekday,
            start,
            end,
            enabled: true,
        };
        window.check_bounds()?;
        Ok(window)
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn check_bounds(&self) -> Result<(), SchedulingError> {
        if self.start >= self.end {
            return Err(SchedulingError::invalid(format!(
                "working window start {} must be before end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    pub fn overlaps(&self, other: &WorkingWindow) -> bool {
        self.weekday == other.weekday && self.start < other.end && other.start < self.end
    }
}

// ==============================================================================
// SERVICES AND APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "confirmado")]
    Confirmed,
    #[serde(rename = "em_andamento")]
    InProgress,
    #[serde(rename = "concluido")]
    Completed,
    #[serde(rename = "cancelado")]
    Cancelled,
    #[serde(rename = "nao_compareceu")]
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pendente",
            AppointmentStatus::Confirmed => "confirmado",
            AppointmentStatus::InProgress => "em_andamento",
            AppointmentStatus::Completed => "concluido",
            AppointmentStatus::Cancelled => "cancelado",
            AppointmentStatus::NoShow => "nao_compareceu",
        }
    }

    /// Everything but a cancellation keeps the professional busy, including
    /// unconfirmed bookings.
    pub fn occupies_time(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| SchedulingError::invalid(format!("unknown appointment status '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub company_id: Uuid,
    pub professional_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn occupies_time(&self) -> bool {
        self.status.occupies_time()
    }
}

// ==============================================================================
// REQUESTS
// ==============================================================================

/// Who the customer wants to be served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProfessionalSelector {
    Any,
    Specific(Uuid),
}

impl ProfessionalSelector {
    pub fn professional_id(&self) -> Option<Uuid> {
        match self {
            ProfessionalSelector::Any => None,
            ProfessionalSelector::Specific(id) => Some(*id),
        }
    }
}

impl FromStr for ProfessionalSelector {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("any") {
            return Ok(ProfessionalSelector::Any);
        }
        Uuid::parse_str(s)
            .map(ProfessionalSelector::Specific)
            .map_err(|_| SchedulingError::invalid(format!("professional_id must be a UUID or \"any\", got '{}'", s)))
    }
}

impl TryFrom<String> for ProfessionalSelector {
    type Error = SchedulingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProfessionalSelector> for String {
    fn from(selector: ProfessionalSelector) -> Self {
        match selector {
            ProfessionalSelector::Any => "any".to_string(),
            ProfessionalSelector::Specific(id) => id.to_string(),
        }
    }
}

impl From<Uuid> for ProfessionalSelector {
    fn from(id: Uuid) -> Self {
        ProfessionalSelector::Specific(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRequest {
    pub company_id: Uuid,
    #[serde(rename = "professional_id")]
    pub professional: ProfessionalSelector,
    pub date: NaiveDate,
    pub service_ids: Vec<Uuid>,
    #[serde(default)]
    pub exclude_appointment_id: Option<Uuid>,
}

impl SlotRequest {
    pub fn new(
        company_id: Uuid,
        professional: impl Into<ProfessionalSelector>,
        date: NaiveDate,
        service_ids: Vec<Uuid>,
    ) -> Self {
        Self {
            company_id,
            professional: professional.into(),
            date,
            service_ids,
            exclude_appointment_id: None,
        }
    }

    pub fn excluding(mut self, appointment_id: Uuid) -> Self {
        self.exclude_appointment_id = Some(appointment_id);
        self
    }

    /// The requested ids with duplicates removed, first occurrence wins.
    pub fn distinct_service_ids(&self) -> Vec<Uuid> {
        let mut seen = std::collections::HashSet::new();
        self.service_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Everything the engine needs for one request, read from the store beforehand.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSnapshot {
    pub windows: Vec<WorkingWindow>,
    pub services: Vec<Service>,
    pub appointments: Vec<Appointment>,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotListing {
    pub date: NaiveDate,
    pub total_duration_minutes: u32,
    pub slots: Vec<TimeOfDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&Result<(), SchedulingError>> for ValidationOutcome {
    fn from(result: &Result<(), SchedulingError>) -> Self {
        match result {
            Ok(()) => ValidationOutcome { ok: true, reason: None, message: None },
            Err(e) => ValidationOutcome {
                ok: false,
                reason: Some(e.code().to_string()),
                message: Some(e.to_string()),
            },
        }
    }
}
