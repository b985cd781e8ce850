use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::Appointment;
use crate::services::slots::Candidate;

/// Half-open interval overlap: touching ends do not collide.
pub fn intervals_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && start2 < end1
}

/// Removes candidates that collide with a professional's occupied time.
pub struct ConflictFilter<'a> {
    professional_id: Uuid,
    appointments: &'a [Appointment],
    exclude_appointment_id: Option<Uuid>,
}

impl<'a> ConflictFilter<'a> {
    pub fn new(
        professional_id: Uuid,
        appointments: &'a [Appointment],
        exclude_appointment_id: Option<Uuid>,
    ) -> Self {
        Self {
            professional_id,
            appointments,
            exclude_appointment_id,
        }
    }

    /// Appointments that block time: this professional's, not cancelled, not the one
    /// being edited.
    fn occupied(&self) -> impl Iterator<Item = &'a Appointment> + '_ {
        self.appointments.iter().filter(move |apt| {
            apt.professional_id == self.professional_id
                && apt.occupies_time()
                && Some(apt.id) != self.exclude_appointment_id
        })
    }

    pub fn first_conflict(&self, candidate: &Candidate) -> Option<&'a Appointment> {
        self.occupied().find(|apt| {
            intervals_overlap(candidate.starts_at, candidate.ends_at, apt.start_at, apt.end_at)
        })
    }

    pub fn apply(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let before = candidates.len();
        let free: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| self.first_conflict(candidate).is_none())
            .collect();

        debug!(
            "Conflict filter removed {} of {} candidates for professional {}",
            before - free.len(),
            before,
            self.professional_id
        );
        free
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crate::models::{AppointmentStatus, TimeOfDay};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn candidate(h: u32, m: u32, minutes: i64) -> Candidate {
        Candidate {
            start: TimeOfDay::from_hm(h, m).unwrap(),
            starts_at: at(h, m),
            ends_at: at(h, m) + Duration::minutes(minutes),
        }
    }

    fn appointment(professional_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            professional_id,
            start_at: start,
            end_at: end,
            status,
        }
    }

    #[test]
    fn test_overlap_is_half_open() {
        assert!(intervals_overlap(at(9, 0), at(10, 0), at(9, 30), at(10, 30)));
        assert!(!intervals_overlap(at(9, 0), at(10, 0), at(10, 0), at(11, 0)));
        assert!(!intervals_overlap(at(10, 0), at(11, 0), at(9, 0), at(10, 0)));
        assert!(intervals_overlap(at(9, 0), at(12, 0), at(10, 0), at(11, 0)));
    }

    #[test]
    fn test_pending_appointments_block_time() {
        let pro = Uuid::new_v4();
        let booked = vec![appointment(pro, at(10, 0), at(11, 0), AppointmentStatus::Pending)];
        let filter = ConflictFilter::new(pro, &booked, None);

        let free = filter.apply(vec![candidate(9, 0, 60), candidate(9, 30, 60), candidate(11, 0, 60)]);
        let starts: Vec<String> = free.iter().map(|c| c.start.to_string()).collect();
        assert_eq!(starts, vec!["09:00", "11:00"]);
    }

    #[test]
    fn test_cancelled_and_excluded_appointments_ignored() {
        let pro = Uuid::new_v4();
        let cancelled = appointment(pro, at(10, 0), at(11, 0), AppointmentStatus::Cancelled);
        let editing = appointment(pro, at(12, 0), at(13, 0), AppointmentStatus::Confirmed);
        let booked = vec![cancelled, editing.clone()];

        let filter = ConflictFilter::new(pro, &booked, Some(editing.id));
        assert!(filter.first_conflict(&candidate(10, 0, 60)).is_none());
        assert!(filter.first_conflict(&candidate(12, 0, 60)).is_none());

        let without_exclusion = ConflictFilter::new(pro, &booked, None);
        assert_eq!(
            without_exclusion.first_conflict(&candidate(12, 30, 30)).map(|a| a.id),
            Some(editing.id)
        );
    }

    #[test]
    fn test_other_professionals_do_not_conflict() {
        let pro = Uuid::new_v4();
        let booked = vec![appointment(Uuid::new_v4(), at(10, 0), at(11, 0), AppointmentStatus::Confirmed)];
        let filter = ConflictFilter::new(pro, &booked, None);
        assert!(filter.first_conflict(&candidate(10, 0, 60)).is_none());
    }
}
