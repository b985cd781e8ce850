use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::error::SchedulingError;
use crate::models::{ProfessionalSelector, ScheduleSnapshot, SlotListing, SlotRequest, TimeOfDay, WorkingWindow};
use crate::services::conflict::ConflictFilter;
use crate::services::duration::DurationAggregator;
use crate::services::past_time::PastTimeFilter;
use crate::services::slots::{Candidate, SlotGenerator};

/// Stateless availability rules. Every call works on an already-fetched snapshot and an
/// injected `now`; nothing here performs I/O or reads the clock.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityEngine {
    generator: SlotGenerator,
    timezone: Tz,
}

impl AvailabilityEngine {
    pub fn new(granularity_minutes: u32, timezone: Tz) -> Self {
        Self {
            generator: SlotGenerator::new(granularity_minutes),
            timezone,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.slot_granularity_minutes, config.business_timezone)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Bookable starts for `request`, ascending. Empty is a valid answer.
    ///
    /// Pipeline order is fixed: duration, window grid, conflicts, past times. With
    /// `ProfessionalSelector::Any` the grid comes from the company's generic hours and no
    /// per-professional conflict filtering happens.
    pub fn list_slots(
        &self,
        request: &SlotRequest,
        snapshot: &ScheduleSnapshot,
        now: DateTime<Utc>,
    ) -> Result<SlotListing, SchedulingError> {
        let duration = DurationAggregator::total_minutes(&request.service_ids, &snapshot.services)?;
        let windows = select_windows(request.professional, &snapshot.windows);

        let starts = self.generator.generate(request.date, &windows, duration);
        let mut candidates: Vec<Candidate> = starts
            .into_iter()
            .filter_map(|start| Candidate::materialize(self.timezone, request.date, start, duration))
            .filter(|candidate| candidate.within(self.timezone, request.date, &windows))
            .collect();

        if let ProfessionalSelector::Specific(professional_id) = request.professional {
            let conflicts = ConflictFilter::new(
                professional_id,
                &snapshot.appointments,
                request.exclude_appointment_id,
            );
            candidates = conflicts.apply(candidates);
        }

        candidates = PastTimeFilter::new(self.timezone, now).apply(request.date, candidates);

        let slots: Vec<TimeOfDay> = candidates.into_iter().map(|c| c.start).collect();
        debug!(
            "Listing {} slots on {} for {:?} ({} min)",
            slots.len(),
            request.date,
            request.professional,
            duration
        );

        Ok(SlotListing {
            date: request.date,
            total_duration_minutes: duration,
            slots,
        })
    }

    /// Re-checks one start against the same predicates as [`list_slots`](Self::list_slots),
    /// reporting the first failing rule: request, window fit, conflict, past time.
    pub fn validate(
        &self,
        request: &SlotRequest,
        time: TimeOfDay,
        snapshot: &ScheduleSnapshot,
        now: DateTime<Utc>,
    ) -> Result<(), SchedulingError> {
        let result = self.check(request, time, snapshot, now).map(|_| ());

        if let Err(e) = &result {
            warn!(
                "Validation rejected {} on {} for {:?}: {}",
                time, request.date, request.professional, e
            );
        }
        result
    }

    /// Like [`validate`](Self::validate), returning the accepted interval as instants.
    pub fn check(
        &self,
        request: &SlotRequest,
        time: TimeOfDay,
        snapshot: &ScheduleSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Candidate, SchedulingError> {
        let professional_id = match request.professional {
            ProfessionalSelector::Specific(id) => id,
            ProfessionalSelector::Any => {
                return Err(SchedulingError::invalid("a specific professional is required to book"));
            }
        };

        let duration = DurationAggregator::total_minutes(&request.service_ids, &snapshot.services)?;
        let windows = select_windows(request.professional, &snapshot.windows);

        if !self.generator.fits(request.date, &windows, time, duration) {
            return Err(SchedulingError::OutsideWindow);
        }

        let candidate = Candidate::materialize(self.timezone, request.date, time, duration)
            .filter(|candidate| candidate.within(self.timezone, request.date, &windows))
            .ok_or(SchedulingError::OutsideWindow)?;

        let conflicts = ConflictFilter::new(
            professional_id,
            &snapshot.appointments,
            request.exclude_appointment_id,
        );
        if let Some(existing) = conflicts.first_conflict(&candidate) {
            debug!("Candidate {} collides with appointment {}", time, existing.id);
            return Err(SchedulingError::Conflict);
        }

        if PastTimeFilter::new(self.timezone, now).has_elapsed(request.date, &candidate) {
            return Err(SchedulingError::InThePast);
        }

        Ok(candidate)
    }
}

fn select_windows(professional: ProfessionalSelector, windows: &[WorkingWindow]) -> Vec<WorkingWindow> {
    let owner: Option<Uuid> = professional.professional_id();
    windows
        .iter()
        .filter(|w| w.professional_id == owner)
        .cloned()
        .collect()
}
