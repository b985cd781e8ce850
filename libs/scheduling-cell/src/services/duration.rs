use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::Service;

/// Turns a selection of services into one booking length.
pub struct DurationAggregator;

impl DurationAggregator {
    /// Total minutes for `service_ids`, looked up in `catalog`.
    ///
    /// Duplicated ids count once. Unknown, inactive or zero-length services reject the
    /// whole selection.
    pub fn total_minutes(service_ids: &[Uuid], catalog: &[Service]) -> Result<u32, SchedulingError> {
        if service_ids.is_empty() {
            return Err(SchedulingError::invalid("at least one service must be selected"));
        }

        let by_id: HashMap<Uuid, &Service> = catalog.iter().map(|s| (s.id, s)).collect();
        let mut seen = std::collections::HashSet::with_capacity(service_ids.len());
        let mut total: u32 = 0;

        for id in service_ids.iter().filter(|id| seen.insert(**id)) {
            let service = by_id
                .get(id)
                .ok_or_else(|| SchedulingError::invalid(format!("unknown service {}", id)))?;

            if !service.active {
                return Err(SchedulingError::invalid(format!(
                    "service '{}' is not active",
                    service.name
                )));
            }

            let minutes = u32::try_from(service.duration_minutes)
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| {
                    SchedulingError::invalid(format!(
                        "service '{}' has an invalid duration of {} minutes",
                        service.name, service.duration_minutes
                    ))
                })?;

            total = total
                .checked_add(minutes)
                .ok_or_else(|| SchedulingError::invalid("total duration overflows"))?;
        }

        debug!("Aggregated {} services into {} minutes", seen.len(), total);
        Ok(total)
    }
}
