use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use shared_utils::time::local_date;

use crate::services::slots::Candidate;

/// Drops starts that are no longer bookable relative to an injected `now`.
#[derive(Debug, Clone, Copy)]
pub struct PastTimeFilter {
    now: DateTime<Utc>,
    today: NaiveDate,
}

impl PastTimeFilter {
    pub fn new(timezone: Tz, now: DateTime<Utc>) -> Self {
        Self {
            now,
            today: local_date(timezone, now),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Future days are never elapsed; on today (and any earlier day) a start at or
    /// before `now` is.
    pub fn has_elapsed(&self, date: NaiveDate, candidate: &Candidate) -> bool {
        date <= self.today && candidate.starts_at <= self.now
    }

    pub fn apply(&self, date: NaiveDate, candidates: Vec<Candidate>) -> Vec<Candidate> {
        if date > self.today {
            return candidates;
        }

        let before = candidates.len();
        let remaining: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !self.has_elapsed(date, candidate))
            .collect();

        debug!(
            "Past-time filter removed {} of {} candidates on {} (now {})",
            before - remaining.len(),
            before,
            date,
            self.now
        );
        remaining
    }
}
