use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use shared_utils::time::{local_instant, MINUTES_PER_DAY};

use crate::models::{TimeOfDay, WorkingWindow};

/// Enumerates start times on a fixed grid anchored at each window's start.
#[derive(Debug, Clone, Copy)]
pub struct SlotGenerator {
    granularity_minutes: u32,
}

impl SlotGenerator {
    pub fn new(granularity_minutes: u32) -> Self {
        Self {
            granularity_minutes: granularity_minutes.max(1),
        }
    }

    /// Every start `s` such that `[s, s + duration)` sits inside one enabled window for
    /// `date`'s weekday. Windows are never merged. Sorted ascending, no duplicates.
    pub fn generate(&self, date: NaiveDate, windows: &[WorkingWindow], duration_minutes: u32) -> Vec<TimeOfDay> {
        if duration_minutes == 0 {
            return Vec::new();
        }

        let mut candidates = BTreeSet::new();

        for window in usable_windows(date, windows) {
            let end = window.end.minutes();
            let mut start = window.start.minutes();

            while start.checked_add(duration_minutes).is_some_and(|finish| finish <= end) {
                if let Some(candidate) = TimeOfDay::from_minutes(start) {
                    candidates.insert(candidate);
                }
                start += self.granularity_minutes;
            }
        }

        debug!(
            "Generated {} candidates for {} ({} min, {} min grid)",
            candidates.len(),
            date,
            duration_minutes,
            self.granularity_minutes
        );

        candidates.into_iter().collect()
    }

    /// Whether `start` is one of the candidates [`generate`](Self::generate) would emit,
    /// checked directly against the windows.
    pub fn fits(&self, date: NaiveDate, windows: &[WorkingWindow], start: TimeOfDay, duration_minutes: u32) -> bool {
        if duration_minutes == 0 {
            return false;
        }

        let start = start.minutes();
        usable_windows(date, windows).any(|window| {
            let window_start = window.start.minutes();
            start >= window_start
                && (start - window_start) % self.granularity_minutes == 0
                && start
                    .checked_add(duration_minutes)
                    .is_some_and(|finish| finish <= window.end.minutes())
        })
    }
}

fn usable_windows<'a>(date: NaiveDate, windows: &'a [WorkingWindow]) -> impl Iterator<Item = &'a WorkingWindow> {
    let weekday = date.weekday();
    windows
        .iter()
        .filter(move |w| w.enabled && w.weekday == weekday && w.start < w.end)
}

/// A grid start pinned to real instants in the business timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub start: TimeOfDay,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl Candidate {
    /// `None` when the wall-clock start does not exist on `date` (DST gap).
    pub fn materialize(tz: Tz, date: NaiveDate, start: TimeOfDay, duration_minutes: u32) -> Option<Self> {
        let starts_at = local_instant(tz, date, start.minutes())?;
        Some(Self {
            start,
            starts_at,
            ends_at: starts_at + Duration::minutes(i64::from(duration_minutes)),
        })
    }

    /// Whether the real interval ends inside a window that contains the start.
    ///
    /// Grid fit is decided on the wall clock; across a spring-forward gap the same
    /// number of minutes ends later on the wall than it started plus its duration.
    pub fn within(&self, tz: Tz, date: NaiveDate, windows: &[WorkingWindow]) -> bool {
        usable_windows(date, windows).any(|window| {
            window.start <= self.start
                && self.start < window.end
                && window_close(tz, date, window.end).is_some_and(|close| self.ends_at <= close)
        })
    }
}

// A closing time inside a DST gap never happens; the window closes where the gap begins.
fn window_close(tz: Tz, date: NaiveDate, end: TimeOfDay) -> Option<DateTime<Utc>> {
    (end.minutes()..=MINUTES_PER_DAY).find_map(|minute| local_instant(tz, date, minute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use uuid::Uuid;

    // 2026-03-02 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn t(h: u32, m: u32) -> TimeOfDay {
        TimeOfDay::from_hm(h, m).unwrap()
    }

    fn window(weekday: Weekday, start: TimeOfDay, end: TimeOfDay) -> WorkingWindow {
        WorkingWindow::new(Uuid::nil(), None, weekday, start, end).unwrap()
    }

    #[test]
    fn test_grid_stops_when_duration_no_longer_fits() {
        let generator = SlotGenerator::new(15);
        let slots = generator.generate(monday(), &[window(Weekday::Mon, t(9, 0), t(10, 0))], 30);
        assert_eq!(slots, vec![t(9, 0), t(9, 15), t(9, 30)]);
    }

    #[test]
    fn test_split_shift_windows_are_not_merged() {
        let generator = SlotGenerator::new(30);
        let windows = vec![
            window(Weekday::Mon, t(14, 0), t(15, 0)),
            window(Weekday::Mon, t(9, 0), t(10, 0)),
        ];

        // 90 minutes would fit 09:00-15:00 if the gap were ignored
        assert!(generator.generate(monday(), &windows, 90).is_empty());

        let slots = generator.generate(monday(), &windows, 60);
        assert_eq!(slots, vec![t(9, 0), t(14, 0)]);
    }

    #[test]
    fn test_disabled_and_other_weekday_windows_ignored() {
        let generator = SlotGenerator::new(15);
        let windows = vec![
            window(Weekday::Mon, t(9, 0), t(10, 0)).disabled(),
            window(Weekday::Tue, t(9, 0), t(10, 0)),
        ];
        assert!(generator.generate(monday(), &windows, 15).is_empty());
    }

    #[test]
    fn test_overlapping_windows_deduplicated() {
        let generator = SlotGenerator::new(15);
        let windows = vec![
            window(Weekday::Mon, t(9, 0), t(10, 0)),
            window(Weekday::Mon, t(9, 30), t(10, 30)),
        ];
        let slots = generator.generate(monday(), &windows, 30);
        assert_eq!(slots, vec![t(9, 0), t(9, 15), t(9, 30), t(9, 45), t(10, 0)]);
    }

    #[test]
    fn test_window_closing_at_midnight() {
        let generator = SlotGenerator::new(30);
        let slots = generator.generate(monday(), &[window(Weekday::Mon, t(23, 0), TimeOfDay::END_OF_DAY)], 30);
        assert_eq!(slots, vec![t(23, 0), t(23, 30)]);
    }

    #[test]
    fn test_fits_requires_grid_alignment() {
        let generator = SlotGenerator::new(15);
        let windows = vec![window(Weekday::Mon, t(9, 0), t(12, 0))];

        assert!(generator.fits(monday(), &windows, t(11, 0), 60));
        assert!(!generator.fits(monday(), &windows, t(11, 15), 60));
        assert!(!generator.fits(monday(), &windows, t(9, 10), 30));
        assert!(!generator.fits(monday(), &windows, t(8, 45), 30));
    }

    #[test]
    fn test_huge_duration_never_fits() {
        let generator = SlotGenerator::new(15);
        let windows = vec![window(Weekday::Mon, t(9, 0), t(12, 0))];

        assert!(generator.generate(monday(), &windows, u32::MAX - 1).is_empty());
        assert!(!generator.fits(monday(), &windows, t(9, 0), u32::MAX - 1));
    }

    #[test]
    fn test_interval_across_spring_forward_must_end_by_window_close() {
        let tz = chrono_tz::America::New_York;
        // clocks jump from 02:00 to 03:00 on Sunday 2026-03-08
        let sunday = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let windows = vec![window(Weekday::Sun, t(1, 0), t(4, 0))];

        let late = Candidate::materialize(tz, sunday, t(1, 30), 120).unwrap();
        assert_eq!(late.ends_at.with_timezone(&tz).to_rfc3339(), "2026-03-08T04:30:00-04:00");
        assert!(!late.within(tz, sunday, &windows));

        let exact = Candidate::materialize(tz, sunday, t(1, 0), 120).unwrap();
        assert_eq!(exact.ends_at.with_timezone(&tz).to_rfc3339(), "2026-03-08T04:00:00-04:00");
        assert!(exact.within(tz, sunday, &windows));
    }

    #[test]
    fn test_window_closing_inside_the_gap() {
        let tz = chrono_tz::America::New_York;
        let sunday = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let windows = vec![window(Weekday::Sun, t(1, 0), t(2, 30))];

        // 01:00 EST + 60 min is 03:00 EDT, the instant the gap ends
        let candidate = Candidate::materialize(tz, sunday, t(1, 0), 60).unwrap();
        assert!(candidate.within(tz, sunday, &windows));

        let longer = Candidate::materialize(tz, sunday, t(1, 0), 75).unwrap();
        assert!(!longer.within(tz, sunday, &windows));
    }

    #[test]
    fn test_candidate_materialization() {
        let candidate = Candidate::materialize(chrono_tz::America::Sao_Paulo, monday(), t(9, 0), 45).unwrap();
        assert_eq!(candidate.starts_at.to_rfc3339(), "2026-03-02T12:00:00+00:00");
        assert_eq!((candidate.ends_at - candidate.starts_at).num_minutes(), 45);
    }
}
