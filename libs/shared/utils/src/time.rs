//! Conversions between business-local wall-clock values and UTC instants.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Wall-clock `date` + `minute_of_day` in `tz`, as an instant.
///
/// `minute_of_day` may be 1440 (midnight closing the day). Ambiguous wall-clock times
/// (DST fall-back) resolve to the earlier instant; times inside a DST gap do not exist
/// and yield `None`.
pub fn local_instant(tz: Tz, date: NaiveDate, minute_of_day: u32) -> Option<DateTime<Utc>> {
    let naive = local_naive(date, minute_of_day)?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

fn local_naive(date: NaiveDate, minute_of_day: u32) -> Option<NaiveDateTime> {
    if minute_of_day > MINUTES_PER_DAY {
        return None;
    }
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| midnight + Duration::minutes(i64::from(minute_of_day)))
}

/// Calendar day of `now` as seen by the business.
pub fn local_date(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Half-open `[start, end)` instants covering the business-local calendar day `date`.
pub fn day_bounds(tz: Tz, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = first_instant_of(tz, date)?;
    let end = first_instant_of(tz, date.succ_opt()?)?;
    Some((start, end))
}

// Some zones skip local midnight on DST days; the day then starts at the first valid minute.
fn first_instant_of(tz: Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    (0..MINUTES_PER_DAY).find_map(|minute| local_instant(tz, date, minute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Sao_Paulo;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_local_instant_applies_offset() {
        // Sao Paulo is UTC-3 (no DST since 2019)
        let instant = local_instant(Sao_Paulo, date(2026, 3, 10), 9 * 60).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_local_instant_accepts_end_of_day() {
        let instant = local_instant(chrono_tz::UTC, date(2026, 3, 10), MINUTES_PER_DAY).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap());
        assert!(local_instant(chrono_tz::UTC, date(2026, 3, 10), MINUTES_PER_DAY + 1).is_none());
    }

    #[test]
    fn test_local_instant_in_dst_gap_is_none() {
        // 2026-03-08 02:30 does not exist in New York
        let gap = local_instant(chrono_tz::America::New_York, date(2026, 3, 8), 2 * 60 + 30);
        assert!(gap.is_none());
    }

    #[test]
    fn test_local_date_uses_business_zone() {
        // 01:00 UTC is still the previous evening in Sao Paulo
        let now = Utc.with_ymd_and_hms(2026, 3, 11, 1, 0, 0).unwrap();
        assert_eq!(local_date(Sao_Paulo, now), date(2026, 3, 10));
    }

    #[test]
    fn test_day_bounds_cover_local_day() {
        let (start, end) = day_bounds(Sao_Paulo, date(2026, 3, 10)).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 11, 3, 0, 0).unwrap());
    }
}
