//! Local calendar conversions
//!
//! Stored instants are UTC; everything user-facing (report dates,
//! filter bounds, the artifact filename) is on the Africa/Cairo
//! calendar, DST handled by the tz database.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Africa::Cairo;
use chrono_tz::Tz;

pub const LOCAL_TZ: Tz = Cairo;

/// Convert a stored UTC instant to local time
pub fn utc_to_local(utc: DateTime<Utc>) -> DateTime<Tz> {
    utc.with_timezone(&LOCAL_TZ)
}

/// Current local time (filename timestamps)
pub fn now_local() -> DateTime<Tz> {
    Utc::now().with_timezone(&LOCAL_TZ)
}

/// Today's date on the local calendar
pub fn today_local() -> NaiveDate {
    now_local().date_naive()
}

/// Start of the given local day (00:00:00) as a UTC instant
pub fn day_start_utc(date: NaiveDate) -> DateTime<Utc> {
    local_to_utc(date.and_time(NaiveTime::MIN))
}

/// End of the given local day (23:59:59) as a UTC instant
pub fn day_end_utc(date: NaiveDate) -> DateTime<Utc> {
    let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    local_to_utc(date.and_time(end))
}

fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match LOCAL_TZ.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        // DST fold: take the earlier instant
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        // DST gap: the wall-clock time does not exist locally
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_cover_the_whole_local_day() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 3).unwrap();
        let start = day_start_utc(date);
        let end = day_end_utc(date);

        assert!(start < end);
        assert_eq!(utc_to_local(start).date_naive(), date);
        assert_eq!(utc_to_local(end).date_naive(), date);
        // 23:59:59 minus 00:00:00
        assert_eq!((end - start).num_seconds(), 86_399);
    }

    #[test]
    fn winter_day_start_is_utc_plus_two() {
        // Egypt is UTC+2 outside DST, so the local day starts at 22:00
        // UTC the previous evening.
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let start = day_start_utc(date);
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2025, 1, 14).unwrap());
        assert_eq!(start.time(), NaiveTime::from_hms_opt(22, 0, 0).unwrap());
    }
}
