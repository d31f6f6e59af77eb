//! Small helpers shared by the services: byte sizes, float truncation, time
//! bounds and the common location/environment/age filter.

pub mod bytesize;
pub mod filter;

use chrono::{DateTime, Duration, Utc};

pub use filter::{FilterQuery, GlobalFilter};

/// Truncates toward zero, keeping two decimals.
pub fn truncate_float64(f: f64) -> f64 {
    (f * 100.0).trunc() / 100.0
}

/// Upper bound used when no `older-than` is given.
pub fn max_time() -> DateTime<Utc> {
    DateTime::<Utc>::MAX_UTC
}

/// Lower bound used when no `newer-than` is given.
pub fn min_time() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

/// Midnight (UTC) of the day `t` falls in.
pub fn truncate_to_day(t: DateTime<Utc>) -> DateTime<Utc> {
    let secs = t.timestamp().rem_euclid(86_400);
    t - Duration::seconds(secs) - Duration::nanoseconds(t.timestamp_subsec_nanos() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn truncate_keeps_two_decimals() {
        assert_eq!(truncate_float64(31.4159), 31.41);
        assert_eq!(truncate_float64(99.999), 99.99);
        assert_eq!(truncate_float64(-1.239), -1.23);
    }

    #[test]
    fn truncate_to_day_drops_time_of_day() {
        let t = Utc.with_ymd_and_hms(2020, 5, 6, 17, 45, 3).unwrap() + Duration::milliseconds(250);
        assert_eq!(truncate_to_day(t), Utc.with_ymd_and_hms(2020, 5, 6, 0, 0, 0).unwrap());
    }
}
