//! Time utilities: uptime and UTC day windows

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use std::time::{Duration, Instant};

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Midnight UTC at the start of `now`'s day
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

/// `[start of yesterday, start of today)` in UTC
pub fn yesterday_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = start_of_day(now);
    let yesterday = today
        .checked_sub_days(Days::new(1))
        .unwrap_or(today);
    (yesterday, today)
}

/// Time from `now` until the next `hour:00` UTC (a full day if it is exactly now)
pub fn until_next_hour(now: DateTime<Utc>, hour: u32) -> Duration {
    let today = start_of_day(now);
    let target = today + chrono::Duration::hours(i64::from(hour.min(23)));
    let next = if target > now {
        target
    } else {
        target + chrono::Duration::days(1)
    };
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn yesterday_is_half_open_day() {
        let (from, to) = yesterday_window(at("2026-03-01T13:45:10Z"));
        assert_eq!(from, at("2026-02-28T00:00:00Z"));
        assert_eq!(to, at("2026-03-01T00:00:00Z"));
    }

    #[test]
    fn next_digest_hour() {
        let now = at("2026-10-19T04:30:00Z");
        assert_eq!(until_next_hour(now, 6), Duration::from_secs(90 * 60));
        assert_eq!(until_next_hour(now, 4), Duration::from_secs(23 * 3600 + 30 * 60));
        assert_eq!(until_next_hour(at("2026-10-19T06:00:00Z"), 6), Duration::from_secs(24 * 3600));
    }
}
