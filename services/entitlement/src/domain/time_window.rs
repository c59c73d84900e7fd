//! Calendar-day and countdown predicates.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Whether `a` and `b` fall on the same calendar day in the server's local zone.
///
/// Day boundaries follow the server time zone (and its DST rules), not the
/// user's.
pub fn is_same_calendar_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    is_same_calendar_day_in(a, b, &Local)
}

/// Whether `a` and `b` fall on the same calendar day in `tz`.
pub fn is_same_calendar_day_in<Tz: TimeZone>(a: DateTime<Utc>, b: DateTime<Utc>, tz: &Tz) -> bool {
    a.with_timezone(tz).date_naive() == b.with_timezone(tz).date_naive()
}

/// Whole seconds from `now` until `instant`, never negative.
///
/// A partial second rounds up so an instant still in the future never reports 0.
pub fn seconds_until(instant: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (instant - now).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis as u64).div_ceil(1000)
}
