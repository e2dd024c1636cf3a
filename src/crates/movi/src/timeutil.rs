//! Time-of-day helpers for the `HH:MM` columns
//!
//! Trips, shifts and routes all store times of day as `HH:MM` TEXT;
//! availability windows are computed here so every caller applies the
//! same 90-minute rule.

use chrono::{Duration, NaiveTime};

/// Assignment conflict window in minutes
///
/// A driver or vehicle with another trip scheduled within this window of
/// the target trip is considered unavailable.
pub const CONFLICT_WINDOW_MINUTES: i64 = 90;

/// Parse an `HH:MM` string
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Absolute distance between two `HH:MM` strings, in minutes
pub fn minutes_apart(a: &str, b: &str) -> Option<i64> {
    let a = parse_hhmm(a)?;
    let b = parse_hhmm(b)?;
    Some((a - b).num_minutes().abs())
}

/// Whether two `HH:MM` times fall within the conflict window
pub fn within_conflict_window(a: &str, b: &str) -> bool {
    minutes_apart(a, b)
        .map(|minutes| minutes < CONFLICT_WINDOW_MINUTES)
        .unwrap_or(false)
}

/// Whether a shift (`start`..`end`) covers a time of day
pub fn shift_covers(start: &str, end: &str, at: &str) -> bool {
    match (parse_hhmm(start), parse_hhmm(end), parse_hhmm(at)) {
        (Some(start), Some(end), Some(at)) => start <= at && at <= end,
        _ => false,
    }
}

/// Add minutes to an `HH:MM` string, wrapping within the day
pub fn add_minutes(value: &str, minutes: i64) -> Option<String> {
    let time = parse_hhmm(value)?;
    let shifted = time.overflowing_add_signed(Duration::minutes(minutes)).0;
    Some(shifted.format("%H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_apart() {
        assert_eq!(minutes_apart("09:00", "09:15"), Some(15));
        assert_eq!(minutes_apart("09:15", "09:00"), Some(15));
        assert_eq!(minutes_apart("bogus", "09:00"), None);
    }

    #[test]
    fn test_conflict_window_is_exclusive_at_the_edge() {
        assert!(within_conflict_window("09:00", "10:29"));
        assert!(!within_conflict_window("09:00", "10:30"));
    }

    #[test]
    fn test_shift_covers() {
        assert!(shift_covers("06:00", "14:00", "09:15"));
        assert!(!shift_covers("12:00", "22:00", "09:15"));
        assert!(shift_covers("06:00", "14:00", "14:00"));
    }

    #[test]
    fn test_add_minutes_wraps() {
        assert_eq!(add_minutes("09:00", 30).as_deref(), Some("09:30"));
        assert_eq!(add_minutes("23:45", 30).as_deref(), Some("00:15"));
    }
}
