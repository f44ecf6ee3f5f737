//! Pay and attendance arithmetic shared by the claim dialog and the tracker.

use chrono::{DateTime, Utc};
use crate::{CoreError, CoreResult};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Fractional hours between two instants, millisecond precision.
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scheduled length of a shift. Rejects empty or inverted windows.
pub fn scheduled_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<f64> {
    if end <= start {
        return Err(CoreError::ValidationError(format!(
            "shift ends ({}) before it starts ({})",
            end.to_rfc3339(),
            start.to_rfc3339()
        )));
    }
    Ok(hours_between(start, end))
}

/// `hourly_rate * hours`, rounded for display.
pub fn shift_pay(hourly_rate: f64, start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<f64> {
    if hourly_rate < 0.0 || !hourly_rate.is_finite() {
        return Err(CoreError::ValidationError(format!("invalid hourly rate: {}", hourly_rate)));
    }
    let hours = scheduled_hours(start, end)?;
    Ok(round2(hourly_rate * hours))
}

/// Hours worked between check-in and check-out, to two decimals.
pub fn elapsed_hours(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> CoreResult<f64> {
    if check_out < check_in {
        return Err(CoreError::ValidationError(
            "check-out is earlier than check-in".to_string(),
        ));
    }
    Ok(round2(hours_between(check_in, check_out)))
}

pub fn format_gbp(amount: f64) -> String {
    format!("£{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, h, m, s).unwrap()
    }

    #[test]
    fn test_day_shift_pay() {
        let pay = shift_pay(15.0, at(9, 0, 0), at(17, 0, 0)).unwrap();
        assert_eq!(pay, 120.0);
        assert_eq!(format_gbp(pay), "£120.00");
    }

    #[test]
    fn test_partial_hour_pay() {
        // 7h45m at £12.50
        let pay = shift_pay(12.5, at(18, 0, 0), at(23, 45, 0) + chrono::Duration::hours(2)).unwrap();
        assert_eq!(pay, 96.88);
        assert_eq!(format_gbp(pay), "£96.88");
    }

    #[test]
    fn test_overnight_shift() {
        let start = Utc.with_ymd_and_hms(2025, 3, 14, 22, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 15, 4, 0, 0).unwrap();
        assert_eq!(scheduled_hours(start, end).unwrap(), 6.0);
    }

    #[test]
    fn test_inverted_window_rejected() {
        assert!(shift_pay(15.0, at(17, 0, 0), at(9, 0, 0)).is_err());
        assert!(shift_pay(15.0, at(9, 0, 0), at(9, 0, 0)).is_err());
        assert!(shift_pay(-1.0, at(9, 0, 0), at(17, 0, 0)).is_err());
    }

    #[test]
    fn test_elapsed_hours() {
        assert_eq!(elapsed_hours(at(20, 0, 0), at(23, 30, 0)).unwrap(), 3.5);
        // 1h 20m = 1.333.. -> 1.33
        assert_eq!(elapsed_hours(at(20, 0, 0), at(21, 20, 0)).unwrap(), 1.33);
        assert_eq!(elapsed_hours(at(20, 0, 0), at(20, 0, 0)).unwrap(), 0.0);
        assert!(elapsed_hours(at(21, 0, 0), at(20, 0, 0)).is_err());
    }
}
