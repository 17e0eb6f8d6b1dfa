//! Day selection and session time slots.
//!
//! A session is due when the ISO weekday number (Monday = 1) is at most
//! `days_per_week` and the day of the month is a multiple of
//! `7 / times_per_day`. So `days_per_week = 3` always means Monday to
//! Wednesday, and spacing within the month is uneven when `times_per_day`
//! does not divide 7.

use crate::Recurrence;
use chrono::{Datelike, NaiveDate};

/// Day-of-month divisor for a recurrence (never zero)
pub fn interval(recurrence: Recurrence) -> u32 {
    if recurrence.times_per_day == 0 {
        1
    } else {
        (7 / recurrence.times_per_day).max(1)
    }
}

/// Whether a session of an exercise with `recurrence` falls on `date`
pub fn is_due(date: NaiveDate, recurrence: Recurrence) -> bool {
    let day_of_week = date.weekday().number_from_monday();
    let is_training_day = day_of_week <= recurrence.days_per_week;
    is_training_day && date.day() % interval(recurrence) == 0
}

/// Format a time `offset_minutes` after `start_hour:00` as `HH:MM`
///
/// Hours are not wrapped at midnight: 9:00 + 15h is `24:00`.
pub fn slot_time(start_hour: u32, offset_minutes: u32) -> String {
    format!(
        "{:02}:{:02}",
        start_hour + offset_minutes / 60,
        offset_minutes % 60
    )
}

/// Check a `HH:MM` session time (hours may exceed 23, minutes may not)
pub fn is_valid_slot_time(time: &str) -> bool {
    match time.split_once(':') {
        Some((hours, minutes)) => {
            hours.len() >= 2
                && hours.bytes().all(|b| b.is_ascii_digit())
                && minutes.len() == 2
                && minutes.bytes().all(|b| b.is_ascii_digit())
                && minutes.parse::<u32>().map(|m| m < 60).unwrap_or(false)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn days(start: NaiveDate, count: i64) -> impl Iterator<Item = NaiveDate> {
        (0..count).map(move |i| start + Duration::days(i))
    }

    #[test]
    fn test_every_day_due_at_seven_by_seven() {
        let r = Recurrence::new(7, 7);
        assert_eq!(interval(r), 1);
        assert!(days(date(2024, 1, 1), 366).all(|d| is_due(d, r)));
    }

    #[test]
    fn test_one_by_three_only_mon_to_wed_on_multiples_of_seven() {
        let r = Recurrence::new(1, 3);
        for d in days(date(2024, 1, 1), 366) {
            let expected = d.weekday().number_from_monday() <= 3 && d.day() % 7 == 0;
            assert_eq!(is_due(d, r), expected, "{}", d);
        }
        // 2024-02-07 is a Wednesday, 2024-01-07 a Sunday
        assert!(is_due(date(2024, 2, 7), r));
        assert!(!is_due(date(2024, 1, 7), r));
    }

    #[test]
    fn test_days_per_week_is_a_weekday_ceiling() {
        let r = Recurrence::new(7, 3);
        for d in days(date(2024, 3, 4), 7) {
            let due = is_due(d, r);
            match d.weekday() {
                Weekday::Mon | Weekday::Tue | Weekday::Wed => assert!(due),
                _ => assert!(!due),
            }
        }
    }

    #[test]
    fn test_zero_days_per_week_never_due() {
        let r = Recurrence::new(7, 0);
        assert!(days(date(2024, 1, 1), 60).all(|d| !is_due(d, r)));
    }

    #[test]
    fn test_interval_uses_integer_division() {
        assert_eq!(interval(Recurrence::new(1, 7)), 7);
        assert_eq!(interval(Recurrence::new(2, 7)), 3);
        assert_eq!(interval(Recurrence::new(3, 7)), 2);
        assert_eq!(interval(Recurrence::new(4, 7)), 1);
        assert_eq!(interval(Recurrence::new(5, 7)), 1);
        assert_eq!(interval(Recurrence::new(0, 7)), 1);
        assert_eq!(interval(Recurrence::new(8, 7)), 1);
    }

    #[test]
    fn test_is_due_is_deterministic() {
        let r = Recurrence::new(2, 5);
        for d in days(date(2025, 6, 1), 90) {
            assert_eq!(is_due(d, r), is_due(d, r));
        }
    }

    #[test]
    fn test_slot_time_formatting() {
        assert_eq!(slot_time(9, 0), "09:00");
        assert_eq!(slot_time(9, 30), "09:30");
        assert_eq!(slot_time(9, 90), "10:30");
        assert_eq!(slot_time(9, 15 * 60), "24:00");
        assert_eq!(slot_time(9, 100 * 30), "59:00");
    }

    #[test]
    fn test_slot_time_validation() {
        assert!(is_valid_slot_time("09:30"));
        assert!(is_valid_slot_time("24:00"));
        assert!(!is_valid_slot_time("9:30"));
        assert!(!is_valid_slot_time("09:60"));
        assert!(!is_valid_slot_time("09-30"));
        assert!(!is_valid_slot_time("ab:cd"));
    }
}
