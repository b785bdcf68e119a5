//! Date conversion utilities for occurrence filtering.

use crate::constants::calendar::DAYS_IN_MONTH;
use crate::constants::occurrence::{DAYS_PER_WEEK, WEEKS_PER_YEAR, YEAR_START_DAY};
use chrono::{Datelike, NaiveDate};

/// Convert month/day to a `BirdNET` week number (1-48).
///
/// `BirdNET` uses 48 weeks per year, approximately 7.6 days each.
/// `Week = floor((day_of_year - 1) / 7.6) + 1`
///
/// # Limitations
///
/// - Assumes non-leap years (February = 28 days). For leap years, calculations
///   after February will be off by 1 day, resulting in ~0.13 week error.
///   This is acceptable given `BirdNET`'s approximate 48-week system.
/// - Does not validate month/day combinations (e.g., Feb 31 will produce
///   incorrect results).
pub fn date_to_week(month: u32, day: u32) -> u32 {
    let day_of_year: u32 = DAYS_IN_MONTH.iter().take((month - 1) as usize).sum::<u32>() + day;

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let week = ((day_of_year - 1) as f32 / DAYS_PER_WEEK).floor() as u32 + 1;

    week.min(WEEKS_PER_YEAR)
}

/// Convert a calendar date to a `BirdNET` week number (1-48).
pub fn week_from_date(date: NaiveDate) -> u32 {
    date_to_week(date.month(), date.day())
}

/// Convert day of year (1-365) to (month, day).
pub fn day_of_year_to_date(day_of_year: u32) -> (u32, u32) {
    let mut remaining = day_of_year;
    for (month_idx, &days_in_month) in DAYS_IN_MONTH.iter().enumerate() {
        if remaining <= days_in_month {
            #[allow(clippy::cast_possible_truncation)]
            return ((month_idx + 1) as u32, remaining);
        }
        remaining -= days_in_month;
    }

    // If we overflow, return Dec 31
    (12, 31)
}

/// Convert a `BirdNET` week number (1-48) to an approximate (month, day).
///
/// Week 1 = Jan 1 (day 1), week 48 = Dec 24 (day 358).
pub fn week_to_date(week: u32) -> (u32, u32) {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let day_of_year = ((week - 1) as f32).mul_add(DAYS_PER_WEEK, YEAR_START_DAY) as u32;
    day_of_year_to_date(day_of_year)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_date_to_week_jan_1() {
        assert_eq!(date_to_week(1, 1), 1);
    }

    #[test]
    fn test_date_to_week_dec_31() {
        assert_eq!(date_to_week(12, 31), 48);
    }

    #[test]
    fn test_date_to_week_jun_15() {
        // June 15 is day 166 of year
        // (166 - 1) / 7.6 = 21.71 -> floor = 21, + 1 = 22
        assert_eq!(date_to_week(6, 15), 22);
    }

    #[test]
    fn test_week_from_date_matches_month_day() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(week_from_date(date), date_to_week(6, 15));
    }

    #[test]
    fn test_week_to_date_week_1() {
        assert_eq!(week_to_date(1), (1, 1));
    }

    #[test]
    fn test_week_to_date_week_48() {
        // Week 48 = day 358 -> Dec 24
        assert_eq!(week_to_date(48), (12, 24));
    }

    #[test]
    fn test_day_of_year_to_date_overflow() {
        // Day 400 should return Dec 31 (overflow protection)
        assert_eq!(day_of_year_to_date(400), (12, 31));
    }
}
