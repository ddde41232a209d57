//! Calendar-rule classification of hourly readings into tariff periods.
//!
//! The rules are fixed properties of the tariff family, not configuration:
//! peak hours are 2:00 PM up to but excluding 7:00 PM on summer weekdays,
//! with Independence Day and Labor Day always off-peak.

use chrono::{Datelike, NaiveDate, Weekday};

use super::types::{ClassifiedReading, HourlyReading, Season};

/// First month of the summer season (June).
const SUMMER_START_MONTH: u32 = 6;
/// Last month of the summer season (September).
const SUMMER_END_MONTH: u32 = 9;
/// Peak window start hour, inclusive (2 PM).
const PEAK_START_HOUR: u32 = 14;
/// Peak window end hour, exclusive (7 PM).
const PEAK_END_HOUR: u32 = 19;

/// Tags every reading with its season and peak/off-peak status.
///
/// Pure function over in-memory readings; input order is preserved.
pub fn classify(readings: &[HourlyReading]) -> Vec<ClassifiedReading> {
    readings
        .iter()
        .map(|r| ClassifiedReading {
            is_peak: is_peak_hour(r),
            season: Season::of_month(r.month()),
            reading: r.clone(),
        })
        .collect()
}

/// True iff the reading falls in the contractual peak window: a summer
/// weekday between 2 PM and 7 PM that is not a recognized holiday.
pub fn is_peak_hour(reading: &HourlyReading) -> bool {
    let month = reading.month();
    if !(SUMMER_START_MONTH..=SUMMER_END_MONTH).contains(&month) {
        return false;
    }
    // Monday = 0 .. Friday = 4
    if reading.weekday_index() > 4 {
        return false;
    }
    if !(PEAK_START_HOUR..PEAK_END_HOUR).contains(&reading.hour_of_day()) {
        return false;
    }
    // Holiday check only runs for in-window readings.
    !is_holiday(reading.date())
}

/// Recognized holidays: Independence Day and Labor Day.
pub fn is_holiday(date: NaiveDate) -> bool {
    if date.month() == 7 && date.day() == 4 {
        return true;
    }
    if date.month() == 9 && Some(date) == labor_day(date.year()) {
        return true;
    }
    false
}

/// Labor Day for a year: the first Monday of September, found by scanning
/// September 1 through 7.
pub fn labor_day(year: i32) -> Option<NaiveDate> {
    (1..=7)
        .filter_map(|day| NaiveDate::from_ymd_opt(year, 9, day))
        .find(|d| d.weekday() == Weekday::Mon)
}
