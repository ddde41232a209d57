//! Shared helpers for integration tests: a deterministic synthetic year of
//! hourly readings with a realistic seasonal and daily shape.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use tariff_sim::billing::types::HourlyReading;

/// Hourly kWh for a given timestamp. Smooth, strictly positive, and higher
/// on summer afternoons so every summer month has a well-defined peak window.
pub fn load_shape(ts: NaiveDateTime) -> f64 {
    let hour = ts.hour() as f64;
    let month = ts.month() as f64;
    // Daily curve peaking around 16:00.
    let daily = 1.0 + 0.8 * (std::f64::consts::PI * (hour - 4.0) / 24.0).sin().max(0.0);
    // Seasonal multiplier peaking in July.
    let seasonal = 1.0 + 0.5 * (std::f64::consts::PI * (month - 1.0) / 12.0).sin();
    daily * seasonal
}

/// One full calendar year of hourly readings, in timestamp order.
pub fn synthetic_year(year: i32) -> Vec<HourlyReading> {
    let mut readings = Vec::with_capacity(8784);
    let start = NaiveDate::from_ymd_opt(year, 1, 1).expect("valid start date");
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1).expect("valid end date");
    let mut day = start;
    while day < end {
        for hour in 0..24 {
            let ts = day.and_hms_opt(hour, 0, 0).expect("valid hour");
            readings.push(HourlyReading::new(ts, load_shape(ts)));
        }
        day = day.succ_opt().expect("next day exists");
    }
    readings
}

/// A single summer month of hourly readings.
pub fn synthetic_month(year: i32, month: u32) -> Vec<HourlyReading> {
    synthetic_year(year)
        .into_iter()
        .filter(|r| r.month() == month)
        .collect()
}
