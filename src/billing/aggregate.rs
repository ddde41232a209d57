//! Monthly aggregation of classified readings.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use super::types::{ClassifiedReading, MonthlyAggregate, days_in_month};

struct MonthBucket {
    total_kwh: f64,
    peak_kwh: f64,
    max_kwh: f64,
    max_at: NaiveDateTime,
    hours: usize,
}

/// Groups classified readings by (year, month) and computes usage and demand
/// totals per group, ordered ascending by (year, month).
///
/// The input need not be sorted; ascending timestamp order is established
/// here so that demand ties resolve to the earliest hour. Months with no
/// readings simply do not appear in the output.
pub fn aggregate(readings: &[ClassifiedReading]) -> Vec<MonthlyAggregate> {
    let mut ordered: Vec<&ClassifiedReading> = readings.iter().collect();
    ordered.sort_by_key(|c| c.reading.timestamp);

    let mut buckets: BTreeMap<(i32, u32), MonthBucket> = BTreeMap::new();
    for c in ordered {
        let r = &c.reading;
        let bucket = buckets
            .entry((r.year(), r.month()))
            .or_insert_with(|| MonthBucket {
                total_kwh: 0.0,
                peak_kwh: 0.0,
                max_kwh: r.energy_kwh,
                max_at: r.timestamp,
                hours: 0,
            });
        bucket.total_kwh += r.energy_kwh;
        if c.is_peak {
            bucket.peak_kwh += r.energy_kwh;
        }
        // Strict comparison keeps the earliest timestamp on ties.
        if r.energy_kwh > bucket.max_kwh {
            bucket.max_kwh = r.energy_kwh;
            bucket.max_at = r.timestamp;
        }
        bucket.hours += 1;
    }

    buckets
        .into_iter()
        .map(|((year, month), b)| {
            let mean_kwh = if b.hours > 0 {
                b.total_kwh / b.hours as f64
            } else {
                0.0
            };
            let load_factor = if b.max_kwh > 0.0 {
                mean_kwh / b.max_kwh
            } else {
                0.0
            };
            MonthlyAggregate {
                year,
                month,
                total_kwh: b.total_kwh,
                peak_kwh: b.peak_kwh,
                off_peak_kwh: b.total_kwh - b.peak_kwh,
                peak_demand_kw: b.max_kwh,
                peak_demand_at: b.max_at,
                days_in_month: days_in_month(year, month),
                hours_recorded: b.hours,
                load_factor,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::classifier::classify;
    use crate::billing::types::HourlyReading;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn reading(y: i32, m: u32, d: u32, h: u32, kwh: f64) -> HourlyReading {
        let ts = NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .expect("valid test timestamp");
        HourlyReading::new(ts, kwh)
    }

    #[test]
    fn groups_by_year_month_ascending() {
        let readings = classify(&[
            reading(2025, 1, 5, 10, 1.0),
            reading(2024, 12, 5, 10, 2.0),
            reading(2024, 6, 5, 10, 3.0),
        ]);
        let months = aggregate(&readings);
        let keys: Vec<(i32, u32)> = months.iter().map(|m| (m.year, m.month)).collect();
        assert_eq!(keys, vec![(2024, 6), (2024, 12), (2025, 1)]);
    }

    #[test]
    fn peak_plus_off_peak_equals_total() {
        // 2024-07-03 Wednesday: 15h is peak, 03h is not
        let readings = classify(&[
            reading(2024, 7, 3, 15, 2.5),
            reading(2024, 7, 3, 3, 1.0),
            reading(2024, 7, 6, 15, 4.0), // Saturday, off-peak
        ]);
        let months = aggregate(&readings);
        assert_eq!(months.len(), 1);
        let m = &months[0];
        assert_abs_diff_eq!(m.peak_kwh + m.off_peak_kwh, m.total_kwh, epsilon = 1e-9);
        assert_abs_diff_eq!(m.peak_kwh, 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(m.total_kwh, 7.5, epsilon = 1e-9);
    }

    #[test]
    fn peak_demand_is_single_largest_hour() {
        let readings = classify(&[
            reading(2024, 7, 1, 1, 1.0),
            reading(2024, 7, 2, 9, 5.5),
            reading(2024, 7, 3, 23, 3.0),
        ]);
        let m = &aggregate(&readings)[0];
        assert_abs_diff_eq!(m.peak_demand_kw, 5.5, epsilon = 1e-12);
        assert_eq!(
            m.peak_demand_at,
            NaiveDate::from_ymd_opt(2024, 7, 2)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .expect("valid timestamp")
        );
    }

    #[test]
    fn demand_ties_break_to_earliest_hour() {
        // Deliberately unsorted input; the aggregator sorts first.
        let readings = classify(&[
            reading(2024, 7, 20, 12, 4.0),
            reading(2024, 7, 2, 8, 4.0),
            reading(2024, 7, 10, 12, 4.0),
        ]);
        let m = &aggregate(&readings)[0];
        assert_eq!(
            m.peak_demand_at,
            NaiveDate::from_ymd_opt(2024, 7, 2)
                .and_then(|d| d.and_hms_opt(8, 0, 0))
                .expect("valid timestamp")
        );
    }

    #[test]
    fn days_in_month_is_calendar_not_observed() {
        let readings = classify(&[reading(2024, 2, 1, 0, 1.0)]);
        let m = &aggregate(&readings)[0];
        assert_eq!(m.days_in_month, 29);
        let readings = classify(&[reading(2025, 2, 1, 0, 1.0)]);
        assert_eq!(aggregate(&readings)[0].days_in_month, 28);
    }

    #[test]
    fn load_factor_is_mean_over_peak() {
        let readings = classify(&[
            reading(2024, 3, 1, 0, 1.0),
            reading(2024, 3, 1, 1, 2.0),
            reading(2024, 3, 1, 2, 3.0),
        ]);
        let m = &aggregate(&readings)[0];
        assert_abs_diff_eq!(m.load_factor, 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_demand_yields_zero_load_factor() {
        let readings = classify(&[reading(2024, 3, 1, 0, 0.0), reading(2024, 3, 1, 1, 0.0)]);
        let m = &aggregate(&readings)[0];
        assert_eq!(m.peak_demand_kw, 0.0);
        assert_eq!(m.load_factor, 0.0);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn absent_months_are_omitted() {
        let readings = classify(&[reading(2024, 1, 1, 0, 1.0), reading(2024, 3, 1, 0, 1.0)]);
        let months = aggregate(&readings);
        assert_eq!(months.len(), 2);
        assert!(!months.iter().any(|m| m.month == 2));
    }
}
