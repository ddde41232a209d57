//! Import-to-aggregate tests over an in-memory CSV in the utility's export
//! format, disclaimer preamble included.

mod common;

use std::fmt::Write as _;

use tariff_sim::billing::aggregate::aggregate;
use tariff_sim::billing::classifier::classify;
use tariff_sim::io::import::read_usage;

/// Renders readings back into the utility's CSV layout.
fn render_csv(readings: &[tariff_sim::billing::types::HourlyReading]) -> String {
    let mut out = String::from(
        "Data provided for informational purposes only.\n\
         Readings may be adjusted after publication.\n\
         Hour,kWh,Temp\n",
    );
    for r in readings {
        let _ = writeln!(
            out,
            "{},{:.4},",
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.energy_kwh
        );
    }
    out
}

#[test]
fn a_rendered_month_imports_losslessly() {
    let readings = common::synthetic_month(2025, 7);
    let csv = render_csv(&readings);
    let data = read_usage(csv.as_bytes()).expect("rendered CSV should import");
    assert_eq!(data.readings.len(), readings.len());
    assert_eq!(data.skipped_rows, 0);
    for (parsed, original) in data.readings.iter().zip(&readings) {
        assert_eq!(parsed.timestamp, original.timestamp);
        // Rendered at 4 decimal places.
        assert!((parsed.energy_kwh - original.energy_kwh).abs() < 5e-5);
    }
}

#[test]
fn imported_month_aggregates_like_the_source() {
    let readings = common::synthetic_month(2025, 7);
    let csv = render_csv(&readings);
    let data = read_usage(csv.as_bytes()).expect("rendered CSV should import");

    let from_import = aggregate(&classify(&data.readings));
    let from_source = aggregate(&classify(&readings));
    assert_eq!(from_import.len(), 1);
    assert_eq!(from_source.len(), 1);
    assert!((from_import[0].total_kwh - from_source[0].total_kwh).abs() < 0.05);
    assert_eq!(from_import[0].days_in_month, 31);
    assert_eq!(from_import[0].hours_recorded, 744);
}

#[test]
fn corrupt_rows_inside_a_real_month_are_dropped() {
    let readings = common::synthetic_month(2025, 6);
    let mut csv = render_csv(&readings);
    csv.push_str("2025-06-31 99:00:00,1.0,\n"); // impossible timestamp
    csv.push_str("2025-07-01 00:00:00,no data,\n");
    let data = read_usage(csv.as_bytes()).expect("file should still import");
    assert_eq!(data.readings.len(), readings.len());
    assert_eq!(data.skipped_rows, 2);
}
