//! CSV export for the monthly plan-comparison table.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::reporting::ComparisonRow;

/// Schema v1 column header for the comparison export.
const HEADER: &str = "year,month,total_kwh,peak_kwh,off_peak_kwh,max_demand_kw,\
                       load_factor,tiered_total,tou_demand_total,tou_energy_only_total,\
                       cheapest_plan,shifted_tou_demand_total,shift_savings";

/// Exports the monthly comparison to a CSV file at the given path.
///
/// Writes a header row followed by one data row per month. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(rows: &[ComparisonRow], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(rows, buf)
}

/// Writes the monthly comparison as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(rows: &[ComparisonRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    // Header
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    // Data rows
    for r in rows {
        wtr.write_record(&[
            r.year.to_string(),
            r.month.to_string(),
            format!("{:.3}", r.total_kwh),
            format!("{:.3}", r.peak_kwh),
            format!("{:.3}", r.off_peak_kwh),
            format!("{:.3}", r.max_demand_kw),
            format!("{:.4}", r.load_factor),
            format!("{:.2}", r.tiered_total),
            format!("{:.2}", r.tou_demand_total),
            format!("{:.2}", r.tou_energy_only_total),
            r.cheapest_plan.clone(),
            format!("{:.2}", r.shifted_tou_demand_total),
            format!("{:.2}", r.shift_savings),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(month: u32) -> ComparisonRow {
        ComparisonRow {
            year: 2025,
            month,
            total_kwh: 1200.0 + month as f64,
            peak_kwh: 300.0,
            off_peak_kwh: 900.0 + month as f64,
            max_demand_kw: 6.5,
            load_factor: 0.31,
            tiered_total: 170.25,
            tou_demand_total: 155.40,
            tou_energy_only_total: 188.10,
            cheapest_plan: "TOU-RD-11".to_string(),
            shifted_tou_demand_total: 140.02,
            shift_savings: 15.38,
        }
    }

    #[test]
    fn header_matches_schema_v1() {
        let rows = vec![make_row(6)];
        let mut buf = Vec::new();
        write_csv(&rows, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "year,month,total_kwh,peak_kwh,off_peak_kwh,max_demand_kw,\
             load_factor,tiered_total,tou_demand_total,tou_energy_only_total,\
             cheapest_plan,shifted_tou_demand_total,shift_savings"
        );
    }

    #[test]
    fn row_count_matches_month_count() {
        let rows: Vec<ComparisonRow> = (1..=12).map(make_row).collect();
        let mut buf = Vec::new();
        write_csv(&rows, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        // 1 header + 12 data rows
        assert_eq!(lines.len(), 13);
    }

    #[test]
    fn deterministic_output() {
        let rows: Vec<ComparisonRow> = (6..=9).map(make_row).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_csv(&rows, &mut buf1).ok();
        write_csv(&rows, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn round_trip_parseable() {
        let rows: Vec<ComparisonRow> = (6..=8).map(make_row).collect();
        let mut buf = Vec::new();
        write_csv(&rows, &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(13));

        let mut row_count = 0;
        for record in rdr.records() {
            let rec = record.ok();
            assert!(rec.is_some(), "every row should parse");
            let rec = rec.as_ref();
            // Numeric columns parse as f64; column 10 is the plan name.
            for i in (0..13).filter(|i| *i != 10) {
                let val: Result<f64, _> = rec.unwrap()[i].parse();
                assert!(val.is_ok(), "column {i} should parse as f64");
            }
            row_count += 1;
        }
        assert_eq!(row_count, 3);
    }
}
