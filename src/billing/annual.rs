//! Annual roll-up across a plan's monthly bills.

use std::fmt;

use super::types::BillBreakdown;

/// Totals and averages over one plan's sequence of monthly bills.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualSummary {
    pub months: usize,
    pub total_bill: f64,
    pub total_kwh: f64,
    pub total_peak_kwh: f64,
    pub total_off_peak_kwh: f64,
    pub total_demand_charges: f64,
    pub total_fee_amount: f64,
    /// 0.0 when there are no months.
    pub average_monthly_bill: f64,
    /// `total_bill / total_kwh`; 0.0 on zero usage.
    pub average_rate_per_kwh: f64,
}

impl AnnualSummary {
    /// Rolls up a sequence of monthly bills. All divisions are zero-guarded.
    pub fn from_bills(bills: &[BillBreakdown]) -> Self {
        let months = bills.len();
        let total_bill: f64 = bills.iter().map(|b| b.total_bill).sum();
        let total_kwh: f64 = bills.iter().map(|b| b.total_kwh).sum();
        let total_peak_kwh: f64 = bills.iter().map(|b| b.peak_kwh).sum();
        let total_off_peak_kwh: f64 = bills.iter().map(|b| b.off_peak_kwh).sum();
        let total_demand_charges: f64 = bills.iter().map(|b| b.demand_charge).sum();
        let total_fee_amount: f64 = bills.iter().map(|b| b.fee_amount).sum();
        let average_monthly_bill = if months > 0 {
            total_bill / months as f64
        } else {
            0.0
        };
        let average_rate_per_kwh = if total_kwh > 0.0 {
            total_bill / total_kwh
        } else {
            0.0
        };
        Self {
            months,
            total_bill,
            total_kwh,
            total_peak_kwh,
            total_off_peak_kwh,
            total_demand_charges,
            total_fee_amount,
            average_monthly_bill,
            average_rate_per_kwh,
        }
    }
}

impl fmt::Display for AnnualSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "months:          {}", self.months)?;
        writeln!(f, "total usage:     {:.1} kWh", self.total_kwh)?;
        writeln!(f, "total bill:      ${:.2}", self.total_bill)?;
        writeln!(f, "avg monthly:     ${:.2}", self.average_monthly_bill)?;
        writeln!(f, "avg rate:        ${:.4}/kWh", self.average_rate_per_kwh)?;
        writeln!(f, "demand charges:  ${:.2}", self.total_demand_charges)?;
        write!(f, "fees:            ${:.2}", self.total_fee_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::plan::{RatePlan, TouDemandPlan};
    use crate::billing::types::MonthlyAggregate;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn bill(total: f64, kwh: f64, demand_charge: f64) -> BillBreakdown {
        BillBreakdown {
            plan: "test".to_string(),
            year: 2025,
            month: 1,
            basic_charge: 10.0,
            energy_components: Vec::new(),
            energy_charge: total - 10.0 - demand_charge,
            demand_charge,
            subtotal: total,
            fee_amount: 0.0,
            total_bill: total,
            total_kwh: kwh,
            peak_kwh: kwh * 0.2,
            off_peak_kwh: kwh * 0.8,
            max_demand_kw: 5.0,
            days_in_month: 31,
            avg_rate_per_kwh: if kwh > 0.0 { total / kwh } else { 0.0 },
        }
    }

    #[test]
    fn sums_and_averages() {
        let summary = AnnualSummary::from_bills(&[
            bill(100.0, 800.0, 20.0),
            bill(150.0, 1200.0, 30.0),
        ]);
        assert_eq!(summary.months, 2);
        assert_abs_diff_eq!(summary.total_bill, 250.0, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.total_kwh, 2000.0, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.average_monthly_bill, 125.0, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.average_rate_per_kwh, 0.125, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.total_demand_charges, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_bills_yield_zeroes_not_nan() {
        let summary = AnnualSummary::from_bills(&[]);
        assert_eq!(summary.months, 0);
        assert_eq!(summary.average_monthly_bill, 0.0);
        assert_eq!(summary.average_rate_per_kwh, 0.0);
    }

    #[test]
    fn roll_up_matches_plan_output() {
        let plan = TouDemandPlan::new("TOU-RD", 0.4603, 0.142986, 0.015288, 12.21, 1.137);
        let aggregates: Vec<MonthlyAggregate> = (6..=8)
            .map(|m| MonthlyAggregate {
                year: 2025,
                month: m,
                total_kwh: 1000.0,
                peak_kwh: 250.0,
                off_peak_kwh: 750.0,
                peak_demand_kw: 4.0,
                peak_demand_at: NaiveDate::from_ymd_opt(2025, m, 1)
                    .and_then(|d| d.and_hms_opt(15, 0, 0))
                    .expect("valid timestamp"),
                days_in_month: 30,
                hours_recorded: 720,
                load_factor: 0.3,
            })
            .collect();
        let bills: Vec<BillBreakdown> = aggregates.iter().map(|a| plan.price_month(a)).collect();
        let summary = AnnualSummary::from_bills(&bills);
        let expected: f64 = bills.iter().map(|b| b.total_bill).sum();
        assert_abs_diff_eq!(summary.total_bill, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.total_kwh, 3000.0, epsilon = 1e-12);
    }

    #[test]
    fn display_does_not_panic() {
        let summary = AnnualSummary::from_bills(&[bill(100.0, 800.0, 20.0)]);
        assert!(!format!("{summary}").is_empty());
    }
}
