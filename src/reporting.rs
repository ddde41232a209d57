//! Report assembly and terminal rendering.
//!
//! [`AnalysisReport::build`] runs the whole comparison pipeline over already
//! aggregated months; the `Display` impl renders the monthly table, per-plan
//! annual summaries, and the load-shift scenario.

use std::fmt;

use crate::billing::annual::AnnualSummary;
use crate::billing::plan::{RatePlan, FEE_CATEGORIES};
use crate::billing::shift::{self, DemandReductionPolicy, ShiftReport};
use crate::billing::types::{BillBreakdown, MonthlyAggregate};

/// One month of the plan-comparison table, flattened for export.
#[derive(Debug, Clone)]
pub struct ComparisonRow {
    pub year: i32,
    pub month: u32,
    pub total_kwh: f64,
    pub peak_kwh: f64,
    pub off_peak_kwh: f64,
    pub max_demand_kw: f64,
    pub load_factor: f64,
    pub tiered_total: f64,
    pub tou_demand_total: f64,
    pub tou_energy_only_total: f64,
    /// Name of the cheapest plan this month.
    pub cheapest_plan: String,
    pub shifted_tou_demand_total: f64,
    /// TOU-demand savings from the shift this month.
    pub shift_savings: f64,
}

/// Per-plan monthly bills plus the annual roll-up.
#[derive(Debug)]
pub struct PlanResults {
    pub name: String,
    pub bills: Vec<BillBreakdown>,
    pub annual: AnnualSummary,
}

impl PlanResults {
    fn price(plan: &dyn RatePlan, aggregates: &[MonthlyAggregate]) -> Self {
        let bills: Vec<BillBreakdown> =
            aggregates.iter().map(|a| plan.price_month(a)).collect();
        let annual = AnnualSummary::from_bills(&bills);
        Self {
            name: plan.name().to_string(),
            bills,
            annual,
        }
    }
}

/// The complete comparison: every plan priced over every month, plus the
/// load-shift counterfactual against the TOU-demand plan.
#[derive(Debug)]
pub struct AnalysisReport {
    pub tiered: PlanResults,
    pub tou_demand: PlanResults,
    pub tou_energy_only: PlanResults,
    pub rows: Vec<ComparisonRow>,
    pub shift: ShiftReport,
}

impl AnalysisReport {
    /// Prices every month under all three plans and runs the shift scenario.
    ///
    /// The shift counterfactual is evaluated against the TOU-demand plan,
    /// where both the energy move and the demand reduction pay off.
    pub fn build(
        aggregates: &[MonthlyAggregate],
        tiered: &dyn RatePlan,
        tou_demand: &dyn RatePlan,
        tou_energy_only: &dyn RatePlan,
        shift_fraction: f64,
        policy: DemandReductionPolicy,
    ) -> Self {
        let tiered = PlanResults::price(tiered, aggregates);
        let tou_demand_results = PlanResults::price(tou_demand, aggregates);
        let tou_energy_only = PlanResults::price(tou_energy_only, aggregates);
        let shift = shift::simulate_year(aggregates, tou_demand, shift_fraction, policy);

        let rows = aggregates
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let candidates = [
                    (&tiered.name, tiered.bills[i].total_bill),
                    (&tou_demand_results.name, tou_demand_results.bills[i].total_bill),
                    (&tou_energy_only.name, tou_energy_only.bills[i].total_bill),
                ];
                let cheapest = candidates
                    .iter()
                    .min_by(|x, y| x.1.total_cmp(&y.1))
                    .map(|(name, _)| (*name).clone())
                    .unwrap_or_default();
                ComparisonRow {
                    year: a.year,
                    month: a.month,
                    total_kwh: a.total_kwh,
                    peak_kwh: a.peak_kwh,
                    off_peak_kwh: a.off_peak_kwh,
                    max_demand_kw: a.peak_demand_kw,
                    load_factor: a.load_factor,
                    tiered_total: tiered.bills[i].total_bill,
                    tou_demand_total: tou_demand_results.bills[i].total_bill,
                    tou_energy_only_total: tou_energy_only.bills[i].total_bill,
                    cheapest_plan: cheapest,
                    shifted_tou_demand_total: shift.months[i].shifted.total_bill,
                    shift_savings: shift.months[i].savings,
                }
            })
            .collect();

        Self {
            tiered,
            tou_demand: tou_demand_results,
            tou_energy_only,
            rows,
            shift,
        }
    }

    /// Annual total of the cheapest plan.
    pub fn cheapest_annual(&self) -> (&str, f64) {
        let candidates = [
            (self.tiered.name.as_str(), self.tiered.annual.total_bill),
            (self.tou_demand.name.as_str(), self.tou_demand.annual.total_bill),
            (
                self.tou_energy_only.name.as_str(),
                self.tou_energy_only.annual.total_bill,
            ),
        ];
        candidates
            .into_iter()
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .unwrap_or(("", 0.0))
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Monthly Comparison ---")?;
        writeln!(
            f,
            "{:<8} {:>10} {:>9} {:>8} {:>12} {:>12} {:>12}  {}",
            "month", "kWh", "peak kWh", "kW", self.tiered.name, self.tou_demand.name,
            self.tou_energy_only.name, "cheapest"
        )?;
        for r in &self.rows {
            writeln!(
                f,
                "{:<8} {:>10.1} {:>9.1} {:>8.2} {:>12.2} {:>12.2} {:>12.2}  {}",
                format!("{}-{:02}", r.year, r.month),
                r.total_kwh,
                r.peak_kwh,
                r.max_demand_kw,
                r.tiered_total,
                r.tou_demand_total,
                r.tou_energy_only_total,
                r.cheapest_plan,
            )?;
        }

        let any_fees = [&self.tiered, &self.tou_demand, &self.tou_energy_only]
            .iter()
            .any(|p| p.annual.total_fee_amount != 0.0);
        for plan in [&self.tiered, &self.tou_demand, &self.tou_energy_only] {
            writeln!(f, "\n--- Annual: {} ---", plan.name)?;
            writeln!(f, "{}", plan.annual)?;
        }
        if any_fees {
            writeln!(f, "\nfee amounts bundle: {}", FEE_CATEGORIES.join(", "))?;
        }

        let (best, total) = self.cheapest_annual();
        writeln!(f, "\ncheapest plan overall: {best} (${total:.2}/yr)")?;

        writeln!(
            f,
            "\n--- Load Shift ({:.0}% of peak energy, {}) ---",
            self.shift.shift_fraction * 100.0,
            self.tou_demand.name
        )?;
        writeln!(f, "shifted energy:  {:.1} kWh", self.shift.total_shifted_kwh)?;
        writeln!(f, "baseline total:  ${:.2}", self.shift.baseline_total)?;
        writeln!(f, "shifted total:   ${:.2}", self.shift.shifted_total)?;
        write!(
            f,
            "savings:         ${:.2} ({:.1}%)",
            self.shift.savings, self.shift.savings_percent
        )
    }
}
