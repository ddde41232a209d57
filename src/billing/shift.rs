//! Load-shifting simulation: counterfactual bills under peak-to-off-peak
//! energy redistribution.

use super::plan::RatePlan;
use super::types::{BillBreakdown, MonthlyAggregate};

/// How shifting affects the monthly peak demand. Several heuristics are
/// defensible, so the choice is one explicit parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DemandReductionPolicy {
    /// Reduce demand by `shift_fraction * 0.5`: assume only half of the
    /// shifted energy came from the demand-setting hour.
    ProportionalToShift,
    /// Reduce demand by an independently configured fraction in [0, 1].
    Fixed(f64),
    /// Leave demand untouched (the natural choice for plans that never
    /// bill it).
    Unchanged,
}

impl DemandReductionPolicy {
    fn reduced_demand(self, demand_kw: f64, shift_fraction: f64) -> f64 {
        match self {
            Self::ProportionalToShift => demand_kw * (1.0 - shift_fraction * 0.5),
            Self::Fixed(reduction_fraction) => demand_kw * (1.0 - reduction_fraction),
            Self::Unchanged => demand_kw,
        }
    }
}

/// Baseline and counterfactual bills for one month.
#[derive(Debug, Clone)]
pub struct ShiftOutcome {
    pub baseline: BillBreakdown,
    pub shifted: BillBreakdown,
    /// Peak kWh moved to off-peak this month.
    pub shifted_kwh: f64,
    /// `baseline.total_bill - shifted.total_bill`; negative means the shift
    /// cost money.
    pub savings: f64,
}

/// Year-level shifting scenario across a sequence of months.
#[derive(Debug, Clone)]
pub struct ShiftReport {
    pub shift_fraction: f64,
    pub policy: DemandReductionPolicy,
    pub months: Vec<ShiftOutcome>,
    pub total_shifted_kwh: f64,
    pub baseline_total: f64,
    pub shifted_total: f64,
    pub savings: f64,
    /// Savings over the baseline total, in percent; 0.0 on a zero baseline.
    pub savings_percent: f64,
}

/// Prices one month as-is and under the shifted counterfactual.
///
/// Energy is conserved exactly: `shift_fraction` of the peak kWh moves to
/// off-peak and the total never changes. The input aggregate is not mutated.
pub fn simulate_month(
    aggregate: &MonthlyAggregate,
    plan: &dyn RatePlan,
    shift_fraction: f64,
    policy: DemandReductionPolicy,
) -> ShiftOutcome {
    let baseline = plan.price_month(aggregate);

    let shifted_kwh = aggregate.peak_kwh * shift_fraction;
    let mut perturbed = aggregate.clone();
    perturbed.peak_kwh = aggregate.peak_kwh - shifted_kwh;
    perturbed.off_peak_kwh = aggregate.off_peak_kwh + shifted_kwh;
    perturbed.peak_demand_kw = policy.reduced_demand(aggregate.peak_demand_kw, shift_fraction);
    perturbed.load_factor = if perturbed.peak_demand_kw > 0.0 && perturbed.hours_recorded > 0 {
        (perturbed.total_kwh / perturbed.hours_recorded as f64) / perturbed.peak_demand_kw
    } else {
        0.0
    };

    let shifted = plan.price_month(&perturbed);
    let savings = baseline.total_bill - shifted.total_bill;
    ShiftOutcome {
        baseline,
        shifted,
        shifted_kwh,
        savings,
    }
}

/// Runs [`simulate_month`] over every aggregate and rolls the results up.
pub fn simulate_year(
    aggregates: &[MonthlyAggregate],
    plan: &dyn RatePlan,
    shift_fraction: f64,
    policy: DemandReductionPolicy,
) -> ShiftReport {
    let months: Vec<ShiftOutcome> = aggregates
        .iter()
        .map(|a| simulate_month(a, plan, shift_fraction, policy))
        .collect();

    let total_shifted_kwh = months.iter().map(|m| m.shifted_kwh).sum();
    let baseline_total: f64 = months.iter().map(|m| m.baseline.total_bill).sum();
    let shifted_total: f64 = months.iter().map(|m| m.shifted.total_bill).sum();
    let savings = baseline_total - shifted_total;
    let savings_percent = if baseline_total > 0.0 {
        savings / baseline_total * 100.0
    } else {
        0.0
    };

    ShiftReport {
        shift_fraction,
        policy,
        months,
        total_shifted_kwh,
        baseline_total,
        shifted_total,
        savings,
        savings_percent,
    }
}
