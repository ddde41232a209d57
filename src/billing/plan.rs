//! Rate plan family: flat-tiered, TOU with demand, and TOU energy-only.
//!
//! Every plan is an immutable bundle of construction-time rates exposing one
//! capability, [`RatePlan::price_month`], so callers can run a set of plans
//! against the same aggregate without branching on concrete type.

use super::types::{BillBreakdown, EnergyCharge, MonthlyAggregate, Season};

/// Surcharge categories bundled into the fee multiplier. Named for display
/// only; the uplift is applied as a single factor, never itemized per
/// category.
pub const FEE_CATEGORIES: [&str; 4] = [
    "Environmental Compliance Cost Recovery",
    "Demand Side Management Residential Schedule",
    "Fuel Cost Recovery",
    "Municipal Franchise Fee",
];

/// The one behavior surface all plans share.
pub trait RatePlan {
    /// Plan label used in breakdowns and reports.
    fn name(&self) -> &str;

    /// Prices one month. Idempotent: identical aggregates yield bit-identical
    /// breakdowns.
    fn price_month(&self, aggregate: &MonthlyAggregate) -> BillBreakdown;
}

/// Splits total usage across inclining blocks bounded at `bounds[0]` and
/// `bounds[1]` kWh. Lower tiers fill to their full allotment before any kWh
/// lands in the next one.
fn tier_split(usage_kwh: f64, bounds: [f64; 2]) -> [f64; 3] {
    let tier1 = usage_kwh.min(bounds[0]);
    let tier2 = (usage_kwh - bounds[0]).clamp(0.0, bounds[1] - bounds[0]);
    let tier3 = (usage_kwh - bounds[1]).max(0.0);
    [tier1, tier2, tier3]
}

fn finish_breakdown(
    plan: &str,
    aggregate: &MonthlyAggregate,
    basic_charge: f64,
    energy_components: Vec<EnergyCharge>,
    demand_charge: f64,
    fee_multiplier: f64,
) -> BillBreakdown {
    let energy_charge: f64 = energy_components.iter().map(|c| c.amount).sum();
    let subtotal = basic_charge + energy_charge + demand_charge;
    let fee_amount = subtotal * (fee_multiplier - 1.0);
    let total_bill = subtotal + fee_amount;
    let avg_rate_per_kwh = if aggregate.total_kwh > 0.0 {
        total_bill / aggregate.total_kwh
    } else {
        0.0
    };
    BillBreakdown {
        plan: plan.to_string(),
        year: aggregate.year,
        month: aggregate.month,
        basic_charge,
        energy_components,
        energy_charge,
        demand_charge,
        subtotal,
        fee_amount,
        total_bill,
        total_kwh: aggregate.total_kwh,
        peak_kwh: aggregate.peak_kwh,
        off_peak_kwh: aggregate.off_peak_kwh,
        max_demand_kw: aggregate.peak_demand_kw,
        days_in_month: aggregate.days_in_month,
        avg_rate_per_kwh,
    }
}

/// Season-dependent flat-tiered plan (R-30 style): one rate for all winter
/// usage, inclining blocks in summer.
#[derive(Debug, Clone)]
pub struct TieredPlan {
    name: String,
    basic_daily_charge: f64,
    winter_rate: f64,
    /// Summer block rates, lowest tier first.
    tier_rates: [f64; 3],
    /// Upper kWh bounds of tiers 1 and 2.
    tier_bounds: [f64; 2],
    fee_multiplier: f64,
}

impl TieredPlan {
    pub fn new(
        name: impl Into<String>,
        basic_daily_charge: f64,
        winter_rate: f64,
        tier_rates: [f64; 3],
        tier_bounds: [f64; 2],
        fee_multiplier: f64,
    ) -> Self {
        Self {
            name: name.into(),
            basic_daily_charge,
            winter_rate,
            tier_rates,
            tier_bounds,
            fee_multiplier,
        }
    }
}

impl RatePlan for TieredPlan {
    fn name(&self) -> &str {
        &self.name
    }

    fn price_month(&self, aggregate: &MonthlyAggregate) -> BillBreakdown {
        let basic_charge = self.basic_daily_charge * f64::from(aggregate.days_in_month);
        let components = match aggregate.season() {
            Season::Winter => vec![EnergyCharge::new(
                "winter",
                aggregate.total_kwh,
                self.winter_rate,
            )],
            Season::Summer => {
                let split = tier_split(aggregate.total_kwh, self.tier_bounds);
                vec![
                    EnergyCharge::new("tier 1", split[0], self.tier_rates[0]),
                    EnergyCharge::new("tier 2", split[1], self.tier_rates[1]),
                    EnergyCharge::new("tier 3", split[2], self.tier_rates[2]),
                ]
            }
        };
        finish_breakdown(
            &self.name,
            aggregate,
            basic_charge,
            components,
            0.0,
            self.fee_multiplier,
        )
    }
}

/// Time-of-use plan with a demand charge (TOU-RD style). Demand bills on the
/// single highest hourly reading of the month, wherever it occurred.
#[derive(Debug, Clone)]
pub struct TouDemandPlan {
    name: String,
    basic_daily_charge: f64,
    on_peak_rate: f64,
    off_peak_rate: f64,
    demand_rate: f64,
    fee_multiplier: f64,
}

impl TouDemandPlan {
    pub fn new(
        name: impl Into<String>,
        basic_daily_charge: f64,
        on_peak_rate: f64,
        off_peak_rate: f64,
        demand_rate: f64,
        fee_multiplier: f64,
    ) -> Self {
        Self {
            name: name.into(),
            basic_daily_charge,
            on_peak_rate,
            off_peak_rate,
            demand_rate,
            fee_multiplier,
        }
    }
}

impl RatePlan for TouDemandPlan {
    fn name(&self) -> &str {
        &self.name
    }

    fn price_month(&self, aggregate: &MonthlyAggregate) -> BillBreakdown {
        let basic_charge = self.basic_daily_charge * f64::from(aggregate.days_in_month);
        let components = vec![
            EnergyCharge::new("on-peak", aggregate.peak_kwh, self.on_peak_rate),
            EnergyCharge::new("off-peak", aggregate.off_peak_kwh, self.off_peak_rate),
        ];
        let demand_charge = aggregate.peak_demand_kw * self.demand_rate;
        finish_breakdown(
            &self.name,
            aggregate,
            basic_charge,
            components,
            demand_charge,
            self.fee_multiplier,
        )
    }
}

/// Time-of-use plan without a demand charge (TOU-REO style, "nights and
/// weekends"). The monthly peak demand is echoed in the breakdown for
/// transparency but never priced.
#[derive(Debug, Clone)]
pub struct TouEnergyOnlyPlan {
    name: String,
    basic_daily_charge: f64,
    on_peak_rate: f64,
    off_peak_rate: f64,
    fee_multiplier: f64,
}

impl TouEnergyOnlyPlan {
    pub fn new(
        name: impl Into<String>,
        basic_daily_charge: f64,
        on_peak_rate: f64,
        off_peak_rate: f64,
        fee_multiplier: f64,
    ) -> Self {
        Self {
            name: name.into(),
            basic_daily_charge,
            on_peak_rate,
            off_peak_rate,
            fee_multiplier,
        }
    }
}

impl RatePlan for TouEnergyOnlyPlan {
    fn name(&self) -> &str {
        &self.name
    }

    fn price_month(&self, aggregate: &MonthlyAggregate) -> BillBreakdown {
        let basic_charge = self.basic_daily_charge * f64::from(aggregate.days_in_month);
        let components = vec![
            EnergyCharge::new("on-peak", aggregate.peak_kwh, self.on_peak_rate),
            EnergyCharge::new("off-peak", aggregate.off_peak_kwh, self.off_peak_rate),
        ];
        finish_breakdown(
            &self.name,
            aggregate,
            basic_charge,
            components,
            0.0,
            self.fee_multiplier,
        )
    }
}
