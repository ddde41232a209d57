//! Rate calibration: solving unpublished tier rates from one verified bill.
//!
//! When published tier rates disagree with a real bill (bundled surcharges
//! hidden inside the printed numbers), the tariff's own formula can be run
//! backward from a single known (usage, cost, billing-days) triple to recover
//! the missing top-tier rate.

use std::fmt;

use super::plan::TieredPlan;

/// Knobs for the back-substitution. The basic-charge share is a curve fit
/// from one observed bill, not a derived law, so it is explicit and
/// overridable rather than baked in.
#[derive(Debug, Clone)]
pub struct CalibrationSettings {
    /// Fraction of the anchor's total cost attributed to the basic charge.
    pub basic_share: f64,
    /// Known (published or previously calibrated) tier-1 rate.
    pub tier1_rate: f64,
    /// Known tier-2 rate.
    pub tier2_rate: f64,
    /// Upper kWh bounds of tiers 1 and 2.
    pub tier_bounds: [f64; 2],
    /// Absolute dollar tolerance for accepting the calibration.
    pub tolerance_dollars: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            basic_share: 0.15,
            tier1_rate: 0.1394,
            tier2_rate: 0.1658,
            tier_bounds: [650.0, 1000.0],
            tolerance_dollars: 0.50,
        }
    }
}

/// One verified historical bill used as the calibration anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorBill {
    pub usage_kwh: f64,
    pub total_cost: f64,
    pub billing_days: u32,
}

/// Why a calibration could not be derived at all. Distinct from an
/// out-of-tolerance result, which is reported, not raised.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// The anchor usage never reaches tier 3, so there is no tier-3 energy
    /// to solve against.
    UsageBelowTopTier { usage_kwh: f64, bound_kwh: f64 },
    /// Anchor cost or billing days are not positive.
    DegenerateAnchor,
    /// Basic share must leave some cost for energy charges.
    BasicShareOutOfRange { basic_share: f64 },
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsageBelowTopTier {
                usage_kwh,
                bound_kwh,
            } => write!(
                f,
                "anchor usage {usage_kwh:.1} kWh does not exceed the top tier bound \
                 {bound_kwh:.0} kWh; no tier-3 rate to solve for"
            ),
            Self::DegenerateAnchor => {
                write!(f, "anchor bill must have positive cost and billing days")
            }
            Self::BasicShareOutOfRange { basic_share } => {
                write!(f, "basic share {basic_share} must lie in [0, 1)")
            }
        }
    }
}

/// Result of repricing the anchor with the derived rates.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationCheck {
    pub computed_total: f64,
    pub actual_total: f64,
    pub absolute_error: f64,
    /// False means the derived rates are unreliable; callers decide whether
    /// to proceed.
    pub within_tolerance: bool,
}

/// Tier rates recovered from an anchor bill, plus everything needed to
/// validate them and to seed a [`TieredPlan`].
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedRates {
    pub basic_daily_charge: f64,
    pub tier1_rate: f64,
    pub tier2_rate: f64,
    pub tier3_rate: f64,
    pub tier_bounds: [f64; 2],
    pub tolerance_dollars: f64,
    anchor: AnchorBill,
}

/// Derives the unknown tier-3 rate from the anchor bill.
///
/// Assumes `basic_share` of the anchor cost is the basic charge, subtracts it
/// to get the energy-charge total, then solves
/// `t1_kwh*r1 + t2_kwh*r2 + t3_kwh*r3 = energy_total` for `r3`.
///
/// # Errors
///
/// Returns a [`CalibrationError`] when the anchor cannot support the
/// derivation at all; a merely inaccurate result is reported through
/// [`CalibratedRates::validate`] instead.
pub fn calibrate(
    settings: &CalibrationSettings,
    anchor: AnchorBill,
) -> Result<CalibratedRates, CalibrationError> {
    if anchor.total_cost <= 0.0 || anchor.billing_days == 0 {
        return Err(CalibrationError::DegenerateAnchor);
    }
    if !(0.0..1.0).contains(&settings.basic_share) {
        return Err(CalibrationError::BasicShareOutOfRange {
            basic_share: settings.basic_share,
        });
    }
    let [bound1, bound2] = settings.tier_bounds;
    if anchor.usage_kwh <= bound2 {
        return Err(CalibrationError::UsageBelowTopTier {
            usage_kwh: anchor.usage_kwh,
            bound_kwh: bound2,
        });
    }

    let basic_total = anchor.total_cost * settings.basic_share;
    let energy_total = anchor.total_cost - basic_total;

    let tier1_kwh = bound1;
    let tier2_kwh = bound2 - bound1;
    let tier3_kwh = anchor.usage_kwh - bound2;

    let tier3_cost =
        energy_total - tier1_kwh * settings.tier1_rate - tier2_kwh * settings.tier2_rate;
    let tier3_rate = tier3_cost / tier3_kwh;

    Ok(CalibratedRates {
        basic_daily_charge: basic_total / f64::from(anchor.billing_days),
        tier1_rate: settings.tier1_rate,
        tier2_rate: settings.tier2_rate,
        tier3_rate,
        tier_bounds: settings.tier_bounds,
        tolerance_dollars: settings.tolerance_dollars,
        anchor,
    })
}

impl CalibratedRates {
    /// Reprices a summer bill with the derived rates and compares it to a
    /// known cost. Out-of-tolerance is a reported state, never an error.
    pub fn validate(&self, usage_kwh: f64, actual_cost: f64) -> CalibrationCheck {
        let computed_total =
            self.basic_daily_charge * f64::from(self.anchor.billing_days) + self.summer_energy(usage_kwh);
        let absolute_error = (computed_total - actual_cost).abs();
        CalibrationCheck {
            computed_total,
            actual_total: actual_cost,
            absolute_error,
            within_tolerance: absolute_error <= self.tolerance_dollars,
        }
    }

    /// Validates the derived rates against the anchor bill itself.
    pub fn check_anchor(&self) -> CalibrationCheck {
        self.validate(self.anchor.usage_kwh, self.anchor.total_cost)
    }

    /// Seeds a tiered plan with the calibrated summer rates. The winter rate
    /// is not derivable from a summer anchor and must be supplied.
    pub fn into_plan(&self, name: impl Into<String>, winter_rate: f64) -> TieredPlan {
        TieredPlan::new(
            name,
            self.basic_daily_charge,
            winter_rate,
            [self.tier1_rate, self.tier2_rate, self.tier3_rate],
            self.tier_bounds,
            1.0,
        )
    }

    fn summer_energy(&self, usage_kwh: f64) -> f64 {
        let [bound1, bound2] = self.tier_bounds;
        let tier1 = usage_kwh.min(bound1);
        let tier2 = (usage_kwh - bound1).clamp(0.0, bound2 - bound1);
        let tier3 = (usage_kwh - bound2).max(0.0);
        tier1 * self.tier1_rate + tier2 * self.tier2_rate + tier3 * self.tier3_rate
    }
}
