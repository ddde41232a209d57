//! Core billing types: readings, monthly aggregates, and bill breakdowns.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// One hourly meter reading.
///
/// Created once per input row by the ingestion layer and immutable afterward.
/// Rows with unparseable or negative energy never become readings; they are
/// dropped during import, not zeroed.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyReading {
    /// Start of the metered hour.
    pub timestamp: NaiveDateTime,
    /// Energy consumed during the hour (kWh, >= 0).
    pub energy_kwh: f64,
    /// Ambient temperature if the export carried one.
    pub temperature: Option<f64>,
}

impl HourlyReading {
    pub fn new(timestamp: NaiveDateTime, energy_kwh: f64) -> Self {
        Self {
            timestamp,
            energy_kwh,
            temperature: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Hour of day in [0, 23].
    pub fn hour_of_day(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Weekday index with Monday = 0, Sunday = 6.
    pub fn weekday_index(&self) -> u32 {
        self.timestamp.weekday().num_days_from_monday()
    }

    /// Month in [1, 12].
    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }

    pub fn year(&self) -> i32 {
        self.timestamp.year()
    }
}

/// Tariff season. Summer is June through September; everything else is winter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Summer,
    Winter,
}

impl Season {
    /// Season for a calendar month in [1, 12].
    pub fn of_month(month: u32) -> Self {
        if (6..=9).contains(&month) {
            Self::Summer
        } else {
            Self::Winter
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summer => write!(f, "summer"),
            Self::Winter => write!(f, "winter"),
        }
    }
}

/// A reading tagged with its tariff period. Produced exclusively by the
/// period classifier and never mutated afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedReading {
    pub reading: HourlyReading,
    /// True only for summer weekday afternoons outside holidays.
    pub is_peak: bool,
    /// Season of the reading's month, independent of the holiday override.
    pub season: Season,
}

/// Usage and demand totals for one (year, month) group.
///
/// Built once per group and immutable; every rate plan prices from the same
/// aggregate. Months with no readings are never synthesized.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyAggregate {
    pub year: i32,
    /// Month in [1, 12].
    pub month: u32,
    /// Sum of all hourly energy in the month (kWh).
    pub total_kwh: f64,
    /// Sum of energy in peak-classified hours (kWh).
    pub peak_kwh: f64,
    /// `total_kwh - peak_kwh`.
    pub off_peak_kwh: f64,
    /// Largest single hourly reading of the month (kW). Demand is one hour,
    /// not a rolling window.
    pub peak_demand_kw: f64,
    /// Timestamp of the maximal reading; ties go to the earliest hour.
    pub peak_demand_at: NaiveDateTime,
    /// Calendar days in the month (leap-aware).
    pub days_in_month: u32,
    /// Number of readings that landed in this month.
    pub hours_recorded: usize,
    /// Mean hourly usage over peak demand; 0.0 when demand is zero.
    pub load_factor: f64,
}

impl MonthlyAggregate {
    /// Season implied by the aggregate's month.
    pub fn season(&self) -> Season {
        Season::of_month(self.month)
    }
}

/// One labelled component of an energy charge (a tier block or a TOU period).
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyCharge {
    pub label: &'static str,
    pub kwh: f64,
    pub rate: f64,
    pub amount: f64,
}

impl EnergyCharge {
    pub fn new(label: &'static str, kwh: f64, rate: f64) -> Self {
        Self {
            label,
            kwh,
            rate,
            amount: kwh * rate,
        }
    }
}

/// Priced result for one (plan, month) pair. Pure computation output with
/// the inputs echoed for traceability.
#[derive(Debug, Clone, PartialEq)]
pub struct BillBreakdown {
    pub plan: String,
    pub year: i32,
    pub month: u32,
    pub basic_charge: f64,
    /// Per-tier or per-period energy charges, in pricing order.
    pub energy_components: Vec<EnergyCharge>,
    /// Sum of the component amounts.
    pub energy_charge: f64,
    /// Zero for plans that never bill demand.
    pub demand_charge: f64,
    /// `basic + energy + demand`, before the fee uplift.
    pub subtotal: f64,
    /// `subtotal * (fee_multiplier - 1)`.
    pub fee_amount: f64,
    pub total_bill: f64,
    pub total_kwh: f64,
    pub peak_kwh: f64,
    pub off_peak_kwh: f64,
    /// Echoed even when the plan charges nothing for it.
    pub max_demand_kw: f64,
    pub days_in_month: u32,
    /// `total_bill / total_kwh`; 0.0 on zero usage.
    pub avg_rate_per_kwh: f64,
}

impl fmt::Display for BillBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}-{:02} ({} days, {:.1} kWh)",
            self.plan, self.year, self.month, self.days_in_month, self.total_kwh
        )?;
        writeln!(f, "  basic charge:  ${:.2}", self.basic_charge)?;
        for c in &self.energy_components {
            writeln!(
                f,
                "  {:<14} {:.2} kWh @ ${:.6}/kWh = ${:.2}",
                format!("{}:", c.label),
                c.kwh,
                c.rate,
                c.amount
            )?;
        }
        writeln!(f, "  demand charge: ${:.2}", self.demand_charge)?;
        if self.fee_amount != 0.0 {
            writeln!(f, "  fees:          ${:.2}", self.fee_amount)?;
        }
        write!(f, "  total:         ${:.2}", self.total_bill)
    }
}

/// Calendar days in a (year, month), handling leap years.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 0,
    }
}
