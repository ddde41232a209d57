//! TOML-based tariff configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::billing::calibrate::{AnchorBill, CalibrationSettings};

/// Top-level tariff configuration parsed from TOML.
///
/// All fields default to the published rate schedule this analysis was built
/// against. Load from TOML with [`TariffConfig::from_toml_file`] or use
/// [`TariffConfig::published`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TariffConfig {
    /// Flat-tiered residential plan (R-30 family).
    #[serde(default)]
    pub tiered: TieredPlanConfig,
    /// Time-of-use plan with a demand charge (TOU-RD family).
    #[serde(default)]
    pub tou_demand: TouDemandConfig,
    /// Time-of-use energy-only plan (TOU-REO family).
    #[serde(default)]
    pub tou_energy_only: TouEnergyOnlyConfig,
    /// Tier-rate calibration settings and optional anchor bill.
    #[serde(default)]
    pub calibration: CalibrationConfig,
    /// Default load-shifting scenario parameters.
    #[serde(default)]
    pub shift: ShiftConfig,
}

/// Flat-tiered plan parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TieredPlanConfig {
    /// Basic service charge per day (dollars).
    pub basic_daily_charge: f64,
    /// Single winter rate ($/kWh).
    pub winter_rate: f64,
    /// Summer tier rates, lowest block first ($/kWh).
    pub tier1_rate: f64,
    pub tier2_rate: f64,
    pub tier3_rate: f64,
    /// Upper bound of tier 1 (kWh).
    pub tier1_limit_kwh: f64,
    /// Upper bound of tier 2 (kWh).
    pub tier2_limit_kwh: f64,
    /// Proportional surcharge uplift; 1.0 means none.
    pub fee_multiplier: f64,
}

impl Default for TieredPlanConfig {
    fn default() -> Self {
        Self {
            basic_daily_charge: 0.4603,
            winter_rate: 0.080602,
            tier1_rate: 0.086121,
            tier2_rate: 0.143047,
            tier3_rate: 0.148051,
            tier1_limit_kwh: 650.0,
            tier2_limit_kwh: 1000.0,
            fee_multiplier: 1.0,
        }
    }
}

/// TOU-with-demand plan parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TouDemandConfig {
    pub basic_daily_charge: f64,
    pub on_peak_rate: f64,
    pub off_peak_rate: f64,
    /// Demand charge per kW of monthly peak.
    pub demand_rate: f64,
    pub fee_multiplier: f64,
}

impl Default for TouDemandConfig {
    fn default() -> Self {
        Self {
            basic_daily_charge: 0.4603,
            on_peak_rate: 0.142986,
            off_peak_rate: 0.015288,
            demand_rate: 12.21,
            fee_multiplier: 1.0,
        }
    }
}

/// TOU energy-only plan parameters. No demand rate exists for this plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TouEnergyOnlyConfig {
    pub basic_daily_charge: f64,
    pub on_peak_rate: f64,
    pub off_peak_rate: f64,
    pub fee_multiplier: f64,
}

impl Default for TouEnergyOnlyConfig {
    fn default() -> Self {
        Self {
            basic_daily_charge: 0.4603,
            on_peak_rate: 0.297868,
            off_peak_rate: 0.076281,
            fee_multiplier: 1.0,
        }
    }
}

/// Calibration knobs plus an optional anchor bill. When an anchor is present
/// and the derived rates reprice it within tolerance, the binary reports a
/// calibrated tiered plan alongside the published one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalibrationConfig {
    /// Share of the anchor cost attributed to the basic charge.
    pub basic_share: Option<f64>,
    /// Known tier-1 rate used during derivation ($/kWh).
    pub tier1_rate: Option<f64>,
    /// Known tier-2 rate used during derivation ($/kWh).
    pub tier2_rate: Option<f64>,
    /// Absolute dollar tolerance for accepting the calibration.
    pub tolerance_dollars: Option<f64>,
    /// Winter rate for the calibrated plan; not derivable from a summer
    /// anchor.
    pub winter_rate: Option<f64>,
    pub anchor: Option<AnchorConfig>,
}

/// One verified historical bill.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnchorConfig {
    pub usage_kwh: f64,
    pub total_cost: f64,
    pub billing_days: u32,
}

impl CalibrationConfig {
    /// Resolved settings with defaults filled in.
    pub fn settings(&self, tier_bounds: [f64; 2]) -> CalibrationSettings {
        let defaults = CalibrationSettings::default();
        CalibrationSettings {
            basic_share: self.basic_share.unwrap_or(defaults.basic_share),
            tier1_rate: self.tier1_rate.unwrap_or(defaults.tier1_rate),
            tier2_rate: self.tier2_rate.unwrap_or(defaults.tier2_rate),
            tier_bounds,
            tolerance_dollars: self.tolerance_dollars.unwrap_or(defaults.tolerance_dollars),
        }
    }

    pub fn anchor_bill(&self) -> Option<AnchorBill> {
        self.anchor.as_ref().map(|a| AnchorBill {
            usage_kwh: a.usage_kwh,
            total_cost: a.total_cost,
            billing_days: a.billing_days,
        })
    }
}

/// Load-shifting scenario parameters, expressed as percentages in [0, 100]
/// the way callers supply them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShiftConfig {
    /// Percent of peak energy moved to off-peak.
    pub energy_shift_percent: f64,
    /// Percent reduction of monthly peak demand.
    pub peak_reduction_percent: f64,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            energy_shift_percent: 25.0,
            peak_reduction_percent: 40.0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"tiered.tier1_limit_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl TariffConfig {
    /// Published rate schedule with no surcharge uplift.
    pub fn published() -> Self {
        Self {
            tiered: TieredPlanConfig::default(),
            tou_demand: TouDemandConfig::default(),
            tou_energy_only: TouEnergyOnlyConfig::default(),
            calibration: CalibrationConfig::default(),
            shift: ShiftConfig::default(),
        }
    }

    /// Published rates with the bundled-surcharge uplift applied to both TOU
    /// plans, matching observed bills.
    pub fn fee_adjusted() -> Self {
        Self {
            tou_demand: TouDemandConfig {
                fee_multiplier: 1.137,
                ..TouDemandConfig::default()
            },
            tou_energy_only: TouEnergyOnlyConfig {
                fee_multiplier: 1.137,
                ..TouEnergyOnlyConfig::default()
            },
            ..Self::published()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["published", "fee_adjusted"];

    /// Loads a tariff configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "published" => Ok(Self::published()),
            "fee_adjusted" => Ok(Self::fee_adjusted()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a tariff configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "tariffs".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a tariff configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let t = &self.tiered;
        for (field, value) in [
            ("tiered.basic_daily_charge", t.basic_daily_charge),
            ("tiered.winter_rate", t.winter_rate),
            ("tiered.tier1_rate", t.tier1_rate),
            ("tiered.tier2_rate", t.tier2_rate),
            ("tiered.tier3_rate", t.tier3_rate),
        ] {
            if value < 0.0 {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must be >= 0".into(),
                });
            }
        }
        if t.tier1_limit_kwh <= 0.0 {
            errors.push(ConfigError {
                field: "tiered.tier1_limit_kwh".into(),
                message: "must be > 0".into(),
            });
        }
        if t.tier2_limit_kwh <= t.tier1_limit_kwh {
            errors.push(ConfigError {
                field: "tiered.tier2_limit_kwh".into(),
                message: "must be > tiered.tier1_limit_kwh".into(),
            });
        }
        if t.fee_multiplier <= 0.0 {
            errors.push(ConfigError {
                field: "tiered.fee_multiplier".into(),
                message: "must be > 0".into(),
            });
        }

        let d = &self.tou_demand;
        for (field, value) in [
            ("tou_demand.basic_daily_charge", d.basic_daily_charge),
            ("tou_demand.on_peak_rate", d.on_peak_rate),
            ("tou_demand.off_peak_rate", d.off_peak_rate),
            ("tou_demand.demand_rate", d.demand_rate),
        ] {
            if value < 0.0 {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must be >= 0".into(),
                });
            }
        }
        if d.fee_multiplier <= 0.0 {
            errors.push(ConfigError {
                field: "tou_demand.fee_multiplier".into(),
                message: "must be > 0".into(),
            });
        }

        let e = &self.tou_energy_only;
        for (field, value) in [
            ("tou_energy_only.basic_daily_charge", e.basic_daily_charge),
            ("tou_energy_only.on_peak_rate", e.on_peak_rate),
            ("tou_energy_only.off_peak_rate", e.off_peak_rate),
        ] {
            if value < 0.0 {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must be >= 0".into(),
                });
            }
        }
        if e.fee_multiplier <= 0.0 {
            errors.push(ConfigError {
                field: "tou_energy_only.fee_multiplier".into(),
                message: "must be > 0".into(),
            });
        }

        let c = &self.calibration;
        if let Some(share) = c.basic_share {
            if !(0.0..1.0).contains(&share) {
                errors.push(ConfigError {
                    field: "calibration.basic_share".into(),
                    message: "must be in [0.0, 1.0)".into(),
                });
            }
        }
        if let Some(tol) = c.tolerance_dollars {
            if tol <= 0.0 {
                errors.push(ConfigError {
                    field: "calibration.tolerance_dollars".into(),
                    message: "must be > 0".into(),
                });
            }
        }
        if let Some(rate) = c.winter_rate {
            if rate < 0.0 {
                errors.push(ConfigError {
                    field: "calibration.winter_rate".into(),
                    message: "must be >= 0".into(),
                });
            }
        }
        if let Some(anchor) = &c.anchor {
            if anchor.total_cost <= 0.0 {
                errors.push(ConfigError {
                    field: "calibration.anchor.total_cost".into(),
                    message: "must be > 0".into(),
                });
            }
            if anchor.billing_days == 0 {
                errors.push(ConfigError {
                    field: "calibration.anchor.billing_days".into(),
                    message: "must be > 0".into(),
                });
            }
        }

        let s = &self.shift;
        if !(0.0..=100.0).contains(&s.energy_shift_percent) {
            errors.push(ConfigError {
                field: "shift.energy_shift_percent".into(),
                message: "must be in [0.0, 100.0]".into(),
            });
        }
        if !(0.0..=100.0).contains(&s.peak_reduction_percent) {
            errors.push(ConfigError {
                field: "shift.peak_reduction_percent".into(),
                message: "must be in [0.0, 100.0]".into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_preset_valid() {
        let cfg = TariffConfig::published();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "published should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_known_names() {
        assert!(TariffConfig::from_preset("published").is_ok());
        assert!(TariffConfig::from_preset("fee_adjusted").is_ok());
    }

    #[test]
    fn from_preset_unknown() {
        let err = TariffConfig::from_preset("nonexistent").unwrap_err();
        assert!(err.message.contains("unknown preset"));
    }

    #[test]
    fn fee_adjusted_uplifts_tou_plans_only() {
        let cfg = TariffConfig::fee_adjusted();
        assert_eq!(cfg.tou_demand.fee_multiplier, 1.137);
        assert_eq!(cfg.tou_energy_only.fee_multiplier, 1.137);
        assert_eq!(cfg.tiered.fee_multiplier, 1.0);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[tiered]
basic_daily_charge = 0.50
winter_rate = 0.09
tier1_rate = 0.10
tier2_rate = 0.15
tier3_rate = 0.16
tier1_limit_kwh = 600.0
tier2_limit_kwh = 1100.0
fee_multiplier = 1.0

[tou_demand]
basic_daily_charge = 0.50
on_peak_rate = 0.14
off_peak_rate = 0.02
demand_rate = 11.5
fee_multiplier = 1.1

[tou_energy_only]
basic_daily_charge = 0.50
on_peak_rate = 0.30
off_peak_rate = 0.08
fee_multiplier = 1.1

[calibration]
basic_share = 0.12
tolerance_dollars = 0.25

[calibration.anchor]
usage_kwh = 1786.2
total_cost = 392.27
billing_days = 30

[shift]
energy_shift_percent = 30.0
peak_reduction_percent = 50.0
"#;
        let cfg = TariffConfig::from_toml_str(toml).expect("valid TOML should parse");
        assert_eq!(cfg.tiered.tier1_limit_kwh, 600.0);
        assert_eq!(cfg.calibration.basic_share, Some(0.12));
        let anchor = cfg.calibration.anchor.as_ref().expect("anchor present");
        assert_eq!(anchor.billing_days, 30);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[tiered]
bogus_field = true
"#;
        assert!(TariffConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[tou_demand]
fee_multiplier = 1.137
"#;
        let cfg = TariffConfig::from_toml_str(toml).expect("partial TOML should parse");
        assert_eq!(cfg.tou_demand.fee_multiplier, 1.137);
        // other fields keep defaults
        assert_eq!(cfg.tou_demand.demand_rate, 12.21);
        assert_eq!(cfg.tiered.tier1_rate, 0.086121);
        assert_eq!(cfg.shift.energy_shift_percent, 25.0);
    }

    #[test]
    fn validation_catches_inverted_tier_bounds() {
        let mut cfg = TariffConfig::published();
        cfg.tiered.tier2_limit_kwh = 500.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "tiered.tier2_limit_kwh"));
    }

    #[test]
    fn validation_catches_negative_rate() {
        let mut cfg = TariffConfig::published();
        cfg.tou_demand.off_peak_rate = -0.01;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "tou_demand.off_peak_rate"));
    }

    #[test]
    fn validation_catches_out_of_range_shift_percent() {
        let mut cfg = TariffConfig::published();
        cfg.shift.energy_shift_percent = 120.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "shift.energy_shift_percent"));
    }

    #[test]
    fn validation_catches_bad_basic_share() {
        let mut cfg = TariffConfig::published();
        cfg.calibration.basic_share = Some(1.0);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "calibration.basic_share"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in TariffConfig::PRESETS {
            let cfg = TariffConfig::from_preset(name)
                .unwrap_or_else(|e| panic!("preset \"{name}\" should load: {e}"));
            let errors = cfg.validate();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn calibration_settings_fill_defaults() {
        let cfg = TariffConfig::published();
        let settings = cfg.calibration.settings([650.0, 1000.0]);
        assert_eq!(settings.basic_share, 0.15);
        assert_eq!(settings.tolerance_dollars, 0.50);
        assert_eq!(settings.tier_bounds, [650.0, 1000.0]);
    }

    #[test]
    fn anchor_bill_conversion() {
        let toml = r#"
[calibration.anchor]
usage_kwh = 1786.2
total_cost = 392.27
billing_days = 30
"#;
        let cfg = TariffConfig::from_toml_str(toml).expect("anchor TOML should parse");
        let anchor = cfg.calibration.anchor_bill().expect("anchor present");
        assert_eq!(anchor.usage_kwh, 1786.2);
        assert_eq!(anchor.billing_days, 30);
        assert!(TariffConfig::published().calibration.anchor_bill().is_none());
    }
}
