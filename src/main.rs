//! Tariff analyzer entry point: CLI wiring and config-driven plan construction.

use std::path::Path;
use std::process;

use tariff_sim::billing::aggregate::aggregate;
use tariff_sim::billing::calibrate::{self, CalibratedRates};
use tariff_sim::billing::classifier::classify;
use tariff_sim::billing::plan::{TieredPlan, TouDemandPlan, TouEnergyOnlyPlan};
use tariff_sim::billing::shift::DemandReductionPolicy;
use tariff_sim::config::TariffConfig;
use tariff_sim::io::export::export_csv;
use tariff_sim::io::import::read_usage_csv;
use tariff_sim::reporting::AnalysisReport;

/// Winter rate for a calibrated plan when the config does not supply one.
/// A summer anchor says nothing about winter pricing.
const FALLBACK_WINTER_RATE: f64 = 0.1100;

/// Parsed CLI arguments.
struct CliArgs {
    usage_path: Option<String>,
    tariffs_path: Option<String>,
    preset: Option<String>,
    energy_shift_pct: Option<f64>,
    peak_reduction_pct: Option<f64>,
    export_path: Option<String>,
}

fn print_help() {
    eprintln!("tariff-sim — residential electricity tariff analyzer");
    eprintln!();
    eprintln!("Usage: tariff-sim --usage <path> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --usage <path>           Hourly usage CSV export (required)");
    eprintln!("  --tariffs <path>         Load tariff rates from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (published, fee_adjusted)");
    eprintln!("  --energy-shift <pct>     Percent of peak energy shifted off-peak");
    eprintln!("  --peak-reduction <pct>   Percent reduction of monthly peak demand");
    eprintln!("  --export <path>          Write the monthly comparison to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --tariffs or --preset is given, the fee_adjusted preset is used.");
}

fn parse_percent(flag: &str, value: &str) -> f64 {
    let Ok(pct) = value.parse::<f64>() else {
        eprintln!("error: {flag} value \"{value}\" is not a valid number");
        process::exit(1);
    };
    if !pct.is_finite() {
        eprintln!("error: {flag} value \"{value}\" is not finite");
        process::exit(1);
    }
    // Out-of-range values are clamped, not rejected.
    pct.clamp(0.0, 100.0)
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        usage_path: None,
        tariffs_path: None,
        preset: None,
        energy_shift_pct: None,
        peak_reduction_pct: None,
        export_path: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--usage" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --usage requires a path argument");
                    process::exit(1);
                }
                cli.usage_path = Some(args[i].clone());
            }
            "--tariffs" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --tariffs requires a path argument");
                    process::exit(1);
                }
                cli.tariffs_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--energy-shift" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --energy-shift requires a percent argument");
                    process::exit(1);
                }
                cli.energy_shift_pct = Some(parse_percent("--energy-shift", &args[i]));
            }
            "--peak-reduction" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --peak-reduction requires a percent argument");
                    process::exit(1);
                }
                cli.peak_reduction_pct = Some(parse_percent("--peak-reduction", &args[i]));
            }
            "--export" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --export requires a path argument");
                    process::exit(1);
                }
                cli.export_path = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.tariffs_path.is_some() && cli.preset.is_some() {
        eprintln!("error: --tariffs and --preset are mutually exclusive");
        process::exit(1);
    }

    cli
}

/// Derives tier rates from the configured anchor bill, if there is one.
///
/// Returns `None` when no anchor is configured, when the derivation fails, or
/// when the derived rates fail to reprice the anchor within tolerance. A bad
/// calibration is reported and ignored, never silently used.
fn try_calibrate(cfg: &TariffConfig) -> Option<CalibratedRates> {
    let anchor = cfg.calibration.anchor_bill()?;
    let settings = cfg
        .calibration
        .settings([cfg.tiered.tier1_limit_kwh, cfg.tiered.tier2_limit_kwh]);
    let rates = match calibrate::calibrate(&settings, anchor) {
        Ok(rates) => rates,
        Err(e) => {
            eprintln!("warning: calibration skipped: {e}");
            return None;
        }
    };
    let check = rates.check_anchor();
    if !check.within_tolerance {
        eprintln!(
            "warning: calibrated rates miss the anchor bill by ${:.2} \
             (tolerance ${:.2}); using published rates",
            check.absolute_error, rates.tolerance_dollars
        );
        return None;
    }
    eprintln!(
        "calibrated tier-3 rate: ${:.6}/kWh (anchor error ${:.4})",
        rates.tier3_rate, check.absolute_error
    );
    Some(rates)
}

/// Builds the three comparison plans from config, swapping in calibrated
/// tier rates when an anchor is configured and checks out.
fn build_plans(cfg: &TariffConfig) -> (TieredPlan, TouDemandPlan, TouEnergyOnlyPlan) {
    let t = &cfg.tiered;
    let tiered = match try_calibrate(cfg) {
        Some(rates) => rates.into_plan(
            "R-30 (calibrated)",
            cfg.calibration.winter_rate.unwrap_or(FALLBACK_WINTER_RATE),
        ),
        None => TieredPlan::new(
            "R-30",
            t.basic_daily_charge,
            t.winter_rate,
            [t.tier1_rate, t.tier2_rate, t.tier3_rate],
            [t.tier1_limit_kwh, t.tier2_limit_kwh],
            t.fee_multiplier,
        ),
    };

    let d = &cfg.tou_demand;
    let tou_demand = TouDemandPlan::new(
        "TOU-RD-11",
        d.basic_daily_charge,
        d.on_peak_rate,
        d.off_peak_rate,
        d.demand_rate,
        d.fee_multiplier,
    );

    let e = &cfg.tou_energy_only;
    let tou_energy_only = TouEnergyOnlyPlan::new(
        "TOU-REO-18",
        e.basic_daily_charge,
        e.on_peak_rate,
        e.off_peak_rate,
        e.fee_multiplier,
    );

    (tiered, tou_demand, tou_energy_only)
}

fn main() {
    let cli = parse_args();

    let Some(ref usage_path) = cli.usage_path else {
        eprintln!("error: --usage is required");
        print_help();
        process::exit(1);
    };

    // Load config: --tariffs takes priority, then --preset, then fee_adjusted
    let config = if let Some(ref path) = cli.tariffs_path {
        match TariffConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match TariffConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        TariffConfig::fee_adjusted()
    };

    // Validate
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    // Ingest and aggregate
    let usage = match read_usage_csv(Path::new(usage_path)) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    if usage.skipped_rows > 0 {
        eprintln!(
            "note: skipped {} unparseable rows in {usage_path}",
            usage.skipped_rows
        );
    }
    let classified = classify(&usage.readings);
    let aggregates = aggregate(&classified);

    // Scenario parameters: CLI overrides config, both already in [0, 100]
    let shift_pct = cli
        .energy_shift_pct
        .unwrap_or(config.shift.energy_shift_percent);
    let reduction_pct = cli
        .peak_reduction_pct
        .unwrap_or(config.shift.peak_reduction_percent);
    let shift_fraction = shift_pct / 100.0;
    let policy = DemandReductionPolicy::Fixed(reduction_pct / 100.0);

    // Price and report
    let (tiered, tou_demand, tou_energy_only) = build_plans(&config);
    let report = AnalysisReport::build(
        &aggregates,
        &tiered,
        &tou_demand,
        &tou_energy_only,
        shift_fraction,
        policy,
    );
    println!("{report}");

    // Export CSV if requested
    if let Some(ref path) = cli.export_path {
        if let Err(e) = export_csv(&report.rows, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Comparison written to {path}");
    }
}
