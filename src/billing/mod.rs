//! The billing engine: period classification, monthly aggregation, rate
//! plans, calibration, and load-shift simulation.
//!
//! Everything here is synchronous and side-effect-free over in-memory data;
//! ingestion and presentation live outside this module.

pub mod aggregate;
/// Annual roll-up across monthly bills.
pub mod annual;
pub mod calibrate;
pub mod classifier;
pub mod plan;
/// Load-shifting counterfactuals.
pub mod shift;
pub mod types;
