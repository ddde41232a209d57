//! Residential electricity tariff analysis and load-shift simulation.

pub mod billing;
pub mod config;
/// CSV ingestion of utility usage exports and comparison export.
pub mod io;
pub mod reporting;
