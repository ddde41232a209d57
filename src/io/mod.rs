//! File ingestion and export.

pub mod export;
pub mod import;
