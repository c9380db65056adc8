//! Data ingestion and aggregation layer for Lead Insights.
//!
//! Responsible for loading the roster and event-log CSVs, segmenting
//! clients, extracting sequence signatures, computing the crosstab reports
//! and running the top-level analysis pipeline.

pub mod analysis;
pub mod crosstab;
pub mod loader;
pub mod segments;
pub mod sequences;

pub use insights_core as core;
