//! Core domain types for Lead Insights.
//!
//! Holds the client/interaction data model, the report configuration enums,
//! the CLI settings and the error taxonomy shared by the workspace crates.

pub mod error;
pub mod models;
pub mod settings;
