//! Configuration for the audit trail.
//!
//! Handles loading and validating settings from TOML files.

mod settings;

pub use settings::*;
