//! Error types for the audit trail.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
