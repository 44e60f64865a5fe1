//! Audit Trail Library
//!
//! This crate provides a durable, queryable record of mutating API operations
//! ("who changed what, when") backed by day-partitioned, append-only JSONL
//! files. It has no database dependency: records are appended to one file per
//! UTC calendar day, queried by bounded date-range scans, and expired by a
//! scheduled whole-file retention sweep.

pub mod config;
pub mod error;
pub mod mask;
pub mod query;
pub mod record;
pub mod recorder;
pub mod store;
