//! Sensitive data masking for audit payloads.
//!
//! Recursively redacts values whose key matches a sensitive-field pattern
//! before they reach durable storage.

mod masker;

pub use masker::{SensitiveDataMasker, MASK_TOKEN};
