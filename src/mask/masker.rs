//! Recursive sensitive-field masking over arbitrary JSON values.

use serde_json::{Map, Value};

use crate::config::MaskingConfig;

/// Placeholder written in place of a sensitive value.
pub const MASK_TOKEN: &str = "***";

/// Built-in key terms whose values are always redacted.
const SENSITIVE_TERMS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "key",
    "auth",
    "credential",
    "authorization",
    "api_key",
    "private_key",
];

/// Depth cutoff guarding against pathological nesting. Realistic payloads
/// never come close; past the cutoff values pass through unmasked.
const MAX_DEPTH: usize = 64;

/// Pure, stateless masker for free-form audit payloads.
///
/// Walks an arbitrary JSON value and replaces the value of every object key
/// that matches a sensitive term (case-insensitive substring match) with
/// [`MASK_TOKEN`], regardless of the value's own type or depth. `null` under
/// a sensitive key is masked like any other value: redaction is decided by
/// the key's presence, not the value's type. Masking cannot fail and is
/// idempotent.
#[derive(Debug, Clone)]
pub struct SensitiveDataMasker {
    terms: Vec<String>,
}

impl Default for SensitiveDataMasker {
    fn default() -> Self {
        Self::new()
    }
}

impl SensitiveDataMasker {
    /// Create a masker with the built-in term list.
    pub fn new() -> Self {
        Self {
            terms: SENSITIVE_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Create a masker from the masking configuration.
    ///
    /// The configured `additional_terms` are appended to the built-in
    /// list. This is the constructor composition roots use, so a
    /// config-supplied term is redacted exactly like a built-in one.
    pub fn from_config(config: &MaskingConfig) -> Self {
        Self::with_additional_terms(&config.additional_terms)
    }

    /// Create a masker with extra terms on top of the built-in list.
    ///
    /// The built-in defaults are additive, not replaceable: extending the
    /// list can only redact more, never less.
    pub fn with_additional_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut masker = Self::new();
        masker.terms.extend(
            terms
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .filter(|t| !t.is_empty()),
        );
        masker
    }

    /// Return a masked copy of `value`.
    ///
    /// Scalars are returned unchanged, arrays are mapped element-wise and
    /// objects are copied key-by-key with sensitive keys redacted.
    pub fn mask(&self, value: &Value) -> Value {
        self.mask_at(value, 0)
    }

    /// Check whether any key at any depth matches a sensitive term.
    ///
    /// Same traversal as [`mask`](Self::mask), short-circuiting on the first
    /// match. Used for diagnostics and tests, not on the write hot path.
    pub fn contains_sensitive_field(&self, value: &Value) -> bool {
        self.scan_at(value, 0)
    }

    fn is_sensitive_key(&self, key: &str) -> bool {
        let key_lower = key.to_lowercase();
        self.terms.iter().any(|t| key_lower.contains(t.as_str()))
    }

    fn mask_at(&self, value: &Value, depth: usize) -> Value {
        if depth >= MAX_DEPTH {
            return value.clone();
        }
        match value {
            Value::Object(map) => {
                let mut masked = Map::with_capacity(map.len());
                for (key, val) in map {
                    if self.is_sensitive_key(key) {
                        masked.insert(key.clone(), Value::String(MASK_TOKEN.to_string()));
                    } else {
                        masked.insert(key.clone(), self.mask_at(val, depth + 1));
                    }
                }
                Value::Object(masked)
            }
            Value::Array(arr) => {
                Value::Array(arr.iter().map(|v| self.mask_at(v, depth + 1)).collect())
            }
            _ => value.clone(),
        }
    }

    fn scan_at(&self, value: &Value, depth: usize) -> bool {
        if depth >= MAX_DEPTH {
            return false;
        }
        match value {
            Value::Object(map) => map.iter().any(|(key, val)| {
                self.is_sensitive_key(key) || self.scan_at(val, depth + 1)
            }),
            Value::Array(arr) => arr.iter().any(|v| self.scan_at(v, depth + 1)),
            _ => false,
        }
    }
}
