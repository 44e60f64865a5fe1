//! Audit record wire types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Serde helpers for RFC 3339 UTC timestamps with millisecond precision.
///
/// Chrono's default serialization carries nanosecond precision; audit lines
/// fix the format to milliseconds so every writer produces identical shapes.
pub mod timestamp_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Mutating HTTP verbs that are subject to audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("unsupported audit method '{}'", other)),
        }
    }
}

/// A single audited operation.
///
/// The producer builds the record at the moment of the audited event (id and
/// timestamp included, so causal ordering survives write retries) and hands
/// it to the recorder, which masks the free-form payloads and appends it.
/// Once appended a record is never mutated or deleted individually; only
/// whole day files expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Unique identifier, assigned at creation.
    pub id: Uuid,
    /// Event time, UTC with millisecond precision. Determines the partition
    /// file and is the basis of range filtering.
    #[serde(with = "timestamp_millis")]
    pub timestamp: DateTime<Utc>,
    /// Free-text identity of the caller, taken from its identification
    /// header. Informational only, never validated against a directory.
    pub operator: String,
    /// The mutating verb of the audited request.
    pub method: HttpMethod,
    /// Logical route of the request.
    pub path: String,
    /// HTTP status ultimately returned, recorded even on failure.
    pub status_code: u16,
    /// Query parameters, masked once at record time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_params: Option<Value>,
    /// Request body, masked once at record time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Correlation id linking back to the originating request. Supplied by
    /// the caller, not generated here.
    pub request_id: String,
    /// Business-level tag: the feature page that triggered the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Business-level tag: the operation that triggered the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Flat map of business-relevant values extracted by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Map<String, Value>>,
}

impl AuditRecord {
    /// Create a record for an audited event happening now.
    ///
    /// Assigns a fresh id and the current UTC timestamp; optional fields are
    /// added with the `with_*` builders.
    pub fn new(
        operator: impl Into<String>,
        method: HttpMethod,
        path: impl Into<String>,
        status_code: u16,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            operator: operator.into(),
            method,
            path: path.into(),
            status_code,
            query_params: None,
            request_body: None,
            ip_address: None,
            user_agent: None,
            request_id: request_id.into(),
            page: None,
            action: None,
            fields: None,
        }
    }

    /// Set the query parameters payload.
    pub fn with_query_params(mut self, params: Value) -> Self {
        self.query_params = Some(params);
        self
    }

    /// Set the request body payload.
    pub fn with_request_body(mut self, body: Value) -> Self {
        self.request_body = Some(body);
        self
    }

    /// Set caller provenance (IP address and user agent).
    pub fn with_provenance(
        mut self,
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        self.ip_address = Some(ip_address.into());
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the business-level page and action tags.
    pub fn with_context(mut self, page: impl Into<String>, action: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self.action = Some(action.into());
        self
    }

    /// Set the flat map of business-relevant values.
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields = Some(fields);
        self
    }
}
