//! Caller-facing query response shape.
//!
//! Queries surface a curated projection of each record rather than the raw
//! stored line: the masked `queryParams`/`requestBody` payloads are not
//! re-exposed, only the business-relevant subset.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::record::{timestamp_millis, AuditRecord, HttpMethod};

use super::engine::QueryOutcome;

/// Transport-level detail of the audited request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    pub method: HttpMethod,
    pub path: String,
    pub status_code: u16,
}

/// One record as exposed to query callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecordView {
    pub id: Uuid,
    pub operator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Map<String, Value>>,
    pub metadata: RequestMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(with = "timestamp_millis")]
    pub created_at: DateTime<Utc>,
    pub request_id: String,
}

impl From<AuditRecord> for AuditRecordView {
    fn from(record: AuditRecord) -> Self {
        Self {
            id: record.id,
            operator: record.operator,
            page: record.page,
            action: record.action,
            fields: record.fields,
            metadata: RequestMetadata {
                method: record.method,
                path: record.path,
                status_code: record.status_code,
            },
            ip_address: record.ip_address,
            user_agent: record.user_agent,
            created_at: record.timestamp,
            request_id: record.request_id,
        }
    }
}

/// Pagination echo accompanying a page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    /// Count of records passing the filters, before pagination.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// A page of projected records plus pagination detail.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub data: Vec<AuditRecordView>,
    pub pagination: Pagination,
}

impl QueryResponse {
    /// Shape an engine outcome for the caller.
    pub fn from_outcome(outcome: QueryOutcome, limit: usize, offset: usize) -> Self {
        Self {
            data: outcome
                .records
                .into_iter()
                .map(AuditRecordView::from)
                .collect(),
            pagination: Pagination {
                total: outcome.total,
                limit,
                offset,
            },
        }
    }
}
