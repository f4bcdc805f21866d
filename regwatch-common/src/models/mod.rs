//! Domain models shared by the service and its tools
//!
//! Each entity has a persisted shape (what repositories return and streams
//! publish) and, where clients create or modify it, request shapes.

mod audit_report;
mod feature;
mod source;
mod source_content;

pub use audit_report::{AuditReport, AuditReportCreateRequest, AuditReportStatus};
pub use feature::{Feature, FeatureCreateRequest, FeatureStatus, FeatureUpdateRequest};
pub use source::{Source, SourceCreateRequest, SourceIdsRequest};
pub use source_content::{SourceContent, SourceContentCreateRequest, SourceContentUpdate};

/// Generate a fresh string identifier for a new row
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
