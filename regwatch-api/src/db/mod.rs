//! Repositories
//!
//! One repository per table. Each holds the pool and the event bus, and
//! publishes a change event for every row it inserts, updates or deletes.

pub mod audit_reports;
pub mod features;
pub mod source_contents;
pub mod sources;

pub use audit_reports::AuditReportRepository;
pub use features::FeatureRepository;
pub use source_contents::SourceContentRepository;
pub use sources::SourceRepository;
