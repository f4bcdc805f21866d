//! HTTP API handlers
//!
//! Handlers extract, call one service and wrap the result in a
//! `{"success": true, ...}` envelope.

pub mod audit_reports;
pub mod compliance;
pub mod features;
pub mod health;
pub mod scripts;
pub mod sources;

pub use audit_reports::audit_report_routes;
pub use compliance::compliance_routes;
pub use features::feature_routes;
pub use health::health_routes;
pub use scripts::script_routes;
pub use sources::source_routes;
