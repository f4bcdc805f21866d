use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::FeatureStatus;
use crate::Error;

/// Review state of an audit report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditReportStatus {
    #[default]
    Pending,
    Dismissed,
    Verified,
}

impl AuditReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditReportStatus::Pending => "pending",
            AuditReportStatus::Dismissed => "dismissed",
            AuditReportStatus::Verified => "verified",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuditReportStatus::Pending)
    }
}

impl fmt::Display for AuditReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditReportStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AuditReportStatus::Pending),
            "dismissed" => Ok(AuditReportStatus::Dismissed),
            "verified" => Ok(AuditReportStatus::Verified),
            other => Err(Error::InvalidInput(format!(
                "Unknown audit report status: {}",
                other
            ))),
        }
    }
}

/// A proposed status change for a feature, awaiting human review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub id: String,
    pub feature_id: String,
    pub source_ids: Vec<String>,
    pub needs_action: bool,
    pub original_status: FeatureStatus,
    pub status_change_to: FeatureStatus,
    pub reason: String,
    pub confidence: f64,
    pub status: AuditReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReportCreateRequest {
    pub feature_id: String,
    pub source_ids: Vec<String>,
    pub needs_action: bool,
    pub original_status: FeatureStatus,
    pub status_change_to: FeatureStatus,
    pub reason: String,
    pub confidence: f64,
}
