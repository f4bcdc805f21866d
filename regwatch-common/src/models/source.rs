use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A regulatory document or web page monitored for relevant content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub source_url: String,
    /// Unset until the source has been tagged after its first scrape
    pub tags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Source {
    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCreateRequest {
    pub source_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceIdsRequest {
    pub source_ids: Vec<String>,
}
