use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scraped version of a source URL's readable content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceContent {
    pub id: String,
    pub source_url: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SourceContent {
    /// Byte-for-byte comparison used for change detection
    pub fn matches(&self, title: &str, content: &str) -> bool {
        self.title == title && self.content == content
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceContentCreateRequest {
    pub source_url: String,
    pub title: String,
    pub content: String,
}

/// A content change detected during a knowledge-base refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceContentUpdate {
    pub source_id: String,
    pub source_url: String,
    pub title: String,
    pub content: String,
}
