//! Source content persistence
//!
//! Append-only: each detected change adds a row. The latest version of a URL
//! is the row with the greatest `created_at`, later inserts winning ties.

use regwatch_common::events::{ChangeOperation, EventBus, RegwatchEvent};
use regwatch_common::models::{new_id, SourceContent};
use regwatch_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

const SELECT_CONTENTS: &str =
    "SELECT id, source_url, title, content, created_at, updated_at FROM source_contents";

#[derive(Clone)]
pub struct SourceContentRepository {
    pool: SqlitePool,
    event_bus: EventBus,
}

impl SourceContentRepository {
    pub fn new(pool: SqlitePool, event_bus: EventBus) -> Self {
        Self { pool, event_bus }
    }

    pub async fn insert(&self, source_url: &str, title: &str, content: &str) -> Result<SourceContent> {
        let source_content = SourceContent {
            id: new_id(),
            source_url: source_url.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: time::now(),
            updated_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO source_contents (id, source_url, title, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(&source_content.id)
        .bind(&source_content.source_url)
        .bind(&source_content.title)
        .bind(&source_content.content)
        .bind(source_content.created_at)
        .execute(&self.pool)
        .await?;

        debug!(
            "Stored content {} for {} ({} bytes)",
            source_content.id,
            source_url,
            source_content.content.len()
        );
        self.event_bus.emit_lossy(RegwatchEvent::source_content(
            ChangeOperation::Insert,
            &source_content.id,
            Some(source_content.clone()),
        ));
        Ok(source_content)
    }

    pub async fn list_all(&self) -> Result<Vec<SourceContent>> {
        let rows = sqlx::query(&format!("{} ORDER BY rowid", SELECT_CONTENTS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(content_from_row).collect()
    }

    /// Every stored version for `source_url`, oldest first
    pub async fn list_by_url(&self, source_url: &str) -> Result<Vec<SourceContent>> {
        let rows = sqlx::query(&format!(
            "{} WHERE source_url = ? ORDER BY rowid",
            SELECT_CONTENTS
        ))
        .bind(source_url)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(content_from_row).collect()
    }

    pub async fn latest_for_url(&self, source_url: &str) -> Result<Option<SourceContent>> {
        let row = sqlx::query(&format!(
            "{} WHERE source_url = ? ORDER BY created_at DESC, rowid DESC LIMIT 1",
            SELECT_CONTENTS
        ))
        .bind(source_url)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(content_from_row).transpose()
    }

    /// Latest version for each URL that has any content, in `source_urls` order
    pub async fn latest_for_urls(&self, source_urls: &[String]) -> Result<Vec<SourceContent>> {
        let mut latest = Vec::with_capacity(source_urls.len());
        for source_url in source_urls {
            if let Some(content) = self.latest_for_url(source_url).await? {
                latest.push(content);
            }
        }
        Ok(latest)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM source_contents")
            .fetch_all(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM source_contents")
            .execute(&self.pool)
            .await?;

        for id in &ids {
            self.event_bus.emit_lossy(RegwatchEvent::source_content(
                ChangeOperation::Delete,
                id,
                None,
            ));
        }
        Ok(result.rows_affected())
    }
}

fn content_from_row(row: &SqliteRow) -> Result<SourceContent> {
    Ok(SourceContent {
        id: row.try_get("id")?,
        source_url: row.try_get("source_url")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
