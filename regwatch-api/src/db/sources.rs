//! Source persistence

use regwatch_common::db::{decode_list, encode_list};
use regwatch_common::events::{ChangeOperation, EventBus, RegwatchEvent};
use regwatch_common::models::{new_id, Source};
use regwatch_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

const SELECT_SOURCES: &str = "SELECT id, source_url, tags, created_at, updated_at FROM sources";

#[derive(Clone)]
pub struct SourceRepository {
    pool: SqlitePool,
    event_bus: EventBus,
}

impl SourceRepository {
    pub fn new(pool: SqlitePool, event_bus: EventBus) -> Self {
        Self { pool, event_bus }
    }

    /// Insert an untagged source
    pub async fn insert(&self, source_url: &str) -> Result<Source> {
        let source = Source {
            id: new_id(),
            source_url: source_url.to_string(),
            tags: None,
            created_at: time::now(),
            updated_at: None,
        };

        sqlx::query(
            "INSERT INTO sources (id, source_url, tags, created_at, updated_at) VALUES (?, ?, NULL, ?, NULL)",
        )
        .bind(&source.id)
        .bind(&source.source_url)
        .bind(source.created_at)
        .execute(&self.pool)
        .await?;

        debug!("Inserted source {} ({})", source.id, source.source_url);
        self.publish(ChangeOperation::Insert, &source.id, Some(source.clone()));
        Ok(source)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Source>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_SOURCES))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(source_from_row).transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query(&format!("{} ORDER BY rowid", SELECT_SOURCES))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(source_from_row).collect()
    }

    /// Sources with the given ids, in the order the ids were requested
    ///
    /// Unknown ids are skipped.
    pub async fn list_by_ids(&self, ids: &[String]) -> Result<Vec<Source>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("{} WHERE id IN (", SELECT_SOURCES));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let rows = query.build().fetch_all(&self.pool).await?;
        let mut sources = rows
            .iter()
            .map(source_from_row)
            .collect::<Result<Vec<_>>>()?;
        sources.sort_by_key(|source| ids.iter().position(|id| *id == source.id));
        Ok(sources)
    }

    pub async fn update_tags(&self, id: &str, tags: &[String]) -> Result<Option<Source>> {
        let result = sqlx::query("UPDATE sources SET tags = ?, updated_at = ? WHERE id = ?")
            .bind(encode_list(tags)?)
            .bind(time::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let source = self.find_by_id(id).await?;
        if let Some(source) = &source {
            self.publish(ChangeOperation::Update, id, Some(source.clone()));
        }
        Ok(source)
    }

    /// Delete one source; returns false when it did not exist
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            debug!("Deleted source {}", id);
            self.publish(ChangeOperation::Delete, id, None);
        }
        Ok(deleted)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM sources")
            .fetch_all(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM sources")
            .execute(&self.pool)
            .await?;

        for id in &ids {
            self.publish(ChangeOperation::Delete, id, None);
        }
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sources")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    fn publish(&self, operation: ChangeOperation, id: &str, source: Option<Source>) {
        self.event_bus
            .emit_lossy(RegwatchEvent::source(operation, id, source));
    }
}

fn source_from_row(row: &SqliteRow) -> Result<Source> {
    let tags: Option<String> = row.try_get("tags")?;

    Ok(Source {
        id: row.try_get("id")?,
        source_url: row.try_get("source_url")?,
        tags: tags.as_deref().map(decode_list).transpose()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
