//! Feature persistence

use regwatch_common::db::{decode_list, encode_list};
use regwatch_common::events::{ChangeOperation, EventBus, RegwatchEvent};
use regwatch_common::models::{new_id, Feature, FeatureStatus, FeatureUpdateRequest};
use regwatch_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

const SELECT_FEATURES: &str =
    "SELECT id, name, description, status, tags, created_at, updated_at FROM features";

#[derive(Clone)]
pub struct FeatureRepository {
    pool: SqlitePool,
    event_bus: EventBus,
}

impl FeatureRepository {
    pub fn new(pool: SqlitePool, event_bus: EventBus) -> Self {
        Self { pool, event_bus }
    }

    /// Insert a new feature in `pending` status
    pub async fn insert(&self, name: &str, description: &str, tags: &[String]) -> Result<Feature> {
        let feature = Feature {
            id: new_id(),
            name: name.to_string(),
            description: description.to_string(),
            status: FeatureStatus::Pending,
            tags: tags.to_vec(),
            created_at: time::now(),
            updated_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO features (id, name, description, status, tags, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(&feature.id)
        .bind(&feature.name)
        .bind(&feature.description)
        .bind(feature.status.as_str())
        .bind(encode_list(&feature.tags)?)
        .bind(feature.created_at)
        .execute(&self.pool)
        .await?;

        debug!("Inserted feature {}", feature.id);
        self.publish(ChangeOperation::Insert, &feature.id, Some(feature.clone()));
        Ok(feature)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Feature>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_FEATURES))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(feature_from_row).transpose()
    }

    /// All features in insertion order
    pub async fn list_all(&self) -> Result<Vec<Feature>> {
        let rows = sqlx::query(&format!("{} ORDER BY rowid", SELECT_FEATURES))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(feature_from_row).collect()
    }

    pub async fn list_by_ids(&self, ids: &[String]) -> Result<Vec<Feature>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("{} WHERE id IN (", SELECT_FEATURES));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(") ORDER BY rowid");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(feature_from_row).collect()
    }

    /// Features carrying at least one of `tags` (exact string match)
    pub async fn list_by_any_tag(&self, tags: &[String]) -> Result<Vec<Feature>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "{} WHERE EXISTS (SELECT 1 FROM json_each(features.tags) WHERE json_each.value IN (",
            SELECT_FEATURES
        ));
        let mut separated = query.separated(", ");
        for tag in tags {
            separated.push_bind(tag.clone());
        }
        separated.push_unseparated(")) ORDER BY rowid");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(feature_from_row).collect()
    }

    /// Apply the fields present in `update`
    ///
    /// Returns `None` when no feature has this id. `updated_at` is set only
    /// when at least one field was provided.
    pub async fn update_fields(
        &self,
        id: &str,
        update: &FeatureUpdateRequest,
    ) -> Result<Option<Feature>> {
        if update.is_empty() {
            return self.find_by_id(id).await;
        }

        let result = sqlx::query(
            r#"
            UPDATE features
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.status.map(|status| status.as_str()))
        .bind(time::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.reload_after_update(id, result.rows_affected()).await
    }

    pub async fn update_status(&self, id: &str, status: FeatureStatus) -> Result<Option<Feature>> {
        let result = sqlx::query("UPDATE features SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(time::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.reload_after_update(id, result.rows_affected()).await
    }

    /// Set every feature back to `pending`; returns the number of rows touched
    pub async fn reset_all_statuses(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE features SET status = 'pending', updated_at = ?")
            .bind(time::now())
            .execute(&self.pool)
            .await?;

        for feature in self.list_all().await? {
            let id = feature.id.clone();
            self.publish(ChangeOperation::Update, &id, Some(feature));
        }

        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM features")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn reload_after_update(&self, id: &str, rows_affected: u64) -> Result<Option<Feature>> {
        if rows_affected == 0 {
            return Ok(None);
        }

        let feature = self.find_by_id(id).await?;
        if let Some(feature) = &feature {
            debug!("Updated feature {} (status {})", id, feature.status);
            self.publish(ChangeOperation::Update, id, Some(feature.clone()));
        }
        Ok(feature)
    }

    fn publish(&self, operation: ChangeOperation, id: &str, feature: Option<Feature>) {
        self.event_bus
            .emit_lossy(RegwatchEvent::feature(operation, id, feature));
    }
}

fn feature_from_row(row: &SqliteRow) -> Result<Feature> {
    let status: String = row.try_get("status")?;
    let tags: String = row.try_get("tags")?;

    Ok(Feature {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        status: status.parse()?,
        tags: decode_list(&tags)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use regwatch_common::db::init_memory_pool;

    async fn repository() -> (FeatureRepository, EventBus) {
        let pool = init_memory_pool().await.unwrap();
        let bus = EventBus::new(32);
        (FeatureRepository::new(pool, bus.clone()), bus)
    }

    #[tokio::test]
    async fn insert_forces_pending_and_null_updated_at() {
        let (repo, _bus) = repository().await;
        let feature = repo
            .insert("Age gate", "Blocks minors", &["coppa".to_string()])
            .await
            .unwrap();

        let stored = repo.find_by_id(&feature.id).await.unwrap().unwrap();
        assert_eq!(stored.status, FeatureStatus::Pending);
        assert!(stored.updated_at.is_none());
        assert_eq!(stored.tags, vec!["coppa".to_string()]);
    }

    #[tokio::test]
    async fn update_fields_only_touches_provided_fields() {
        let (repo, _bus) = repository().await;
        let feature = repo.insert("Name", "Desc", &[]).await.unwrap();

        let update = FeatureUpdateRequest {
            description: Some("New desc".into()),
            ..Default::default()
        };
        let updated = repo.update_fields(&feature.id, &update).await.unwrap().unwrap();

        assert_eq!(updated.name, "Name");
        assert_eq!(updated.description, "New desc");
        assert_eq!(updated.status, FeatureStatus::Pending);
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn update_of_unknown_id_returns_none() {
        let (repo, _bus) = repository().await;
        let result = repo
            .update_status("missing", FeatureStatus::Critical)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn tag_lookup_matches_any_tag() {
        let (repo, _bus) = repository().await;
        let a = repo.insert("A", "a", &["gdpr".into(), "ccpa".into()]).await.unwrap();
        let _b = repo.insert("B", "b", &["coppa".into()]).await.unwrap();
        let c = repo.insert("C", "c", &["ccpa".into()]).await.unwrap();

        let matched = repo.list_by_any_tag(&["ccpa".into()]).await.unwrap();
        let ids: Vec<_> = matched.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), c.id.as_str()]);

        assert!(repo.list_by_any_tag(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mutations_publish_events() {
        let (repo, bus) = repository().await;
        let mut rx = bus.subscribe();

        let feature = repo.insert("A", "a", &[]).await.unwrap();
        repo.update_status(&feature.id, FeatureStatus::Warning)
            .await
            .unwrap();

        let inserted = rx.recv().await.unwrap();
        let updated = rx.recv().await.unwrap();
        match (inserted, updated) {
            (
                RegwatchEvent::FeatureChanged { operation: first, .. },
                RegwatchEvent::FeatureChanged {
                    operation: second,
                    feature: Some(doc),
                    ..
                },
            ) => {
                assert_eq!(first, ChangeOperation::Insert);
                assert_eq!(second, ChangeOperation::Update);
                assert_eq!(doc.status, FeatureStatus::Warning);
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[tokio::test]
    async fn reset_sets_every_status_to_pending() {
        let (repo, _bus) = repository().await;
        let a = repo.insert("A", "a", &[]).await.unwrap();
        let b = repo.insert("B", "b", &[]).await.unwrap();
        repo.update_status(&a.id, FeatureStatus::Critical).await.unwrap();
        repo.update_status(&b.id, FeatureStatus::Pass).await.unwrap();

        assert_eq!(repo.reset_all_statuses().await.unwrap(), 2);
        for feature in repo.list_all().await.unwrap() {
            assert_eq!(feature.status, FeatureStatus::Pending);
            assert!(feature.updated_at.is_some());
        }
        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
