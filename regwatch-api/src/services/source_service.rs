//! Source service

use super::ServiceResult;
use crate::db::SourceRepository;
use chrono::{DateTime, Utc};
use futures::Stream;
use regwatch_common::events::{ChangeOperation, EventBus, RegwatchEvent};
use regwatch_common::models::{Source, SourceCreateRequest};
use regwatch_common::{sse, Error};
use serde::Serialize;
use tracing::info;
use url::Url;

/// Messages of the source change feed
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SourceFeedMessage {
    InitialData {
        sources: Vec<Source>,
    },
    SourceUpdate {
        operation_type: ChangeOperation,
        source_id: String,
        source_data: Option<Source>,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
    },
}

#[derive(Clone)]
pub struct SourceService {
    repository: SourceRepository,
    event_bus: EventBus,
}

impl SourceService {
    pub fn new(repository: SourceRepository, event_bus: EventBus) -> Self {
        Self {
            repository,
            event_bus,
        }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Source>> {
        Ok(self.repository.list_all().await?)
    }

    /// Sources for the given ids; unknown ids are skipped
    pub async fn list_by_ids(&self, ids: &[String]) -> ServiceResult<Vec<Source>> {
        Ok(self.repository.list_by_ids(ids).await?)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Source> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Source", id).into())
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.repository.count().await?)
    }

    pub async fn create(&self, request: &SourceCreateRequest) -> ServiceResult<Source> {
        let url = parse_source_url(&request.source_url)?;
        let source = self.repository.insert(url.as_str()).await?;
        info!("Created source {} for {}", source.id, source.source_url);
        Ok(source)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        if !self.repository.delete(id).await? {
            return Err(Error::not_found("Source", id).into());
        }
        info!("Deleted source {}", id);
        Ok(())
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.repository.delete_all().await?)
    }

    pub async fn update_tags(&self, id: &str, tags: &[String]) -> ServiceResult<Source> {
        self.repository
            .update_tags(id, tags)
            .await?
            .ok_or_else(|| Error::not_found("Source", id).into())
    }

    /// Snapshot of all sources followed by every source change
    pub fn stream(&self) -> impl Stream<Item = SourceFeedMessage> + Send + 'static {
        let repository = self.repository.clone();

        sse::change_feed(
            "sources",
            self.event_bus.subscribe(),
            move || {
                let repository = repository.clone();
                async move {
                    let sources = repository.list_all().await?;
                    Ok(SourceFeedMessage::InitialData { sources })
                }
            },
            |event| match event {
                RegwatchEvent::SourceChanged {
                    operation,
                    source_id,
                    source,
                    timestamp,
                } => Some(SourceFeedMessage::SourceUpdate {
                    operation_type: operation,
                    source_id,
                    source_data: source,
                    timestamp,
                }),
                _ => None,
            },
            |message| SourceFeedMessage::Error { message },
        )
    }
}

/// Accept absolute http(s) URLs only
///
/// Every stored `source_url` goes through here so that sources and their
/// contents share one spelling (`https://a.test` becomes `https://a.test/`).
pub(crate) fn parse_source_url(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::InvalidInput(format!("Invalid source URL '{}': {}", raw, e)))?;

    let is_web = matches!(url.scheme(), "http" | "https") && url.host_str().is_some();
    if !is_web {
        return Err(Error::InvalidInput(format!(
            "Source URL must be an http(s) URL: {}",
            raw
        )));
    }
    Ok(url)
}
