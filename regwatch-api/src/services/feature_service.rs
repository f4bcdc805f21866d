//! Feature service

use super::{ServiceError, ServiceResult};
use crate::agents::FeatureTagger;
use crate::db::FeatureRepository;
use chrono::{DateTime, Utc};
use futures::Stream;
use regwatch_common::events::{ChangeOperation, EventBus, RegwatchEvent};
use regwatch_common::models::{Feature, FeatureCreateRequest, FeatureStatus, FeatureUpdateRequest};
use regwatch_common::{sse, Error};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Messages of the feature change feed
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FeatureFeedMessage {
    InitialData {
        features: Vec<Feature>,
    },
    FeatureUpdate {
        operation_type: ChangeOperation,
        feature_id: String,
        feature_data: Option<Feature>,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
    },
}

#[derive(Clone)]
pub struct FeatureService {
    repository: FeatureRepository,
    tagger: Option<Arc<FeatureTagger>>,
    event_bus: EventBus,
}

impl FeatureService {
    pub fn new(
        repository: FeatureRepository,
        tagger: Option<Arc<FeatureTagger>>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            repository,
            tagger,
            event_bus,
        }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Feature>> {
        Ok(self.repository.list_all().await?)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Feature> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Feature", id).into())
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.repository.count().await?)
    }

    /// Create a feature in `pending` status, tagged by the feature tagger
    ///
    /// Without a tagger the feature starts with no tags.
    pub async fn create(&self, request: &FeatureCreateRequest) -> ServiceResult<Feature> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Feature name must not be empty".into()).into());
        }

        let tags = match &self.tagger {
            Some(tagger) => tagger.tag(name, &request.description).await?,
            None => {
                debug!("No feature tagger configured, creating '{}' untagged", name);
                Vec::new()
            }
        };

        let feature = self
            .repository
            .insert(name, &request.description, &tags)
            .await?;
        info!("Created feature {} with tags {:?}", feature.id, feature.tags);
        Ok(feature)
    }

    /// Apply a partial update
    ///
    /// Fails with InvalidInput when no field is provided and NotFound when the
    /// feature does not exist.
    pub async fn update(&self, id: &str, request: &FeatureUpdateRequest) -> ServiceResult<Feature> {
        if request.is_empty() {
            return Err(Error::InvalidInput("No fields provided for update".into()).into());
        }

        self.repository
            .update_fields(id, request)
            .await?
            .ok_or_else(|| Error::not_found("Feature", id).into())
    }

    pub async fn update_status(&self, id: &str, status: FeatureStatus) -> ServiceResult<Feature> {
        let feature = self
            .repository
            .update_status(id, status)
            .await?
            .ok_or_else(|| ServiceError::from(Error::not_found("Feature", id)))?;
        info!("Feature {} status set to {}", id, status);
        Ok(feature)
    }

    /// Features carrying at least one of `tags`
    pub async fn list_by_any_tag(&self, tags: &[String]) -> ServiceResult<Vec<Feature>> {
        Ok(self.repository.list_by_any_tag(tags).await?)
    }

    pub async fn reset_all_statuses(&self) -> ServiceResult<u64> {
        Ok(self.repository.reset_all_statuses().await?)
    }

    /// Snapshot of all features followed by every feature change
    pub fn stream(&self) -> impl Stream<Item = FeatureFeedMessage> + Send + 'static {
        let repository = self.repository.clone();

        sse::change_feed(
            "features",
            self.event_bus.subscribe(),
            move || {
                let repository = repository.clone();
                async move {
                    let features = repository.list_all().await?;
                    Ok(FeatureFeedMessage::InitialData { features })
                }
            },
            |event| match event {
                RegwatchEvent::FeatureChanged {
                    operation,
                    feature_id,
                    feature,
                    timestamp,
                } => Some(FeatureFeedMessage::FeatureUpdate {
                    operation_type: operation,
                    feature_id,
                    feature_data: feature,
                    timestamp,
                }),
                _ => None,
            },
            |message| FeatureFeedMessage::Error { message },
        )
    }
}
