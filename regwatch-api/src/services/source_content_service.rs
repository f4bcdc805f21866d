//! Source content service

use super::source_service::parse_source_url;
use super::ServiceResult;
use crate::db::SourceContentRepository;
use regwatch_common::models::{SourceContent, SourceContentCreateRequest};

#[derive(Clone)]
pub struct SourceContentService {
    repository: SourceContentRepository,
}

impl SourceContentService {
    pub fn new(repository: SourceContentRepository) -> Self {
        Self { repository }
    }

    /// All stored versions, optionally restricted to one URL
    ///
    /// The filter is normalized the same way stored URLs are.
    pub async fn list(&self, source_url: Option<&str>) -> ServiceResult<Vec<SourceContent>> {
        let contents = match source_url {
            Some(url) => {
                let url = parse_source_url(url)?;
                self.repository.list_by_url(url.as_str()).await?
            }
            None => self.repository.list_all().await?,
        };
        Ok(contents)
    }

    pub async fn create(&self, request: &SourceContentCreateRequest) -> ServiceResult<SourceContent> {
        let url = parse_source_url(&request.source_url)?;

        Ok(self
            .repository
            .insert(url.as_str(), &request.title, &request.content)
            .await?)
    }

    pub async fn latest_for_url(&self, source_url: &str) -> ServiceResult<Option<SourceContent>> {
        Ok(self.repository.latest_for_url(source_url).await?)
    }

    pub async fn latest_for_urls(&self, source_urls: &[String]) -> ServiceResult<Vec<SourceContent>> {
        Ok(self.repository.latest_for_urls(source_urls).await?)
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.repository.delete_all().await?)
    }
}
