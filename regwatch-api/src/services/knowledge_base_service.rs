//! Knowledge base refresh
//!
//! Re-scrapes sources, stores a new content version when the readable title
//! or text changed, and re-tags sources whose content changed.

use super::{
    extract_readable, PageFetcher, ServiceError, ServiceResult, SourceContentService,
    SourceService,
};
use crate::agents::SourceTagger;
use regwatch_common::models::{Source, SourceContentCreateRequest, SourceContentUpdate};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A source that could not be refreshed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshFailure {
    pub source_id: String,
    pub source_url: String,
    pub message: String,
}

/// Result of refreshing a batch of sources
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshOutcome {
    /// Sources whose content changed, with the new content
    pub updated: Vec<SourceContentUpdate>,
    pub failed: Vec<RefreshFailure>,
}

#[derive(Clone)]
pub struct KnowledgeBaseService {
    sources: SourceService,
    source_contents: SourceContentService,
    fetcher: Arc<dyn PageFetcher>,
    tagger: Option<Arc<SourceTagger>>,
}

impl KnowledgeBaseService {
    pub fn new(
        sources: SourceService,
        source_contents: SourceContentService,
        fetcher: Arc<dyn PageFetcher>,
        tagger: Option<Arc<SourceTagger>>,
    ) -> Self {
        Self {
            sources,
            source_contents,
            fetcher,
            tagger,
        }
    }

    /// Refresh the sources with the given ids; unknown ids are ignored
    pub async fn refresh(&self, source_ids: &[String]) -> ServiceResult<RefreshOutcome> {
        let sources = self.sources.list_by_ids(source_ids).await?;
        self.refresh_sources(&sources).await
    }

    pub async fn refresh_all(&self) -> ServiceResult<RefreshOutcome> {
        let sources = self.sources.list().await?;
        self.refresh_sources(&sources).await
    }

    /// Refresh each source in turn
    ///
    /// Fetch failures are collected per source and tagging failures only
    /// logged; database failures abort the batch.
    pub async fn refresh_sources(&self, sources: &[Source]) -> ServiceResult<RefreshOutcome> {
        info!("Refreshing {} source(s)", sources.len());
        let mut outcome = RefreshOutcome::default();

        for source in sources {
            match self.refresh_source(source).await {
                Ok(Some(update)) => outcome.updated.push(update),
                Ok(None) => {}
                Err(ServiceError::Fetch(e)) => {
                    warn!("Skipping source {}: {}", source.id, e);
                    outcome.failed.push(RefreshFailure {
                        source_id: source.id.clone(),
                        source_url: source.source_url.clone(),
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Refresh complete: {} changed, {} failed, {} unchanged",
            outcome.updated.len(),
            outcome.failed.len(),
            sources.len() - outcome.updated.len() - outcome.failed.len()
        );
        Ok(outcome)
    }

    async fn refresh_source(&self, source: &Source) -> ServiceResult<Option<SourceContentUpdate>> {
        let html = self.fetcher.fetch(&source.source_url).await?;
        let page = extract_readable(&html);

        let latest = self
            .source_contents
            .latest_for_url(&source.source_url)
            .await?;
        if latest
            .as_ref()
            .is_some_and(|latest| latest.matches(&page.title, &page.content))
        {
            debug!("No change for {}", source.source_url);
            return Ok(None);
        }

        let stored = self
            .source_contents
            .create(&SourceContentCreateRequest {
                source_url: source.source_url.clone(),
                title: page.title,
                content: page.content,
            })
            .await?;
        info!("New content {} for source {}", stored.id, source.id);

        if let Some(tagger) = &self.tagger {
            match tagger
                .tag(&source.source_url, &stored.title, &stored.content)
                .await
            {
                Ok(tags) => {
                    self.sources.update_tags(&source.id, &tags).await?;
                    info!("Source {} tagged {:?}", source.id, tags);
                }
                Err(e) => warn!("Tagging source {} failed, keeping old tags: {}", source.id, e),
            }
        }

        Ok(Some(SourceContentUpdate {
            source_id: source.id.clone(),
            source_url: stored.source_url,
            title: stored.title,
            content: stored.content,
        }))
    }
}
