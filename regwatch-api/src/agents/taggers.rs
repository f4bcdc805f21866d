//! Regulation tagging agents for features and sources

use super::prompts::{PromptLibrary, TagVocabulary, FEATURE_TAGGING_TEMPLATE, SOURCE_TAGGING_TEMPLATE};
use super::AgentError;
use crate::llm::{LlmClient, StructuredRequest};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

const OUTPUT_NAME: &str = "record_regulation_tags";

#[derive(Debug, Deserialize)]
struct TaggingResponse {
    tags: Vec<String>,
}

pub struct FeatureTagger {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLibrary,
}

impl FeatureTagger {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLibrary) -> Self {
        Self { llm, prompts }
    }

    pub async fn tag(&self, name: &str, description: &str) -> Result<Vec<String>, AgentError> {
        let (system, vocabulary) = self
            .prompts
            .render_with_tags(FEATURE_TAGGING_TEMPLATE)
            .await?;
        let messages = vec![format!("Feature: {} {}", name, description)];

        request_tags(self.llm.as_ref(), system, messages, &vocabulary).await
    }
}

pub struct SourceTagger {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLibrary,
}

impl SourceTagger {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLibrary) -> Self {
        Self { llm, prompts }
    }

    pub async fn tag(
        &self,
        source_url: &str,
        title: &str,
        content: &str,
    ) -> Result<Vec<String>, AgentError> {
        let (system, vocabulary) = self
            .prompts
            .render_with_tags(SOURCE_TAGGING_TEMPLATE)
            .await?;
        let messages = vec![
            format!("Source: {}", source_url),
            format!("Source Content: {}\n\n{}", title, content),
        ];

        request_tags(self.llm.as_ref(), system, messages, &vocabulary).await
    }
}

async fn request_tags(
    llm: &dyn LlmClient,
    system: String,
    messages: Vec<String>,
    vocabulary: &TagVocabulary,
) -> Result<Vec<String>, AgentError> {
    let request = StructuredRequest {
        system,
        messages,
        output_name: OUTPUT_NAME.to_string(),
        output_description: "Record the regulation tags that apply".to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "tags": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Tags from the available regulation tag list"
                }
            },
            "required": ["tags"]
        }),
    };

    let output = llm.structured(request).await?;
    let response: TaggingResponse =
        serde_json::from_value(output).map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

    Ok(retain_known_tags(response.tags, vocabulary))
}

/// Drop unknown and duplicate tags, keeping first-seen order
fn retain_known_tags(tags: Vec<String>, vocabulary: &TagVocabulary) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !vocabulary.contains(&tag) {
            warn!("Dropping unknown regulation tag '{}'", tag);
        } else if !kept.contains(&tag) {
            kept.push(tag);
        }
    }
    debug!("Tagged with {:?}", kept);
    kept
}
