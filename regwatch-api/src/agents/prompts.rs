//! Prompt templates and the regulation tag vocabulary
//!
//! Files are read on every call so edits on disk take effect without a
//! restart.

use super::AgentError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const COMPLIANCE_ANALYZER_TEMPLATE: &str = "compliance_analyzer.md";
pub const FEATURE_TAGGING_TEMPLATE: &str = "feature_tagging.md";
pub const SOURCE_TAGGING_TEMPLATE: &str = "source_tagging.md";
pub const TAG_VOCABULARY_FILE: &str = "regulation_tags.json";

/// Placeholder replaced by the rendered vocabulary
pub const AVAILABLE_TAGS_PLACEHOLDER: &str = "{available_tags}";

#[derive(Debug, Clone)]
pub struct PromptLibrary {
    dir: PathBuf,
}

impl PromptLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Templates shipped with the crate
    pub fn bundled() -> Self {
        Self::new(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn template(&self, name: &str) -> Result<String, AgentError> {
        let path = self.dir.join(name);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| AgentError::Template { path, source })
    }

    pub async fn vocabulary(&self) -> Result<TagVocabulary, AgentError> {
        let raw = self.template(TAG_VOCABULARY_FILE).await?;
        TagVocabulary::parse(&raw)
    }

    /// Template `name` with the tag vocabulary substituted in
    pub async fn render_with_tags(
        &self,
        name: &str,
    ) -> Result<(String, TagVocabulary), AgentError> {
        let template = self.template(name).await?;
        let vocabulary = self.vocabulary().await?;
        let rendered = template.replace(AVAILABLE_TAGS_PLACEHOLDER, &vocabulary.render());
        Ok((rendered, vocabulary))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegulationTag {
    pub tag: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagVocabulary {
    regulation_tags: Vec<RegulationTag>,
}

impl TagVocabulary {
    pub fn parse(raw: &str) -> Result<Self, AgentError> {
        let vocabulary: TagVocabulary =
            serde_json::from_str(raw).map_err(|e| AgentError::Vocabulary(e.to_string()))?;
        if vocabulary.regulation_tags.is_empty() {
            return Err(AgentError::Vocabulary("no regulation tags defined".into()));
        }
        Ok(vocabulary)
    }

    pub fn tags(&self) -> &[RegulationTag] {
        &self.regulation_tags
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.regulation_tags.iter().any(|known| known.tag == tag)
    }

    /// Bullet list injected into tagging prompts
    pub fn render(&self) -> String {
        self.regulation_tags
            .iter()
            .map(|tag| {
                format!(
                    "• **{}** - {}\n  Description: {}\n  Examples: {}",
                    tag.tag,
                    tag.name,
                    tag.description,
                    tag.examples.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
