//! LLM agents
//!
//! Each agent renders a system prompt from an on-disk template, sends the
//! entity under review as user messages, and validates the structured answer.

mod compliance_analyzer;
mod prompts;
mod taggers;

pub use compliance_analyzer::{ComplianceAnalyzer, ComplianceAssessment, FeatureAssessment};
pub use prompts::{PromptLibrary, RegulationTag, TagVocabulary};
pub use taggers::{FeatureTagger, SourceTagger};

use crate::llm::LlmError;
use std::path::PathBuf;
use thiserror::Error;

/// Agent failures, by cause
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Prompt template {path} could not be read: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tag vocabulary is invalid: {0}")]
    Vocabulary(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Model response failed validation: {0}")]
    InvalidResponse(String),
}
