//! Compliance analyzer agent
//!
//! Compares one feature against regulatory source content and proposes a
//! status change.

use super::prompts::{PromptLibrary, COMPLIANCE_ANALYZER_TEMPLATE};
use super::AgentError;
use crate::llm::{LlmClient, StructuredRequest};
use futures::future::try_join_all;
use regwatch_common::models::{Feature, FeatureStatus, SourceContent};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

const OUTPUT_NAME: &str = "record_compliance_assessment";

/// Structured answer of the analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceAssessment {
    pub needs_action: bool,
    pub original_status: FeatureStatus,
    pub status_change_to: FeatureStatus,
    pub reason: String,
    pub confidence: f64,
}

impl ComplianceAssessment {
    fn validate(self) -> Result<Self, AgentError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(AgentError::InvalidResponse(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        Ok(self)
    }
}

/// An assessment tied to the feature it was requested for
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureAssessment {
    pub feature_id: String,
    pub assessment: ComplianceAssessment,
}

pub struct ComplianceAnalyzer {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLibrary,
}

impl ComplianceAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLibrary) -> Self {
        Self { llm, prompts }
    }

    /// Analyze every feature against the same source contents, concurrently
    ///
    /// Results carry the id of the feature they answer for. The first failure
    /// fails the whole call.
    pub async fn analyze(
        &self,
        features: &[Feature],
        source_contents: &[SourceContent],
    ) -> Result<Vec<FeatureAssessment>, AgentError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let system = self.prompts.template(COMPLIANCE_ANALYZER_TEMPLATE).await?;
        let sources_block = format_source_contents(source_contents);

        info!(
            "Analyzing {} feature(s) against {} source content(s) with {}",
            features.len(),
            source_contents.len(),
            self.llm.model()
        );

        let calls = features.iter().map(|feature| {
            let system = system.clone();
            let sources_block = sources_block.clone();
            async move {
                let assessment = self.assess(feature, system, sources_block).await?;
                Ok::<_, AgentError>(FeatureAssessment {
                    feature_id: feature.id.clone(),
                    assessment,
                })
            }
        });

        try_join_all(calls).await
    }

    async fn assess(
        &self,
        feature: &Feature,
        system: String,
        sources_block: String,
    ) -> Result<ComplianceAssessment, AgentError> {
        let request = StructuredRequest {
            system,
            messages: vec![
                format!("Feature to Analyze:\n{}", format_feature(feature)),
                format!("Regulatory Source Content:\n{}", sources_block),
            ],
            output_name: OUTPUT_NAME.to_string(),
            output_description: "Record the compliance assessment of the feature".to_string(),
            schema: assessment_schema(),
        };

        let output = self.llm.structured(request).await?;
        let assessment: ComplianceAssessment = serde_json::from_value(output)
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        debug!(
            "Feature {}: needs_action={}, {} -> {} (confidence {:.2})",
            feature.id,
            assessment.needs_action,
            assessment.original_status,
            assessment.status_change_to,
            assessment.confidence
        );
        assessment.validate()
    }
}

fn format_feature(feature: &Feature) -> String {
    format!(
        "Name: {}\nDescription: {}\nCurrent Status: {}",
        feature.name, feature.description, feature.status
    )
}

fn format_source_contents(source_contents: &[SourceContent]) -> String {
    source_contents
        .iter()
        .enumerate()
        .map(|(i, content)| {
            format!(
                "Source {}:\nURL: {}\nContent: {}",
                i + 1,
                content.source_url,
                content.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn assessment_schema() -> serde_json::Value {
    let statuses: Vec<&str> = FeatureStatus::ALL.iter().map(|s| s.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "needs_action": {
                "type": "boolean",
                "description": "Whether the feature's status should change"
            },
            "original_status": {
                "type": "string",
                "enum": statuses,
                "description": "The feature's current status"
            },
            "status_change_to": {
                "type": "string",
                "enum": statuses,
                "description": "The status the feature should move to"
            },
            "reason": {
                "type": "string",
                "description": "Explanation citing the regulatory content"
            },
            "confidence": {
                "type": "number",
                "minimum": 0,
                "maximum": 1
            }
        },
        "required": ["needs_action", "original_status", "status_change_to", "reason", "confidence"]
    })
}
