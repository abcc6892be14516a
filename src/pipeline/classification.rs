//! Stage 2: snippets → typed items plus the relation graph between them.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::Instrument;

use super::gemini::{GenerateRequest, ModelClient, Part};
use super::parser::decode_response;
use super::prompt::{classification_input, CLASSIFICATION_PROMPT};
use super::StageError;
use crate::config::StageSettings;
use crate::models::{ClassificationResult, Snippet};

/// Classification output after the integrity pass, plus what the pass removed.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub result: ClassificationResult,
    pub warnings: Vec<String>,
}

pub struct Classifier {
    client: Arc<dyn ModelClient>,
    settings: StageSettings,
}

impl Classifier {
    pub fn new(client: Arc<dyn ModelClient>, settings: StageSettings) -> Self {
        Self { client, settings }
    }

    pub fn build_request(&self, snippets: &[Snippet]) -> Result<GenerateRequest, StageError> {
        let input = classification_input(snippets)
            .map_err(|e| StageError::Invalid(format!("Could not serialize snippets: {e}")))?;
        Ok(GenerateRequest::json(
            &self.settings.model,
            vec![Part::text(CLASSIFICATION_PROMPT), Part::text(input)],
            self.settings.temperature,
        ))
    }

    /// Classify snippets. Items and relations that do not hold together are
    /// dropped before anything reaches synthesis.
    pub async fn classify(&self, snippets: &[Snippet]) -> Result<ClassificationResult, StageError> {
        let span = tracing::info_span!(
            "classification",
            model = %self.settings.model,
            snippet_count = snippets.len(),
        );

        async {
            let start = std::time::Instant::now();
            let request = self.build_request(snippets)?;
            let response = self.client.generate(&request).await?;
            let decoded: ClassificationResult = decode_response(&response)?;
            let report = check_integrity(decoded, snippets);

            tracing::info!(
                elapsed_ms = %start.elapsed().as_millis(),
                item_count = report.result.items.len(),
                relation_count = report.result.relations.len(),
                warnings = report.warnings.len(),
                "Classification complete"
            );

            Ok::<_, StageError>(report.result)
        }
        .instrument(span)
        .await
    }
}

/// Enforce referential integrity between snippets, items and relations.
///
/// Items must name an existing snippet and appear once (first wins).
/// Relations must join two surviving items.
pub fn check_integrity(mut result: ClassificationResult, snippets: &[Snippet]) -> IntegrityReport {
    let mut warnings = Vec::new();
    let snippet_ids: HashSet<&str> = snippets.iter().map(|s| s.id.as_str()).collect();

    let mut item_ids: HashSet<String> = HashSet::with_capacity(result.items.len());
    result.items.retain(|item| {
        if !snippet_ids.contains(item.id.as_str()) {
            warnings.push(format!("Item '{}' has no source snippet, removed", item.id));
            return false;
        }
        if !item_ids.insert(item.id.clone()) {
            warnings.push(format!("Duplicate item '{}' removed", item.id));
            return false;
        }
        true
    });

    result.relations.retain(|relation| {
        let joined = item_ids.contains(&relation.source) && item_ids.contains(&relation.target);
        if !joined {
            warnings.push(format!(
                "Dangling relation {} -{}-> {} removed",
                relation.source,
                relation.relation_type.as_str(),
                relation.target
            ));
        }
        joined
    });

    for warning in &warnings {
        tracing::warn!(%warning, "Classification integrity");
    }

    IntegrityReport { result, warnings }
}
