//! Stage 3: classified structure → strategy document.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::Instrument;

use super::gemini::{GenerateRequest, ModelClient, Part};
use super::parser::decode_response;
use super::prompt::{synthesis_input, synthesis_prompt};
use super::StageError;
use crate::config::StageSettings;
use crate::models::{ClassificationResult, StrategyResult};

pub struct Synthesizer {
    client: Arc<dyn ModelClient>,
    settings: StageSettings,
    reference_date: NaiveDate,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn ModelClient>, settings: StageSettings, reference_date: NaiveDate) -> Self {
        Self {
            client,
            settings,
            reference_date,
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn build_request(&self, classified: &ClassificationResult) -> Result<GenerateRequest, StageError> {
        let input = synthesis_input(classified)
            .map_err(|e| StageError::Invalid(format!("Could not serialize classification: {e}")))?;
        Ok(GenerateRequest::json(
            &self.settings.model,
            vec![Part::text(synthesis_prompt(self.reference_date)), Part::text(input)],
            self.settings.temperature,
        ))
    }

    /// Produce the strategy document. Missing collections fail the stage.
    pub async fn synthesize(&self, classified: &ClassificationResult) -> Result<StrategyResult, StageError> {
        let span = tracing::info_span!(
            "synthesis",
            model = %self.settings.model,
            item_count = classified.items.len(),
            reference_date = %self.reference_date,
        );

        async {
            let start = std::time::Instant::now();
            let request = self.build_request(classified)?;
            let response = self.client.generate(&request).await?;
            let strategy: StrategyResult = decode_response(&response)?;
            let strategy = prune_blank_entries(strategy);

            tracing::info!(
                elapsed_ms = %start.elapsed().as_millis(),
                okrs = strategy.okrs.len(),
                action_items = strategy.action_items.len(),
                timeline = strategy.timeline.len(),
                risks = strategy.risks.len(),
                automations = strategy.automations.len(),
                "Synthesis complete"
            );

            Ok::<_, StageError>(strategy)
        }
        .instrument(span)
        .await
    }
}

/// Remove OKRs without an objective and actions without a title.
fn prune_blank_entries(mut strategy: StrategyResult) -> StrategyResult {
    let okrs = strategy.okrs.len();
    strategy.okrs.retain(|okr| !okr.objective.trim().is_empty());
    let actions = strategy.action_items.len();
    strategy.action_items.retain(|action| !action.title.trim().is_empty());

    let removed_okrs = okrs - strategy.okrs.len();
    let removed_actions = actions - strategy.action_items.len();
    if removed_okrs + removed_actions > 0 {
        tracing::warn!(removed_okrs, removed_actions, "Blank strategy entries removed");
    }

    strategy
}
