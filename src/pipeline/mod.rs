pub mod gemini;
pub mod image;
pub mod prompt;
pub mod parser;
pub mod transcription;
pub mod classification;
pub mod synthesis;
pub mod orchestrator;
pub mod demo;

use std::sync::Arc;

use thiserror::Error;

use crate::config::StratifyConfig;
use gemini::{GeminiClient, GeminiError, ModelClient};
use image::ImageError;

pub use classification::Classifier;
pub use orchestrator::{PipelineSession, PipelineState, PipelineStep};
pub use synthesis::Synthesizer;
pub use transcription::Transcriber;

/// The three model-backed stages, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcription,
    Classification,
    Synthesis,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::Classification => "classification",
            Self::Synthesis => "synthesis",
        }
    }
}

/// Failure inside a single stage.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Model(#[from] GeminiError),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Invalid model output: {0}")]
    Invalid(String),
}

/// Failure of a whole pipeline run, as surfaced to the user.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("API key is missing")]
    MissingCredential,

    #[error("Transcription failed: {0}")]
    Transcription(#[source] StageError),

    #[error("Classification failed: {0}")]
    Classification(#[source] StageError),

    #[error("Synthesis failed: {0}")]
    Synthesis(#[source] StageError),

    #[error("Could not read image: {0}")]
    Upload(#[from] ImageError),

    #[error("Could not set up the model client: {0}")]
    Setup(#[source] GeminiError),

    #[error("An analysis is already in progress")]
    Busy,

    #[error("Analysis was discarded by a reset")]
    Discarded,
}

impl PipelineError {
    /// Attribute a stage failure to its stage. A missing key is reported as such
    /// no matter which stage tripped over it.
    pub fn at(stage: Stage, err: StageError) -> Self {
        if matches!(err, StageError::Model(GeminiError::MissingCredential)) {
            return Self::MissingCredential;
        }
        match stage {
            Stage::Transcription => Self::Transcription(err),
            Stage::Classification => Self::Classification(err),
            Stage::Synthesis => Self::Synthesis(err),
        }
    }

    /// Failure while building the client, before any stage ran.
    pub fn setup(err: GeminiError) -> Self {
        match err {
            GeminiError::MissingCredential => Self::MissingCredential,
            other => Self::Setup(other),
        }
    }

    /// The stage that failed, if the failure came from one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Transcription(_) => Some(Stage::Transcription),
            Self::Classification(_) => Some(Stage::Classification),
            Self::Synthesis(_) => Some(Stage::Synthesis),
            _ => None,
        }
    }
}

/// The three stages wired to one model client.
pub struct StrategyPipeline {
    pub transcriber: Transcriber,
    pub classifier: Classifier,
    pub synthesizer: Synthesizer,
}

impl StrategyPipeline {
    /// Build against the live provider. Fails fast without an API key.
    pub fn from_config(config: &StratifyConfig) -> Result<Self, GeminiError> {
        let client: Arc<dyn ModelClient> = Arc::new(GeminiClient::from_config(config)?);
        Ok(Self::with_client(client, config))
    }

    /// Build against any client (mocks in tests).
    pub fn with_client(client: Arc<dyn ModelClient>, config: &StratifyConfig) -> Self {
        Self {
            transcriber: Transcriber::new(client.clone(), config.transcription.clone()),
            classifier: Classifier::new(client.clone(), config.classification.clone()),
            synthesizer: Synthesizer::new(
                client,
                config.synthesis.clone(),
                config.reference_date,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_wins_over_stage() {
        let err = PipelineError::at(
            Stage::Classification,
            StageError::Model(GeminiError::MissingCredential),
        );
        assert!(matches!(err, PipelineError::MissingCredential));
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn stage_errors_keep_their_stage() {
        let err = PipelineError::at(Stage::Synthesis, StageError::JsonParsing("eof".into()));
        assert_eq!(err.stage(), Some(Stage::Synthesis));
        assert_eq!(err.to_string(), "Synthesis failed: JSON parsing error: eof");
    }

    #[test]
    fn model_errors_read_naturally() {
        let err = PipelineError::at(
            Stage::Transcription,
            StageError::Model(GeminiError::EmptyResponse),
        );
        assert_eq!(err.to_string(), "Transcription failed: No response from the model");
    }

    #[test]
    fn from_config_requires_key() {
        let config = StratifyConfig::with_api_key("");
        assert!(matches!(
            StrategyPipeline::from_config(&config),
            Err(GeminiError::MissingCredential)
        ));
    }
}
