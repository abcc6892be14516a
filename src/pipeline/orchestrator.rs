//! Pipeline session: owns the single `PipelineState` and drives one run at a
//! time through transcription, classification and synthesis.
//!
//! Observers subscribe to state snapshots through a `watch` channel. Each run
//! carries a run id; a run writes state only while its id is still current,
//! so `reset()` makes any in-flight result disappear.

use std::future::Future;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use super::demo::{reference_strategy, DemoScript, DEMO_PREVIEW_URL};
use super::image::{read_image, ImageUpload};
use super::{PipelineError, Stage, StageError, StrategyPipeline};
use crate::config::StratifyConfig;
use crate::models::{ClassificationResult, Snippet, StrategyResult};

// ──────────────────────────────────────────────
// State
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStep {
    #[default]
    Idle,
    Transcribing,
    Classifying,
    Synthesizing,
    Complete,
    Error,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Transcribing => "TRANSCRIBING",
            Self::Classifying => "CLASSIFYING",
            Self::Synthesizing => "SYNTHESIZING",
            Self::Complete => "COMPLETE",
            Self::Error => "ERROR",
        }
    }

    /// A new image may start a run from here.
    pub fn accepts_upload(&self) -> bool {
        matches!(self, Self::Idle | Self::Complete | Self::Error)
    }

    pub fn is_working(&self) -> bool {
        matches!(self, Self::Transcribing | Self::Classifying | Self::Synthesizing)
    }
}

/// Snapshot of a session, as shown to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineState {
    pub step: PipelineStep,
    pub snippets: Vec<Snippet>,
    pub classified: Option<ClassificationResult>,
    pub strategy: Option<StrategyResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_preview: Option<String>,
    #[serde(skip)]
    run_id: Option<Uuid>,
}

impl PipelineState {
    /// Id of the run that produced this state, if any.
    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }
}

// ──────────────────────────────────────────────
// Session
// ──────────────────────────────────────────────

pub struct PipelineSession {
    pipeline: StrategyPipeline,
    state: watch::Sender<PipelineState>,
}

impl PipelineSession {
    pub fn new(pipeline: StrategyPipeline) -> Self {
        let (state, _) = watch::channel(PipelineState::default());
        Self { pipeline, state }
    }

    /// Session against the live provider. Fails fast without an API key.
    pub fn from_config(config: &StratifyConfig) -> Result<Self, PipelineError> {
        let pipeline = StrategyPipeline::from_config(config).map_err(PipelineError::setup)?;
        Ok(Self::new(pipeline))
    }

    /// Current snapshot.
    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    /// Receive every later snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Back to `Idle` with nothing retained. Discards any in-flight run.
    pub fn reset(&self) {
        let previous = self.state.send_replace(PipelineState::default());
        if previous.step.is_working() {
            tracing::info!(
                step = previous.step.as_str(),
                run_id = ?previous.run_id,
                "Reset discarded in-flight run"
            );
        } else {
            tracing::debug!("Pipeline reset");
        }
    }

    /// Read an image from disk and run the pipeline on it.
    pub async fn begin_from_path(&self, path: impl AsRef<Path>) -> Result<StrategyResult, PipelineError> {
        if !self.state.borrow().step.accepts_upload() {
            return Err(PipelineError::Busy);
        }
        let image = read_image(path).await?;
        self.begin(image).await
    }

    /// Run all three stages on `image`. Refused while another run is working.
    pub async fn begin(&self, image: ImageUpload) -> Result<StrategyResult, PipelineError> {
        let run_id = self.start_run(image.preview_data_url())?;
        let _guard = RunGuard::new(&self.state, run_id);
        let span = tracing::info_span!(
            "pipeline_run",
            %run_id,
            image_digest = %image.digest(),
        );

        async {
            let start = std::time::Instant::now();

            let snippets = self
                .stage(run_id, Stage::Transcription, self.pipeline.transcriber.transcribe(&image))
                .await?;
            self.advance(run_id, PipelineStep::Classifying, |state| {
                state.snippets = snippets.clone();
            })?;

            let classified = self
                .stage(run_id, Stage::Classification, self.pipeline.classifier.classify(&snippets))
                .await?;
            self.advance(run_id, PipelineStep::Synthesizing, |state| {
                state.classified = Some(classified.clone());
            })?;

            let strategy = self
                .stage(run_id, Stage::Synthesis, self.pipeline.synthesizer.synthesize(&classified))
                .await?;
            self.advance(run_id, PipelineStep::Complete, |state| {
                state.strategy = Some(strategy.clone());
            })?;

            tracing::info!(elapsed_ms = %start.elapsed().as_millis(), "Pipeline run complete");
            Ok::<_, PipelineError>(strategy)
        }
        .instrument(span)
        .await
    }

    /// Walk the state machine on a timer and finish with the reference
    /// strategy. Never calls the model.
    pub async fn run_demo(&self, script: &DemoScript) -> Result<StrategyResult, PipelineError> {
        let run_id = self.start_run(DEMO_PREVIEW_URL.to_string())?;
        let _guard = RunGuard::new(&self.state, run_id);
        tracing::info!(%run_id, "Demo run started");

        tokio::time::sleep(script.transcribing).await;
        self.advance(run_id, PipelineStep::Classifying, |_| {})?;

        tokio::time::sleep(script.classifying).await;
        self.advance(run_id, PipelineStep::Synthesizing, |_| {})?;

        tokio::time::sleep(script.synthesizing).await;
        let strategy = reference_strategy();
        self.advance(run_id, PipelineStep::Complete, |state| {
            state.snippets.clear();
            state.classified = None;
            state.strategy = Some(strategy.clone());
            state.image_preview = None;
        })?;

        Ok(strategy)
    }

    // ── internals ──

    /// Claim the session for a new run. Checked and written in one step so
    /// two uploads cannot both start.
    fn start_run(&self, image_preview: String) -> Result<Uuid, PipelineError> {
        let run_id = Uuid::new_v4();
        let mut refused_at = None;

        self.state.send_if_modified(|state| {
            if !state.step.accepts_upload() {
                refused_at = Some(state.step);
                return false;
            }
            *state = PipelineState {
                step: PipelineStep::Transcribing,
                image_preview: Some(image_preview),
                run_id: Some(run_id),
                ..PipelineState::default()
            };
            true
        });

        match refused_at {
            Some(step) => {
                tracing::warn!(step = step.as_str(), "Upload refused, run in progress");
                Err(PipelineError::Busy)
            }
            None => {
                tracing::info!(%run_id, step = PipelineStep::Transcribing.as_str(), "Pipeline step");
                Ok(run_id)
            }
        }
    }

    /// Move to `next` and apply `update`, if `run_id` still owns the session.
    fn advance<F>(&self, run_id: Uuid, next: PipelineStep, update: F) -> Result<(), PipelineError>
    where
        F: FnOnce(&mut PipelineState),
    {
        let mut current = false;
        self.state.send_if_modified(|state| {
            if state.run_id != Some(run_id) {
                return false;
            }
            state.step = next;
            update(state);
            current = true;
            true
        });

        if current {
            tracing::info!(%run_id, step = next.as_str(), "Pipeline step");
            Ok(())
        } else {
            tracing::debug!(%run_id, step = next.as_str(), "Stale run, result dropped");
            Err(PipelineError::Discarded)
        }
    }

    /// Await one stage; on failure move the session to `Error`.
    async fn stage<T, Fut>(&self, run_id: Uuid, stage: Stage, work: Fut) -> Result<T, PipelineError>
    where
        Fut: Future<Output = Result<T, StageError>>,
    {
        match work.await {
            Ok(value) => Ok(value),
            Err(err) => Err(self.fail(run_id, PipelineError::at(stage, err))),
        }
    }

    fn fail(&self, run_id: Uuid, err: PipelineError) -> PipelineError {
        let message = err.to_string();
        let mut current = false;
        self.state.send_if_modified(|state| {
            if state.run_id != Some(run_id) {
                return false;
            }
            state.step = PipelineStep::Error;
            state.error = Some(message.clone());
            current = true;
            true
        });

        if current {
            tracing::error!(%run_id, stage = ?err.stage().map(|s| s.as_str()), error = %message, "Pipeline run failed");
            err
        } else {
            tracing::debug!(%run_id, error = %message, "Stale run failed, ignored");
            PipelineError::Discarded
        }
    }
}

/// Sends the session back to `Idle` when a run is dropped mid-step, so an
/// abandoned run does not hold the session busy.
struct RunGuard<'a> {
    state: &'a watch::Sender<PipelineState>,
    run_id: Uuid,
}

impl<'a> RunGuard<'a> {
    fn new(state: &'a watch::Sender<PipelineState>, run_id: Uuid) -> Self {
        Self { state, run_id }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let run_id = self.run_id;
        let released = self.state.send_if_modified(|state| {
            if state.run_id != Some(run_id) || !state.step.is_working() {
                return false;
            }
            *state = PipelineState::default();
            true
        });
        if released {
            tracing::info!(%run_id, "Abandoned run discarded");
        }
    }
}
