pub mod config;
pub mod models;
pub mod pipeline; // Transcription → Classification → Synthesis
pub mod chat; // Strategy assistant
pub mod dashboard; // Summary, roadmap, risk and stakeholder views
pub mod export; // JSON + PDF report

use tracing_subscriber::EnvFilter;

pub use pipeline::{PipelineError, PipelineSession, PipelineState, PipelineStep, StrategyPipeline};

/// Install the global tracing subscriber. `RUST_LOG` wins over the build default.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
