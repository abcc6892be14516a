//! Application constants and runtime configuration.
//!
//! Everything tunable comes from the process environment. `StratifyConfig::from_lookup`
//! takes an injected lookup so tests never touch the real environment.

use chrono::NaiveDate;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Stratify";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Primary credential variable, then the legacy name used by the browser build.
pub const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Fast multimodal model used for transcription.
pub const DEFAULT_VISION_MODEL: &str = "gemini-2.5-flash";
/// Stronger model used for classification, synthesis and chat.
pub const DEFAULT_REASONING_MODEL: &str = "gemini-3-pro-preview";

/// Low temperature for extraction accuracy.
pub const TRANSCRIPTION_TEMPERATURE: f32 = 0.2;
pub const CLASSIFICATION_TEMPERATURE: f32 = 0.3;
/// Slightly higher for creative synthesis.
pub const SYNTHESIS_TEMPERATURE: f32 = 0.5;

/// Date the synthesis prompt anchors relative dates to.
pub const DEFAULT_REFERENCE_DATE: &str = "2025-12-01";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API key is missing: set GEMINI_API_KEY (or API_KEY)")]
    MissingCredential,

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// True for debug builds.
pub fn is_dev() -> bool {
    cfg!(debug_assertions)
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if is_dev() {
        "info,stratify_lib=debug"
    } else {
        "info"
    }
}

/// Per-stage model selection and sampling settings.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSettings {
    pub model: String,
    pub temperature: f32,
}

/// Runtime configuration for the pipeline and the chat assistant.
#[derive(Clone)]
pub struct StratifyConfig {
    api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub transcription: StageSettings,
    pub classification: StageSettings,
    pub synthesis: StageSettings,
    pub chat_model: String,
    pub reference_date: NaiveDate,
}

impl std::fmt::Debug for StratifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StratifyConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("transcription", &self.transcription)
            .field("classification", &self.classification)
            .field("synthesis", &self.synthesis)
            .field("chat_model", &self.chat_model)
            .field("reference_date", &self.reference_date)
            .finish()
    }
}

impl StratifyConfig {
    /// Load from the process environment. Fails fast without an API key.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|var| lookup(var))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
            .ok_or(ConfigError::MissingCredential)?;

        let mut config = Self::with_api_key(api_key);

        if let Some(url) = non_empty(lookup("STRATIFY_API_BASE_URL")) {
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = non_empty(lookup("STRATIFY_TIMEOUT_SECS")) {
            config.timeout_secs = match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "STRATIFY_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            };
        }

        if let Some(model) = non_empty(lookup("STRATIFY_VISION_MODEL")) {
            config.transcription.model = model;
        }

        if let Some(model) = non_empty(lookup("STRATIFY_REASONING_MODEL")) {
            config.classification.model = model.clone();
            config.synthesis.model = model.clone();
            config.chat_model = model;
        }

        if let Some(raw) = non_empty(lookup("STRATIFY_REFERENCE_DATE")) {
            config.reference_date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                ConfigError::InvalidValue {
                    var: "STRATIFY_REFERENCE_DATE",
                    value: raw.clone(),
                }
            })?;
        }

        Ok(config)
    }

    /// Defaults with an explicit key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            transcription: StageSettings {
                model: DEFAULT_VISION_MODEL.to_string(),
                temperature: TRANSCRIPTION_TEMPERATURE,
            },
            classification: StageSettings {
                model: DEFAULT_REASONING_MODEL.to_string(),
                temperature: CLASSIFICATION_TEMPERATURE,
            },
            synthesis: StageSettings {
                model: DEFAULT_REASONING_MODEL.to_string(),
                temperature: SYNTHESIS_TEMPERATURE,
            },
            chat_model: DEFAULT_REASONING_MODEL.to_string(),
            reference_date: default_reference_date(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

fn default_reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 1).unwrap_or_default()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
