use std::time::Duration;

use serde::Deserialize;

fn default_api_base() -> String {
    "http://localhost:8001".into()
}

/// Which local generator stands in for the backend.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SynthesizerMode {
    /// Random classification drawn per call, single-ticket plan.
    #[default]
    Randomized,
    /// Fixed two-ticket payload with a mock survey link.
    Canned,
}

/// What the analysis client does when the backend call fails.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Fall back to the synthesizer and report success.
    #[default]
    Mask,
    /// Hand the failure to the caller.
    Surface,
}

/// How swallowed survey call failures are reported.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorReporting {
    #[default]
    Log,
    Silent,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub synthesizer: SynthesizerMode,
    #[serde(default)]
    pub synth_seed: Option<u64>,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default)]
    pub survey_error_reporting: ErrorReporting,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            synthesizer: SynthesizerMode::default(),
            synth_seed: None,
            failure_policy: FailurePolicy::default(),
            survey_error_reporting: ErrorReporting::default(),
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Reads `MIRRORLOOP_*` environment variables on top of the defaults.
    pub fn new() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("MIRRORLOOP")
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Base address without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
