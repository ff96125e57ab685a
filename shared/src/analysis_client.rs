//! Backend analysis of a complaint, with the local synthesizer as fallback.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{FailurePolicy, Settings};
use crate::dto::{AnalysisOutcome, ApiResult, ComplaintInput, Provenance};
use crate::error::{AppError, Result};
use crate::synthesizer::Synthesizer;

pub const FEEDBACK_PATH: &str = "/api/feedback";

/// Turns a complaint into a case record.
///
/// The orchestrator only sees this seam, so tests can swap in a fake.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, input: &ComplaintInput) -> Result<AnalysisOutcome>;
}

/// Posts complaints to the backend and falls back to the local synthesizer.
///
/// Under [`FailurePolicy::Mask`] `analyze` always resolves to `Ok`: transport
/// failures, non-success statuses and undecodable bodies all yield a
/// synthesized case. Under [`FailurePolicy::Surface`] those failures are
/// returned instead. A decoded body is passed through without further checks.
///
/// # Example
/// ```rust,no_run
/// use shared::analysis_client::{AnalysisClient, Analyzer};
/// use shared::config::Settings;
/// use shared::dto::ComplaintInput;
///
/// #[tokio::main]
/// async fn main() {
///     let client = AnalysisClient::from_settings(&Settings::default()).unwrap();
///     let input = ComplaintInput::new("The checkout button kept spinning.");
///     let outcome = client.analyze(&input).await.unwrap();
///     println!("{} ({})", outcome.result.case_id, outcome.provenance);
/// }
/// ```
pub struct AnalysisClient {
    http: Client,
    base_url: String,
    synthesizer: Arc<Synthesizer>,
    failure_policy: FailurePolicy,
}

impl AnalysisClient {
    pub fn new(
        base_url: &str,
        synthesizer: Arc<Synthesizer>,
        failure_policy: FailurePolicy,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AppError::Internal(format!("building analysis client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            synthesizer,
            failure_policy,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let synthesizer = Arc::new(Synthesizer::new(settings.synthesizer, settings.synth_seed));
        Self::new(
            settings.api_base(),
            synthesizer,
            settings.failure_policy,
            settings.request_timeout(),
        )
    }

    async fn request_remote(&self, input: &ComplaintInput) -> Result<ApiResult> {
        let url = format!("{}{}", self.base_url, FEEDBACK_PATH);
        debug!(%url, "\u{2192} feedback request");
        let res = self
            .http
            .post(&url)
            .json(input)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;
        debug!(
            %status,
            "\u{2190} body = {}",
            String::from_utf8_lossy(&bytes[..bytes.len().min(1024)])
        );

        if !status.is_success() {
            return Err(AppError::Http(status.as_u16()));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze(&self, input: &ComplaintInput) -> Result<AnalysisOutcome> {
        match self.request_remote(input).await {
            Ok(result) => {
                info!(case_id = %result.case_id, "backend analysis received");
                Ok(AnalysisOutcome {
                    result,
                    provenance: Provenance::Live,
                })
            }
            // the caller reports surfaced failures
            Err(e) if self.failure_policy == FailurePolicy::Surface => {
                debug!("backend analysis failed: {e}");
                Err(e)
            }
            Err(e) => {
                warn!("backend analysis failed, using synthesized case: {e}");
                Ok(AnalysisOutcome {
                    result: self.synthesizer.synthesize(input),
                    provenance: Provenance::Synthesized,
                })
            }
        }
    }
}
