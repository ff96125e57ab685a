//! Pulse-check calls layered on top of a completed case: casting a vote for one
//! survey question and reading back the answers recorded so far.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{ErrorReporting, Settings};
use crate::dto::{SurveyAnswer, VoteRequest};
use crate::error::{AppError, Result};

pub const VOTE_PATH: &str = "/api/vote";
pub const ANSWERS_PATH: &str = "/api/answers";

/// Best-effort survey operations. Neither method fails.
#[async_trait]
pub trait SurveyGateway: Send + Sync {
    /// True when the backend accepted the vote.
    async fn submit_vote(&self, vote: &VoteRequest) -> bool;
    /// Recorded answers, or an empty list on any failure.
    async fn fetch_answers(&self, survey_id: &str) -> Vec<SurveyAnswer>;
}

pub struct SurveyClient {
    http: Client,
    base_url: String,
    reporting: ErrorReporting,
}

impl SurveyClient {
    pub fn new(
        base_url: &str,
        reporting: ErrorReporting,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AppError::Internal(format!("building survey client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            reporting,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.api_base(),
            settings.survey_error_reporting,
            settings.request_timeout(),
        )
    }

    fn report(&self, operation: &str, err: &AppError) {
        match self.reporting {
            ErrorReporting::Log => warn!(operation, "survey call failed: {err}"),
            ErrorReporting::Silent => debug!(operation, "survey call failed: {err}"),
        }
    }

    async fn post_vote(&self, vote: &VoteRequest) -> Result<()> {
        let url = format!("{}{}", self.base_url, VOTE_PATH);
        debug!(%url, question_index = vote.question_index, score = vote.score, "\u{2192} vote");
        self.http
            .post(&url)
            .json(vote)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn get_answers(&self, survey_id: &str) -> Result<Vec<SurveyAnswer>> {
        let url = format!(
            "{}{}/{}",
            self.base_url,
            ANSWERS_PATH,
            urlencoding::encode(survey_id)
        );
        debug!(%url, "\u{2192} answers");
        let res = self.http.get(&url).send().await?.error_for_status()?;
        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl SurveyGateway for SurveyClient {
    async fn submit_vote(&self, vote: &VoteRequest) -> bool {
        match self.post_vote(vote).await {
            Ok(()) => true,
            Err(e) => {
                self.report("submit_vote", &e);
                false
            }
        }
    }

    async fn fetch_answers(&self, survey_id: &str) -> Vec<SurveyAnswer> {
        match self.get_answers(survey_id).await {
            Ok(answers) => {
                debug!(survey_id, count = answers.len(), "answers fetched");
                answers
            }
            Err(e) => {
                self.report("fetch_answers", &e);
                Vec::new()
            }
        }
    }
}
