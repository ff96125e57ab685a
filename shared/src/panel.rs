//! Client-only view state over the current case: the selected tab and the
//! pulse-check loop (votes cast per question, answers fetched on demand).
//!
//! Nothing here is part of the case record. The panel is reset whenever a new
//! case arrives.

use std::collections::BTreeMap;

use strum_macros::{Display, EnumIter, EnumString};
use tracing::{debug, info};

use crate::dto::{ApiResult, SurveyAnswer, VoteRequest};
use crate::survey_client::SurveyGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Tab {
    #[default]
    Structured,
    #[strum(to_string = "Survey Draft", serialize = "survey", serialize = "survey-draft")]
    SurveyDraft,
    #[strum(to_string = "Action Plan", serialize = "plan", serialize = "action-plan")]
    ActionPlan,
    #[strum(to_string = "Raw JSON", serialize = "raw", serialize = "json")]
    RawJson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Marked as voted; `delivered` tells whether the backend accepted it.
    Recorded { delivered: bool },
    /// The question was already voted on; nothing was sent.
    AlreadyVoted,
    /// The case carries no survey to vote on.
    NoSurvey,
    UnknownQuestion,
    InvalidScore,
}

#[derive(Debug, Clone, Default)]
pub struct ResultsPanel {
    tab: Tab,
    voted: BTreeMap<usize, bool>,
    answers: Vec<SurveyAnswer>,
}

impl ResultsPanel {
    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Switches tab unless a submission is in flight.
    pub fn select_tab(&mut self, tab: Tab, loading: bool) -> bool {
        if loading {
            return false;
        }
        self.tab = tab;
        true
    }

    pub fn is_voted(&self, question_index: usize) -> bool {
        self.voted.get(&question_index).copied().unwrap_or(false)
    }

    pub fn answers(&self) -> &[SurveyAnswer] {
        &self.answers
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Casts a 1..=5 vote for one question.
    ///
    /// The question is marked voted before the call goes out, whatever the
    /// call's result. A second vote on the same question is a no-op.
    pub async fn vote(
        &mut self,
        result: &ApiResult,
        question_index: usize,
        score: u8,
        gateway: &dyn SurveyGateway,
    ) -> VoteOutcome {
        if !(1..=5).contains(&score) {
            return VoteOutcome::InvalidScore;
        }
        if question_index >= result.survey_draft.questions.len() {
            return VoteOutcome::UnknownQuestion;
        }
        let Some((survey_id, collector_id)) = result.survey_target() else {
            return VoteOutcome::NoSurvey;
        };
        if self.is_voted(question_index) {
            debug!(question_index, "already voted");
            return VoteOutcome::AlreadyVoted;
        }

        self.voted.insert(question_index, true);
        let vote = VoteRequest {
            survey_id: survey_id.to_string(),
            collector_id: collector_id.to_string(),
            score,
            question_index,
        };
        let delivered = gateway.submit_vote(&vote).await;
        info!(case_id = %result.case_id, question_index, score, delivered, "pulse check vote");
        VoteOutcome::Recorded { delivered }
    }

    /// Replaces the cached answers with the backend's current list.
    pub async fn refresh_answers(
        &mut self,
        result: &ApiResult,
        gateway: &dyn SurveyGateway,
    ) -> &[SurveyAnswer] {
        self.answers = match result.surveymonkey.as_ref().and_then(|s| s.survey_id.as_deref()) {
            Some(survey_id) => gateway.fetch_answers(survey_id).await,
            None => Vec::new(),
        };
        &self.answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthesizerMode;
    use crate::dto::ComplaintInput;
    use crate::synthesizer::Synthesizer;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeGateway {
        accept: bool,
        votes: Mutex<Vec<VoteRequest>>,
        answers: Vec<SurveyAnswer>,
    }

    #[async_trait]
    impl SurveyGateway for FakeGateway {
        async fn submit_vote(&self, vote: &VoteRequest) -> bool {
            self.votes.lock().push(vote.clone());
            self.accept
        }

        async fn fetch_answers(&self, _survey_id: &str) -> Vec<SurveyAnswer> {
            self.answers.clone()
        }
    }

    fn canned_case() -> ApiResult {
        Synthesizer::new(SynthesizerMode::Canned, None)
            .synthesize(&ComplaintInput::new("The delivery arrived two hours late."))
    }

    #[tokio::test]
    async fn vote_marks_question_even_when_delivery_fails() {
        let gateway = FakeGateway::default();
        let mut panel = ResultsPanel::default();
        let case = canned_case();

        let outcome = panel.vote(&case, 1, 4, &gateway).await;
        assert_eq!(outcome, VoteOutcome::Recorded { delivered: false });
        assert!(panel.is_voted(1));
        assert!(!panel.is_voted(0));

        let sent = gateway.votes.lock().clone();
        assert_eq!(
            sent,
            vec![VoteRequest {
                survey_id: "mock-survey".into(),
                collector_id: "mock-collector".into(),
                score: 4,
                question_index: 1,
            }]
        );
    }

    #[tokio::test]
    async fn repeated_vote_is_a_no_op() {
        let gateway = FakeGateway {
            accept: true,
            ..Default::default()
        };
        let mut panel = ResultsPanel::default();
        let case = canned_case();

        assert_eq!(
            panel.vote(&case, 0, 5, &gateway).await,
            VoteOutcome::Recorded { delivered: true }
        );
        assert_eq!(panel.vote(&case, 0, 5, &gateway).await, VoteOutcome::AlreadyVoted);
        assert_eq!(panel.vote(&case, 0, 2, &gateway).await, VoteOutcome::AlreadyVoted);
        assert!(panel.is_voted(0));
        assert_eq!(gateway.votes.lock().len(), 1);
    }

    #[tokio::test]
    async fn rejects_bad_score_index_and_missing_survey() {
        let gateway = FakeGateway::default();
        let mut panel = ResultsPanel::default();
        let mut case = canned_case();

        assert_eq!(panel.vote(&case, 0, 0, &gateway).await, VoteOutcome::InvalidScore);
        assert_eq!(panel.vote(&case, 0, 6, &gateway).await, VoteOutcome::InvalidScore);
        assert_eq!(panel.vote(&case, 9, 3, &gateway).await, VoteOutcome::UnknownQuestion);
        case.surveymonkey = None;
        assert_eq!(panel.vote(&case, 0, 3, &gateway).await, VoteOutcome::NoSurvey);
        assert!(!panel.is_voted(0));
        assert!(gateway.votes.lock().is_empty());
    }

    #[tokio::test]
    async fn refresh_answers_replaces_cache() {
        let gateway = FakeGateway {
            answers: vec![SurveyAnswer {
                question: "How smooth was checkout?".into(),
                answer: "4".into(),
                timestamp: Some("2025-01-01T10:00:00+00:00".into()),
            }],
            ..Default::default()
        };
        let mut panel = ResultsPanel::default();
        let mut case = canned_case();
        assert_eq!(panel.refresh_answers(&case, &gateway).await.len(), 1);

        case.surveymonkey = None;
        assert!(panel.refresh_answers(&case, &gateway).await.is_empty());
    }

    #[test]
    fn tabs_are_locked_while_loading() {
        let mut panel = ResultsPanel::default();
        assert_eq!(panel.tab(), Tab::Structured);
        assert!(!panel.select_tab(Tab::RawJson, true));
        assert_eq!(panel.tab(), Tab::Structured);
        assert!(panel.select_tab(Tab::RawJson, false));
        assert_eq!(panel.tab(), Tab::RawJson);
    }

    #[test]
    fn tab_names_parse() {
        assert_eq!("plan".parse::<Tab>().unwrap(), Tab::ActionPlan);
        assert_eq!("Survey Draft".parse::<Tab>().unwrap(), Tab::SurveyDraft);
        assert_eq!("raw".parse::<Tab>().unwrap(), Tab::RawJson);
        assert_eq!(Tab::ActionPlan.to_string(), "Action Plan");
    }
}
