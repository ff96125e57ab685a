//! Single-owner session state for complaint intake.
//!
//! All mutation goes through named transitions: field edits, submission
//! (`begin_submit` / `settle`, or `submit` for both), tab and vote actions on the
//! results panel, notification dismissal and `reset`. A submission is tagged with
//! a token; an outcome whose token is no longer the latest is discarded.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::analysis_client::Analyzer;
use crate::dto::{AnalysisOutcome, Channel, ComplaintInput, JourneyStage, Language};
use crate::error::AppError;
use crate::panel::{ResultsPanel, Tab, VoteOutcome};
use crate::survey_client::SurveyGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// Transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
}

impl Notification {
    pub fn needs_more_detail() -> Self {
        Self {
            kind: NotificationKind::Info,
            title: "Add a bit more detail".into(),
            message: Some("Please type at least 10 characters so we can analyze the issue.".into()),
        }
    }

    pub fn captured(case_id: &str) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: "Captured".into(),
            message: Some(format!("Case {case_id} created with a follow-up draft.")),
        }
    }

    pub fn failed(err: &AppError) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Something went wrong".into(),
            message: Some(err.to_string()),
        }
    }
}

/// One form edit; replaces a single input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Complaint(String),
    Channel(Channel),
    JourneyStage(JourneyStage),
    Language(Language),
    OrderId(String),
    EmailOrPhone(String),
    Wpm(Option<u32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting { token: u64 },
    Settled,
}

/// Ticket for an analysis call started by [`Orchestrator::begin_submit`].
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub token: u64,
    pub input: ComplaintInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation gate failed; nothing was sent.
    Rejected,
    /// A submission is already in flight.
    Busy,
    Captured { case_id: String },
    Failed,
    /// The outcome arrived after the session moved on and was dropped.
    Discarded,
}

pub struct Orchestrator {
    analyzer: Arc<dyn Analyzer>,
    input: ComplaintInput,
    phase: Phase,
    result: Option<AnalysisOutcome>,
    notification: Option<Notification>,
    panel: ResultsPanel,
    token: u64,
}

impl Orchestrator {
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            analyzer,
            input: ComplaintInput::default(),
            phase: Phase::Idle,
            result: None,
            notification: None,
            panel: ResultsPanel::default(),
            token: 0,
        }
    }

    pub fn input(&self) -> &ComplaintInput {
        &self.input
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn loading(&self) -> bool {
        matches!(self.phase, Phase::Submitting { .. })
    }

    pub fn result(&self) -> Option<&AnalysisOutcome> {
        self.result.as_ref()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn panel(&self) -> &ResultsPanel {
        &self.panel
    }

    pub fn can_submit(&self) -> bool {
        self.input.is_submittable()
    }

    /// Whether the submit control should be enabled.
    pub fn submit_enabled(&self) -> bool {
        !self.loading() && self.can_submit()
    }

    /// Applies one field edit. Ignored while a submission is in flight.
    pub fn edit(&mut self, edit: FieldEdit) -> bool {
        if self.loading() {
            debug!(?edit, "edit ignored while loading");
            return false;
        }
        match edit {
            FieldEdit::Complaint(v) => self.input.complaint = v,
            FieldEdit::Channel(v) => self.input.channel = v,
            FieldEdit::JourneyStage(v) => self.input.journey_stage = v,
            FieldEdit::Language(v) => self.input.language = v,
            FieldEdit::OrderId(v) => self.input.order_id = Some(v),
            FieldEdit::EmailOrPhone(v) => self.input.email_or_phone = Some(v),
            FieldEdit::Wpm(v) => self.input.wpm = v,
        }
        self.phase = Phase::Idle;
        true
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    /// Runs the validation gate and, if it passes, enters `Submitting`.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, SubmitOutcome> {
        if self.loading() {
            debug!("submit ignored while loading");
            return Err(SubmitOutcome::Busy);
        }
        if !self.can_submit() {
            self.notification = Some(Notification::needs_more_detail());
            return Err(SubmitOutcome::Rejected);
        }
        self.token += 1;
        self.phase = Phase::Submitting { token: self.token };
        self.notification = None;
        debug!(token = self.token, "submission started");
        Ok(PendingSubmission {
            token: self.token,
            input: self.input.normalized(),
        })
    }

    /// Stores the outcome of submission `token` and leaves `Submitting`.
    pub fn settle(
        &mut self,
        token: u64,
        outcome: Result<AnalysisOutcome, AppError>,
    ) -> SubmitOutcome {
        if self.phase != (Phase::Submitting { token }) {
            warn!(token, latest = self.token, "discarding stale analysis outcome");
            return SubmitOutcome::Discarded;
        }
        self.phase = Phase::Settled;
        match outcome {
            Ok(outcome) => {
                let case_id = outcome.result.case_id.clone();
                info!(%case_id, provenance = %outcome.provenance, "case captured");
                self.notification = Some(Notification::captured(&case_id));
                self.result = Some(outcome);
                self.panel.reset();
                SubmitOutcome::Captured { case_id }
            }
            Err(e) => {
                error!(token, "submission failed: {e}");
                self.notification = Some(Notification::failed(&e));
                SubmitOutcome::Failed
            }
        }
    }

    /// Starts the analyzer for `pending` on its own task and returns a future
    /// for its outcome. The orchestrator is not borrowed while it runs, so the
    /// caller can keep handling input and `settle` once the outcome arrives.
    ///
    /// A panic inside the analyzer resolves to [`AppError::Internal`].
    pub fn dispatch(
        &self,
        pending: &PendingSubmission,
    ) -> impl Future<Output = Result<AnalysisOutcome, AppError>> + Send + 'static {
        let analyzer = Arc::clone(&self.analyzer);
        let input = pending.input.clone();
        let task = tokio::spawn(async move { analyzer.analyze(&input).await });
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join) => Err(AppError::Internal(format!("analysis task aborted: {join}"))),
            }
        }
    }

    /// Validates, calls the analyzer and settles, holding the session until
    /// the outcome is in.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let pending = match self.begin_submit() {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let outcome = self.dispatch(&pending).await;
        self.settle(pending.token, outcome)
    }

    /// Starts a new case, dropping any submission still in flight.
    pub fn reset(&mut self) {
        if let Phase::Submitting { token } = self.phase {
            debug!(token, "abandoning in-flight submission");
        }
        self.input = ComplaintInput::default();
        self.phase = Phase::Idle;
        self.result = None;
        self.notification = None;
        self.panel.reset();
    }

    pub fn select_tab(&mut self, tab: Tab) -> bool {
        let loading = self.loading();
        self.panel.select_tab(tab, loading)
    }

    pub async fn vote(
        &mut self,
        question_index: usize,
        score: u8,
        gateway: &dyn SurveyGateway,
    ) -> VoteOutcome {
        match &self.result {
            Some(outcome) => {
                self.panel
                    .vote(&outcome.result, question_index, score, gateway)
                    .await
            }
            None => VoteOutcome::NoSurvey,
        }
    }

    pub async fn refresh_answers(&mut self, gateway: &dyn SurveyGateway) -> usize {
        match &self.result {
            Some(outcome) => self.panel.refresh_answers(&outcome.result, gateway).await.len(),
            None => 0,
        }
    }
}
