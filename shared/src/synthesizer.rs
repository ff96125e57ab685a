//! Network-free generator producing a plausible case record for a complaint.
//!
//! Two variants exist. [`SynthesizerMode::Randomized`] draws the classification
//! at random and derives everything else through fixed lookup tables, yielding a
//! single-ticket action plan. [`SynthesizerMode::Canned`] returns a fixed
//! two-ticket payload with a mock survey link, echoing only the journey stage and
//! a short complaint excerpt.
//!
//! Case ids are unique per call within one synthesizer. The canned variant walks
//! a fixed stride from a per-instance starting point, so it cannot repeat an id
//! before all 900 000 six-digit numbers are used.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::config::SynthesizerMode;
use crate::dto::{
    ActionPlan, ApiResult, ComplaintInput, Emotion, FollowupSurveyDraft, IssueType, JiraTicket,
    Level, Owner, Priority, Severity, StructuredFeedback, SurveyMonkeyInfo, SurveyQuestion,
    TicketRole,
};
use crate::utils::{ellipsize, first_sentence, truncate_chars};

const SUMMARY_MAX_CHARS: usize = 120;
const QUOTE_MAX_CHARS: usize = 90;
const EXCERPT_MAX_CHARS: usize = 50;
const SEVERITIES: [u8; 4] = [2, 3, 4, 5];
const CASE_NUMBER_BASE: u32 = 100_000;
const CASE_NUMBER_SPAN: u32 = 900_000;
/// Coprime with `CASE_NUMBER_SPAN`.
const CANNED_STRIDE: u32 = 7_919;

const GENERIC_QUOTES: [&str; 4] = [
    "“I tried multiple times and it didn’t work.”",
    "“It was confusing and took too long.”",
    "“I expected better for the price.”",
    "“Support didn’t resolve my issue.”",
];

const FOLLOWUP_GOAL: &str = "Clarify impact and capture rating quickly";
const DEMO_SURVEY_LINK: &str = "https://www.surveymonkey.com/ (demo)";

pub struct Synthesizer {
    mode: SynthesizerMode,
    rng: Mutex<StdRng>,
    canned_start: u32,
    issued: AtomicU32,
}

impl Synthesizer {
    /// A seed makes the output reproducible, canned case ids included.
    pub fn new(mode: SynthesizerMode, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let canned_start = rng.gen_range(0..CASE_NUMBER_SPAN);
        Self {
            mode,
            rng: Mutex::new(rng),
            canned_start,
            issued: AtomicU32::new(0),
        }
    }

    pub fn synthesize(&self, input: &ComplaintInput) -> ApiResult {
        let result = match self.mode {
            SynthesizerMode::Randomized => self.randomized(input),
            SynthesizerMode::Canned => canned(input, self.next_canned_number()),
        };
        debug!(case_id = %result.case_id, mode = ?self.mode, "synthesized case");
        result
    }

    fn next_canned_number(&self) -> u32 {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) % CASE_NUMBER_SPAN;
        let offset = (u64::from(self.canned_start) + u64::from(n) * u64::from(CANNED_STRIDE))
            % u64::from(CASE_NUMBER_SPAN);
        // offset < CASE_NUMBER_SPAN, so the cast is lossless
        CASE_NUMBER_BASE + offset as u32
    }

    fn randomized(&self, input: &ComplaintInput) -> ApiResult {
        let mut rng = self.rng.lock();
        let issue = pick(&mut *rng, &IssueType::iter().collect::<Vec<_>>());
        let emotion = pick(&mut *rng, &Emotion::iter().collect::<Vec<_>>());
        let severity = Severity::clamped(pick(&mut *rng, &SEVERITIES));
        let generic_quote = pick(&mut *rng, &GENERIC_QUOTES);
        let case_number: u32 = rng.gen_range(CASE_NUMBER_BASE..CASE_NUMBER_BASE + CASE_NUMBER_SPAN);
        drop(rng);

        let summary = ellipsize(&input.complaint, SUMMARY_MAX_CHARS);
        let opening = truncate_chars(first_sentence(&input.complaint), QUOTE_MAX_CHARS).trim();
        let opening = if opening.is_empty() {
            truncate_chars(&input.complaint, QUOTE_MAX_CHARS)
        } else {
            opening
        };
        let evidence_quotes = vec![opening.to_string(), generic_quote.to_string()];

        let followup_needed =
            severity.value() >= 4 || emotion == Emotion::Angry || issue == IssueType::Bug;

        let structured = StructuredFeedback {
            journey_stage: input.journey_stage.to_string(),
            issue_type: issue,
            emotion,
            severity,
            summary: summary.clone(),
            evidence_quotes: evidence_quotes.clone(),
            followup_needed,
            followup_goal: followup_needed.then(|| FOLLOWUP_GOAL.to_string()),
        };

        let ticket = JiraTicket {
            ticket_id: "TKT-001".into(),
            role: role_for(issue),
            summary: format!(
                "[MirrorLoop] {} - {} - Severity {}",
                input.journey_stage,
                issue.as_ref().to_uppercase(),
                severity
            ),
            description: ticket_body(input, &summary, &evidence_quotes),
            acceptance_criteria: vec![
                "Repro confirmed and root cause identified".into(),
                "Fix or mitigation shipped and customer acknowledged".into(),
            ],
            priority: priority_for(severity),
        };

        ApiResult {
            case_id: format!("CASE-{case_number}"),
            structured,
            survey_draft: survey_for(issue),
            action_plan: ActionPlan {
                top_theme: theme_for(issue).into(),
                recommended_action: action_for(issue).into(),
                owner: owner_for(issue),
                impact: if severity.value() >= 4 {
                    Level::High
                } else {
                    Level::Medium
                },
                effort: effort_for(issue),
                tickets: vec![ticket],
            },
            created_at: Utc::now(),
            surveymonkey: None,
        }
    }
}

fn pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, items: &[T]) -> T {
    items[rng.gen_range(0..items.len())]
}

fn owner_for(issue: IssueType) -> Owner {
    match issue {
        IssueType::Delivery => Owner::Delivery,
        IssueType::Service => Owner::StoreOps,
        IssueType::Bug | IssueType::Ux => Owner::Product,
        _ => Owner::Support,
    }
}

fn theme_for(issue: IssueType) -> &'static str {
    match issue {
        IssueType::Ux => "UX friction",
        IssueType::Bug => "Functional break",
        IssueType::Delivery => "Delivery experience",
        _ => "Customer satisfaction",
    }
}

fn action_for(issue: IssueType) -> &'static str {
    match issue {
        IssueType::Bug => "Create a priority bug ticket with repro context and customer impact.",
        IssueType::Ux => "Run a quick UX audit on this journey stage and reduce steps.",
        IssueType::Pricing => "Review price perception and consider clearer value messaging.",
        IssueType::Inventory => "Improve stock visibility and suggest in-stock alternatives.",
        _ => "Route to the right owner and acknowledge the customer quickly.",
    }
}

fn effort_for(issue: IssueType) -> Level {
    match issue {
        IssueType::Bug => Level::Medium,
        _ => Level::Low,
    }
}

fn role_for(issue: IssueType) -> TicketRole {
    match issue {
        IssueType::Bug | IssueType::Ux => TicketRole::SoftwareEngineer,
        IssueType::Service | IssueType::Inventory | IssueType::Delivery => {
            TicketRole::FieldOperations
        }
        IssueType::Pricing | IssueType::Other => TicketRole::ProductManager,
    }
}

fn priority_for(severity: Severity) -> Priority {
    match severity.value() {
        5 => Priority::P0,
        4 => Priority::P1,
        3 => Priority::P2,
        _ => Priority::P3,
    }
}

fn survey_for(issue: IssueType) -> FollowupSurveyDraft {
    let first = if issue == IssueType::Bug {
        SurveyQuestion::single_choice(
            "Did this issue block you from completing your task?",
            &["Yes, totally blocked", "Partially blocked", "No, just annoying"],
        )
    } else {
        SurveyQuestion::single_choice(
            "What was the main reason you felt dissatisfied?",
            &[
                "Too slow",
                "Too expensive",
                "Confusing",
                "Out of stock",
                "Support issue",
                "Other",
            ],
        )
    };
    FollowupSurveyDraft {
        title: "Quick follow-up (10 seconds)".into(),
        questions: vec![
            first,
            SurveyQuestion::scale("How would you rate your experience overall?"),
        ],
    }
}

fn ticket_body(input: &ComplaintInput, summary: &str, quotes: &[String]) -> String {
    let mut lines = vec![
        format!("Channel: {}", input.channel),
        format!("Journey stage: {}", input.journey_stage),
    ];
    if let Some(order_id) = input.order_id.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Order ID: {order_id}"));
    }
    lines.push(String::new());
    lines.push("Customer summary:".into());
    lines.push(summary.to_string());
    lines.push(String::new());
    lines.push("Evidence quotes:".into());
    lines.extend(quotes.iter().map(|q| format!("- {q}")));
    lines.push(String::new());
    lines.push("Suggested next step:".into());
    lines.push(
        "Validate repro, confirm scope, and ship a fix or mitigation. Reply with an acknowledgement message."
            .into(),
    );
    lines.join("\n")
}

fn canned(input: &ComplaintInput, case_number: u32) -> ApiResult {
    let excerpt = truncate_chars(input.complaint.trim(), EXCERPT_MAX_CHARS).trim_end();
    let stage = input.journey_stage.to_string();

    ApiResult {
        case_id: format!("CASE-{case_number}"),
        structured: StructuredFeedback {
            journey_stage: stage.clone(),
            issue_type: IssueType::Ux,
            emotion: Emotion::Frustrated,
            severity: Severity::clamped(4),
            summary: format!("Customer reported a problem during {stage}: \"{excerpt}\""),
            evidence_quotes: vec![excerpt.to_string()],
            followup_needed: true,
            followup_goal: Some(FOLLOWUP_GOAL.into()),
        },
        survey_draft: FollowupSurveyDraft {
            title: "Pulse Check".into(),
            questions: vec![
                SurveyQuestion::scale(format!("How smooth was the {stage} step today?")),
                SurveyQuestion::scale("How quickly did we respond to your issue?"),
                SurveyQuestion::scale("How likely are you to order again?"),
            ],
        },
        action_plan: ActionPlan {
            top_theme: "Customer experience friction".into(),
            recommended_action: "Confirm the failure path, ship a fix and follow up with the customer."
                .into(),
            owner: Owner::Product,
            impact: Level::High,
            effort: Level::Medium,
            tickets: vec![
                JiraTicket {
                    ticket_id: "TKT-101".into(),
                    role: TicketRole::ProductManager,
                    summary: format!("Assess customer impact in {stage}"),
                    description: "Quantify affected customers and draft the customer reply.".into(),
                    acceptance_criteria: vec![
                        "Impact estimate shared with the team".into(),
                        "Customer reply approved".into(),
                    ],
                    priority: Priority::P1,
                },
                JiraTicket {
                    ticket_id: "TKT-102".into(),
                    role: TicketRole::SoftwareEngineer,
                    summary: format!("Fix reported {stage} failure"),
                    description: "Reproduce the reported failure and ship a fix.".into(),
                    acceptance_criteria: vec![
                        "Failure reproduced in a test".into(),
                        "Fix deployed behind monitoring".into(),
                    ],
                    priority: Priority::P1,
                },
            ],
        },
        created_at: Utc::now(),
        surveymonkey: Some(SurveyMonkeyInfo {
            survey_id: Some("mock-survey".into()),
            collector_id: Some("mock-collector".into()),
            weblink_url: Some(DEMO_SURVEY_LINK.into()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{Channel, JourneyStage, QuestionType};

    fn checkout_complaint() -> ComplaintInput {
        ComplaintInput {
            complaint: "The checkout button kept spinning and I got charged twice.".into(),
            channel: Channel::Web,
            journey_stage: JourneyStage::Checkout,
            ..ComplaintInput::default()
        }
    }

    fn is_case_id(id: &str) -> bool {
        id.strip_prefix("CASE-")
            .map(|n| n.len() == 6 && n.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
    }

    #[test]
    fn randomized_output_respects_invariants() {
        let synth = Synthesizer::new(SynthesizerMode::Randomized, Some(7));
        for _ in 0..200 {
            let r = synth.synthesize(&checkout_complaint());
            r.validate().unwrap();
            assert!(is_case_id(&r.case_id), "{}", r.case_id);
            assert!((2..=5).contains(&r.structured.severity.value()));
            assert_eq!(r.survey_draft.questions.len(), 2);
            assert_eq!(r.action_plan.tickets.len(), 1);
            assert_eq!(r.structured.evidence_quotes.len(), 2);
            assert_eq!(
                r.structured.evidence_quotes[0],
                "The checkout button kept spinning and I got charged twice"
            );
            let s = &r.structured;
            let expected =
                s.severity.value() >= 4 || s.emotion == Emotion::Angry || s.issue_type == IssueType::Bug;
            assert_eq!(s.followup_needed, expected);
            assert_eq!(
                r.action_plan.impact,
                if s.severity.value() >= 4 { Level::High } else { Level::Medium }
            );
            assert_eq!(r.action_plan.owner, owner_for(s.issue_type));
        }
    }

    #[test]
    fn same_seed_same_draws() {
        let a = Synthesizer::new(SynthesizerMode::Randomized, Some(99));
        let b = Synthesizer::new(SynthesizerMode::Randomized, Some(99));
        let ra = a.synthesize(&checkout_complaint());
        let rb = b.synthesize(&checkout_complaint());
        assert_eq!(ra.case_id, rb.case_id);
        assert_eq!(ra.structured, rb.structured);
        assert_eq!(ra.action_plan, rb.action_plan);
    }

    #[test]
    fn long_complaint_summary_is_ellipsized() {
        let synth = Synthesizer::new(SynthesizerMode::Randomized, Some(1));
        let input = ComplaintInput::new("x".repeat(300));
        let r = synth.synthesize(&input);
        assert_eq!(r.structured.summary.chars().count(), 121);
        assert!(r.structured.summary.ends_with('…'));
        assert_eq!(r.structured.evidence_quotes[0].chars().count(), 90);
    }

    #[test]
    fn first_question_depends_on_issue_type() {
        let bug = survey_for(IssueType::Bug);
        assert_eq!(bug.questions[0].choices.as_ref().unwrap().len(), 3);
        let other = survey_for(IssueType::Pricing);
        assert_eq!(other.questions[0].choices.as_ref().unwrap().len(), 6);
        assert_eq!(other.questions[1].question_type, QuestionType::Scale1To5);
        assert!(other.questions[1].choices.is_none());
    }

    #[test]
    fn lookup_tables() {
        assert_eq!(owner_for(IssueType::Delivery), Owner::Delivery);
        assert_eq!(owner_for(IssueType::Service), Owner::StoreOps);
        assert_eq!(owner_for(IssueType::Ux), Owner::Product);
        assert_eq!(owner_for(IssueType::Pricing), Owner::Support);
        assert_eq!(effort_for(IssueType::Bug), Level::Medium);
        assert_eq!(effort_for(IssueType::Ux), Level::Low);
        assert_eq!(priority_for(Severity::clamped(5)), Priority::P0);
        assert_eq!(priority_for(Severity::clamped(2)), Priority::P3);
    }

    #[test]
    fn ticket_body_lists_context_and_quotes() {
        let mut input = checkout_complaint();
        input.order_id = Some("ORD-9".into());
        let body = ticket_body(&input, "summary", &["one".into(), "two".into()]);
        assert!(body.starts_with("Channel: web\nJourney stage: checkout\nOrder ID: ORD-9\n"));
        assert!(body.contains("- one\n- two"));
        assert!(body.ends_with("Reply with an acknowledgement message."));
    }

    #[test]
    fn canned_payload_is_fixed_apart_from_id_and_timestamp() {
        let synth = Synthesizer::new(SynthesizerMode::Canned, None);
        let a = synth.synthesize(&checkout_complaint());
        let b = synth.synthesize(&checkout_complaint());
        assert!(is_case_id(&a.case_id));
        assert!(is_case_id(&b.case_id));
        assert_eq!(a.structured, b.structured);
        assert_eq!(a.survey_draft, b.survey_draft);
        assert_eq!(a.action_plan, b.action_plan);
        a.validate().unwrap();
        let ids: Vec<_> = a.action_plan.tickets.iter().map(|t| t.ticket_id.as_str()).collect();
        assert_eq!(ids, ["TKT-101", "TKT-102"]);
        assert_eq!(a.structured.journey_stage, "checkout");
        assert!(a.structured.evidence_quotes[0].chars().count() <= 50);
        assert_eq!(a.survey_target(), Some(("mock-survey", "mock-collector")));
    }

    #[test]
    fn canned_resubmission_gets_a_new_case_id() {
        let synth = Synthesizer::new(SynthesizerMode::Canned, None);
        let ids: std::collections::HashSet<_> = (0..1_000)
            .map(|_| synth.synthesize(&checkout_complaint()).case_id)
            .collect();
        assert_eq!(ids.len(), 1_000);
        assert!(ids.iter().all(|id| is_case_id(id)));

        let first = Synthesizer::new(SynthesizerMode::Canned, None);
        let second = Synthesizer::new(SynthesizerMode::Canned, None);
        let a = first.synthesize(&checkout_complaint());
        let b = second.synthesize(&checkout_complaint());
        assert_ne!(a.case_id, b.case_id);
    }

    #[test]
    fn seeded_canned_ids_are_reproducible() {
        let a = Synthesizer::new(SynthesizerMode::Canned, Some(42));
        let b = Synthesizer::new(SynthesizerMode::Canned, Some(42));
        for _ in 0..3 {
            assert_eq!(
                a.synthesize(&checkout_complaint()).case_id,
                b.synthesize(&checkout_complaint()).case_id
            );
        }
    }
}
