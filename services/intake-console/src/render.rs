//! Plain-text rendering of the results panel, notifications and answers.

use std::fmt::Write;

use shared::dto::{AnalysisOutcome, ApiResult, Provenance, QuestionType, SurveyAnswer};
use shared::orchestrator::{Notification, NotificationKind};
use shared::panel::{ResultsPanel, Tab};
use strum::IntoEnumIterator;

pub fn notification(note: &Notification) -> String {
    let marker = match note.kind {
        NotificationKind::Info => "i",
        NotificationKind::Success => "+",
        NotificationKind::Error => "!",
    };
    match &note.message {
        Some(msg) => format!("[{marker}] {}: {msg}", note.title),
        None => format!("[{marker}] {}", note.title),
    }
}

/// Case line with provenance. Live payloads that break a record invariant get
/// a second warning line; they are still shown as received.
pub fn header(outcome: &AnalysisOutcome) -> String {
    let mut out = format!(
        "Case {} \u{2022} {} ({})",
        outcome.result.case_id,
        outcome.result.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        outcome.provenance
    );
    if outcome.provenance == Provenance::Live {
        if let Err(problem) = outcome.result.validate() {
            let _ = write!(out, "\n[!] Backend payload looks inconsistent: {problem}");
        }
    }
    out
}

pub fn tab_bar(active: Tab) -> String {
    Tab::iter()
        .map(|t| {
            if t == active {
                format!("[{t}]")
            } else {
                t.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn tab(result: &ApiResult, panel: &ResultsPanel, tab: Tab) -> String {
    match tab {
        Tab::Structured => structured(result),
        Tab::SurveyDraft => survey(result, panel),
        Tab::ActionPlan => action_plan(result),
        Tab::RawJson => raw_json(result),
    }
}

fn structured(result: &ApiResult) -> String {
    let s = &result.structured;
    let mut out = String::from("Structured feedback\n");
    let _ = writeln!(
        out,
        "  {} \u{00b7} {} \u{00b7} emotion: {} \u{00b7} severity: {}/5 \u{00b7} follow-up: {}",
        s.issue_type.as_ref().to_uppercase(),
        s.journey_stage,
        s.emotion,
        s.severity,
        if s.followup_needed { "needed" } else { "not needed" }
    );
    let _ = writeln!(out, "\nSummary\n  {}", s.summary);
    out.push_str("\nEvidence\n");
    for quote in &s.evidence_quotes {
        let _ = writeln!(out, "  - {quote}");
    }
    if let Some(goal) = &s.followup_goal {
        let _ = writeln!(out, "\nFollow-up goal\n  {goal}");
    }
    out
}

fn survey(result: &ApiResult, panel: &ResultsPanel) -> String {
    let mut out = String::from("Optional follow-up survey\n");
    if let Some(link) = result
        .surveymonkey
        .as_ref()
        .and_then(|s| s.weblink_url.as_deref())
    {
        let _ = writeln!(out, "  Live survey link: {link}");
    }
    let _ = writeln!(out, "\n{}", result.survey_draft.title);
    for (idx, q) in result.survey_draft.questions.iter().enumerate() {
        let voted = if panel.is_voted(idx) { "  (voted)" } else { "" };
        let _ = writeln!(out, "  {}. {}{voted}", idx + 1, q.prompt);
        let options = match (q.question_type, &q.choices) {
            (QuestionType::SingleChoice, Some(choices)) => choices.join(" / "),
            (QuestionType::Scale1To5, _) => "1 2 3 4 5".to_string(),
            _ => "Short text response".to_string(),
        };
        let _ = writeln!(out, "     {options}");
    }
    out
}

fn action_plan(result: &ApiResult) -> String {
    let plan = &result.action_plan;
    let mut out = String::from("Action plan\n");
    let _ = writeln!(out, "  Top theme: {}", plan.top_theme);
    let _ = writeln!(out, "  Owner:     {}", plan.owner);
    let _ = writeln!(out, "  Impact:    {}", plan.impact);
    let _ = writeln!(out, "  Effort:    {}", plan.effort);
    let _ = writeln!(out, "\nRecommended action\n  {}", plan.recommended_action);
    out.push_str("\nGenerated tickets\n");
    for ticket in &plan.tickets {
        let _ = writeln!(
            out,
            "  {} [{}] {}",
            ticket.ticket_id, ticket.role, ticket.priority
        );
        let _ = writeln!(out, "    {}", ticket.summary);
        for line in ticket.description.lines() {
            let _ = writeln!(out, "    {line}");
        }
        if !ticket.acceptance_criteria.is_empty() {
            out.push_str("    Acceptance criteria:\n");
            for ac in &ticket.acceptance_criteria {
                let _ = writeln!(out, "      - {ac}");
            }
        }
    }
    out
}

fn raw_json(result: &ApiResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_default()
}

pub fn answers(answers: &[SurveyAnswer]) -> String {
    if answers.is_empty() {
        return "No answers recorded yet.".to_string();
    }
    let mut out = String::new();
    for a in answers {
        let _ = writeln!(
            out,
            "{}  {} -> {}",
            a.timestamp.as_deref().unwrap_or("-"),
            a.question,
            a.answer
        );
    }
    out
}
