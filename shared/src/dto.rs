//! Wire records exchanged with the feedback backend and kept by the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Minimum trimmed complaint length accepted for analysis.
pub const MIN_COMPLAINT_CHARS: usize = 10;

/* ---------- COMPLAINT INPUT ---------- */

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    #[default]
    Web,
    Mobile,
    InStore,
    Delivery,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JourneyStage {
    Browse,
    Product,
    #[default]
    Checkout,
    Support,
    Returns,
    Other,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Language {
    #[default]
    English,
    French,
    Arabic,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintInput {
    pub complaint: String,
    pub channel: Channel,
    pub journey_stage: JourneyStage,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_or_phone: Option<String>,
    /// Typing speed in words per minute, a secondary emotion signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wpm: Option<u32>,
}

impl ComplaintInput {
    pub fn new(complaint: impl Into<String>) -> Self {
        Self {
            complaint: complaint.into(),
            ..Self::default()
        }
    }

    /// True once the trimmed complaint carries enough text to analyze.
    pub fn is_submittable(&self) -> bool {
        self.complaint.trim().chars().count() >= MIN_COMPLAINT_CHARS
    }

    /// Copy with blank optional fields collapsed to `None`.
    pub fn normalized(&self) -> Self {
        fn blank_to_none(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        Self {
            order_id: blank_to_none(&self.order_id),
            email_or_phone: blank_to_none(&self.email_or_phone),
            ..self.clone()
        }
    }
}

/* ---------- STRUCTURED FEEDBACK ---------- */

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IssueType {
    Ux,
    Bug,
    Service,
    Pricing,
    Inventory,
    Delivery,
    Other,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Annoyed,
    Frustrated,
    Angry,
}

/// Severity on a 1..=5 scale; anything else fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Nearest valid severity for `value`.
    pub const fn clamped(value: u8) -> Self {
        if value < Self::MIN {
            Self(Self::MIN)
        } else if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Severity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Severity::new(value).ok_or_else(|| format!("severity {value} outside 1..=5"))
    }
}

impl From<Severity> for u8 {
    fn from(s: Severity) -> u8 {
        s.0
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredFeedback {
    pub journey_stage: String,
    pub issue_type: IssueType,
    pub emotion: Emotion,
    pub severity: Severity,
    pub summary: String,
    pub evidence_quotes: Vec<String>,
    pub followup_needed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followup_goal: Option<String>,
}

/* ---------- SURVEY DRAFT ---------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    #[serde(rename = "scale_1_5")]
    #[strum(serialize = "scale_1_5")]
    Scale1To5,
    ShortText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyQuestion {
    pub prompt: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

impl SurveyQuestion {
    pub fn single_choice(prompt: impl Into<String>, choices: &[&str]) -> Self {
        Self {
            prompt: prompt.into(),
            question_type: QuestionType::SingleChoice,
            choices: Some(choices.iter().map(|c| c.to_string()).collect()),
        }
    }

    pub fn scale(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            question_type: QuestionType::Scale1To5,
            choices: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowupSurveyDraft {
    pub title: String,
    pub questions: Vec<SurveyQuestion>,
}

/* ---------- ACTION PLAN ---------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
pub enum Owner {
    #[serde(rename = "Store Ops")]
    #[strum(serialize = "Store Ops")]
    StoreOps,
    Product,
    Support,
    Delivery,
    Unknown,
}

/// Shared low/medium/high scale for impact and effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
pub enum TicketRole {
    #[serde(rename = "Product Manager")]
    #[strum(serialize = "Product Manager")]
    ProductManager,
    #[serde(rename = "Software Engineer")]
    #[strum(serialize = "Software Engineer")]
    SoftwareEngineer,
    #[serde(rename = "Field Operations")]
    #[strum(serialize = "Field Operations")]
    FieldOperations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, AsRefStr)]
pub enum Priority {
    P0,
    P1,
    P2,
    P3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraTicket {
    pub ticket_id: String,
    pub role: TicketRole,
    pub summary: String,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub top_theme: String,
    pub recommended_action: String,
    pub owner: Owner,
    pub impact: Level,
    pub effort: Level,
    pub tickets: Vec<JiraTicket>,
}

/* ---------- CASE RECORD ---------- */

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SurveyMonkeyInfo {
    #[serde(default)]
    pub survey_id: Option<String>,
    #[serde(default)]
    pub collector_id: Option<String>,
    #[serde(default)]
    pub weblink_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult {
    pub case_id: String,
    pub structured: StructuredFeedback,
    pub survey_draft: FollowupSurveyDraft,
    pub action_plan: ActionPlan,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surveymonkey: Option<SurveyMonkeyInfo>,
}

impl ApiResult {
    /// Checks the record-level invariants that typed decoding cannot express.
    pub fn validate(&self) -> Result<(), String> {
        let s = &self.structured;
        if s.followup_needed != s.followup_goal.is_some() {
            return Err(format!(
                "followup_goal must be present iff followup_needed (needed = {})",
                s.followup_needed
            ));
        }
        for (idx, q) in self.survey_draft.questions.iter().enumerate() {
            let is_choice = q.question_type == QuestionType::SingleChoice;
            if is_choice != q.choices.is_some() {
                return Err(format!(
                    "question {idx}: choices must be present iff type is single_choice"
                ));
            }
        }
        Ok(())
    }

    /// Survey and collector ids when the case has a live survey attached.
    pub fn survey_target(&self) -> Option<(&str, &str)> {
        let sm = self.surveymonkey.as_ref()?;
        Some((sm.survey_id.as_deref()?, sm.collector_id.as_deref()?))
    }
}

/// Where a case record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provenance {
    Live,
    Synthesized,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub result: ApiResult,
    pub provenance: Provenance,
}

/* ---------- SURVEY INTERACTION ---------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub survey_id: String,
    pub collector_id: String,
    pub score: u8,
    pub question_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyAnswer {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_result() -> ApiResult {
        ApiResult {
            case_id: "CASE-123456".into(),
            structured: StructuredFeedback {
                journey_stage: "checkout".into(),
                issue_type: IssueType::Bug,
                emotion: Emotion::Angry,
                severity: Severity::new(4).unwrap(),
                summary: "Charged twice".into(),
                evidence_quotes: vec!["I got charged twice".into()],
                followup_needed: true,
                followup_goal: Some("Clarify impact".into()),
            },
            survey_draft: FollowupSurveyDraft {
                title: "Pulse".into(),
                questions: vec![
                    SurveyQuestion::single_choice("Blocked?", &["Yes", "No"]),
                    SurveyQuestion::scale("Overall?"),
                ],
            },
            action_plan: ActionPlan {
                top_theme: "Functional break".into(),
                recommended_action: "Fix it".into(),
                owner: Owner::StoreOps,
                impact: Level::High,
                effort: Level::Medium,
                tickets: vec![JiraTicket {
                    ticket_id: "TKT-001".into(),
                    role: TicketRole::SoftwareEngineer,
                    summary: "Double charge".into(),
                    description: "Payment retried".into(),
                    acceptance_criteria: vec!["No double charge".into()],
                    priority: Priority::P0,
                }],
            },
            created_at: Utc::now(),
            surveymonkey: Some(SurveyMonkeyInfo {
                survey_id: Some("s1".into()),
                collector_id: Some("c1".into()),
                weblink_url: None,
            }),
        }
    }

    #[test]
    fn input_uses_camel_case_and_omits_absent_fields() {
        let mut input = ComplaintInput::new("The app froze at payment");
        input.channel = Channel::InStore;
        input.order_id = Some("A-1".into());
        let v = serde_json::to_value(&input).unwrap();
        assert_eq!(
            v,
            json!({
                "complaint": "The app froze at payment",
                "channel": "in_store",
                "journeyStage": "checkout",
                "language": "English",
                "orderId": "A-1"
            })
        );
    }

    #[test]
    fn normalized_drops_blank_optionals() {
        let mut input = ComplaintInput::new("text");
        input.order_id = Some("   ".into());
        input.email_or_phone = Some(" a@b.c ".into());
        let n = input.normalized();
        assert_eq!(n.order_id, None);
        assert_eq!(n.email_or_phone.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn submittable_counts_trimmed_chars() {
        assert!(!ComplaintInput::new("   short    ").is_submittable());
        assert!(ComplaintInput::new("  ten chars!").is_submittable());
    }

    #[test]
    fn severity_out_of_range_fails_to_decode() {
        assert!(serde_json::from_value::<Severity>(json!(0)).is_err());
        assert!(serde_json::from_value::<Severity>(json!(6)).is_err());
        assert_eq!(serde_json::from_value::<Severity>(json!(3)).unwrap().value(), 3);
    }

    #[test]
    fn enum_wire_values() {
        assert_eq!(serde_json::to_value(Owner::StoreOps).unwrap(), json!("Store Ops"));
        assert_eq!(
            serde_json::to_value(TicketRole::FieldOperations).unwrap(),
            json!("Field Operations")
        );
        assert_eq!(serde_json::to_value(QuestionType::Scale1To5).unwrap(), json!("scale_1_5"));
        assert_eq!(QuestionType::Scale1To5.to_string(), "scale_1_5");
        assert_eq!(Owner::StoreOps.to_string(), "Store Ops");
        assert_eq!("in_store".parse::<Channel>().unwrap(), Channel::InStore);
        assert_eq!("french".parse::<Language>().unwrap(), Language::French);
    }

    #[test]
    fn api_result_survives_the_wire() {
        let original = sample_result();
        let json = serde_json::to_string_pretty(&original).unwrap();
        assert!(json.contains("\"caseId\""));
        assert!(json.contains("\"surveymonkey\""));
        let decoded: ApiResult = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, original);
        decoded.validate().unwrap();
    }

    #[test]
    fn accepts_backend_timestamp_with_offset() {
        let mut v = serde_json::to_value(sample_result()).unwrap();
        v["createdAt"] = json!("2025-03-01T10:00:00.123456+00:00");
        v.as_object_mut().unwrap().remove("surveymonkey");
        let decoded: ApiResult = serde_json::from_value(v).unwrap();
        assert!(decoded.surveymonkey.is_none());
        assert_eq!(decoded.created_at.to_rfc3339(), "2025-03-01T10:00:00.123456+00:00");
    }

    #[test]
    fn validate_flags_goal_mismatch_and_missing_choices() {
        let mut r = sample_result();
        r.structured.followup_goal = None;
        assert!(r.validate().is_err());

        let mut r = sample_result();
        r.survey_draft.questions[0].choices = None;
        assert!(r.validate().is_err());
    }

    #[test]
    fn survey_target_needs_both_ids() {
        let mut r = sample_result();
        assert_eq!(r.survey_target(), Some(("s1", "c1")));
        r.surveymonkey = Some(SurveyMonkeyInfo {
            survey_id: Some("s1".into()),
            ..Default::default()
        });
        assert_eq!(r.survey_target(), None);
    }
}
