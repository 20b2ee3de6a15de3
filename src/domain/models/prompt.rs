//! Prompt domain model.
//!
//! Prompts are natural-language units of work tracked from draft through
//! AI generation, agent dispatch, and the pull-request lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::agent::{AgentRunStatus, PrStatus};

/// Identifier for a prompt.
///
/// A client may hold a `Draft` id for a speculative row before the store
/// assigns the real one. Draft ids never reach the store and are fully
/// replaced (not merged) once the persisted id is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PromptId {
    /// Temporary client-assigned id awaiting server confirmation.
    Draft(Uuid),
    /// Server-assigned stable id.
    Persisted(Uuid),
}

impl PromptId {
    /// Mint a fresh draft id.
    pub fn draft() -> Self {
        Self::Draft(Uuid::new_v4())
    }

    pub const fn persisted(id: Uuid) -> Self {
        Self::Persisted(id)
    }

    pub const fn is_draft(&self) -> bool {
        matches!(self, Self::Draft(_))
    }

    /// The underlying uuid, regardless of draft/persisted state.
    pub const fn as_uuid(&self) -> Uuid {
        match self {
            Self::Draft(id) | Self::Persisted(id) => *id,
        }
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft(id) => write!(f, "draft-{id}"),
            Self::Persisted(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for PromptId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("draft-") {
            Some(rest) => Ok(Self::Draft(Uuid::parse_str(rest)?)),
            None => Ok(Self::Persisted(Uuid::parse_str(s)?)),
        }
    }
}

impl Serialize for PromptId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PromptId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Status of a prompt in its lifecycle.
///
/// Driven by both the client (generation, dispatch, manual moves) and the
/// server automation (agent reports, pull-request state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStatus {
    /// Queued, not started
    Todo,
    /// Picked up by the user
    InProgress,
    /// AI generation in flight
    Generating,
    /// Dispatch to the coding agent requested, awaiting confirmation
    SendingToCursor,
    /// Agent accepted the work
    SentToCursor,
    /// Agent is actively working
    CursorWorking,
    /// Agent opened a pull request
    PrCreated,
    /// Pull request under review
    PrReview,
    /// Pull request approved, ready to merge
    PrReady,
    /// Pull request merged
    PrMerged,
    /// Finished successfully
    Done,
    /// Failed irrecoverably
    Error,
}

impl Default for PromptStatus {
    fn default() -> Self {
        Self::Todo
    }
}

impl PromptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Generating => "generating",
            Self::SendingToCursor => "sending_to_cursor",
            Self::SentToCursor => "sent_to_cursor",
            Self::CursorWorking => "cursor_working",
            Self::PrCreated => "pr_created",
            Self::PrReview => "pr_review",
            Self::PrReady => "pr_ready",
            Self::PrMerged => "pr_merged",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "generating" => Some(Self::Generating),
            "sending_to_cursor" => Some(Self::SendingToCursor),
            "sent_to_cursor" => Some(Self::SentToCursor),
            "cursor_working" => Some(Self::CursorWorking),
            "pr_created" => Some(Self::PrCreated),
            "pr_review" => Some(Self::PrReview),
            "pr_ready" => Some(Self::PrReady),
            "pr_merged" => Some(Self::PrMerged),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Check if this is a terminal state for the automation layer.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// States owned by the dispatch/automation pipeline plus the terminal
    /// states. Local status-cycling must not override these; only
    /// event-driven transitions and explicit done/cancel/reopen actions may.
    pub fn is_externally_driven(&self) -> bool {
        matches!(
            self,
            Self::SendingToCursor
                | Self::SentToCursor
                | Self::CursorWorking
                | Self::PrCreated
                | Self::PrReview
                | Self::PrReady
                | Self::PrMerged
                | Self::Done
                | Self::Error
        )
    }

    /// Next status for the local "cycle status" control.
    ///
    /// Only defined for the locally-owned board states; everything else is
    /// a no-op per the gating rule.
    pub fn next_in_cycle(&self) -> Option<Self> {
        match self {
            Self::Todo => Some(Self::InProgress),
            Self::InProgress => Some(Self::Done),
            _ => None,
        }
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<PromptStatus> {
        match self {
            Self::Todo => vec![
                Self::InProgress,
                Self::Generating,
                Self::SendingToCursor,
                Self::Done,
            ],
            Self::InProgress => vec![Self::Generating, Self::SendingToCursor, Self::Done],
            Self::Generating => vec![Self::Todo],
            Self::SendingToCursor => vec![Self::SentToCursor, Self::Todo, Self::Done, Self::Error],
            Self::SentToCursor => vec![
                Self::CursorWorking,
                Self::PrCreated,
                Self::Todo,
                Self::Done,
                Self::Error,
            ],
            Self::CursorWorking => vec![Self::PrCreated, Self::Done, Self::Todo, Self::Error],
            Self::PrCreated => vec![Self::PrReview, Self::PrReady, Self::PrMerged, Self::Done],
            Self::PrReview => vec![Self::PrReady, Self::PrMerged, Self::Done],
            Self::PrReady => vec![Self::PrMerged, Self::Done],
            Self::PrMerged => vec![Self::Done],
            // Reopen is an explicit user override, not an automation rule.
            Self::Done | Self::Error => vec![Self::Todo],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

impl fmt::Display for PromptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority level for prompts. Numeric-ascending urgency: escalation raises
/// the value, capped at `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PromptPriority {
    Low = 1,
    Normal = 2,
    High = 3,
}

impl Default for PromptPriority {
    fn default() -> Self {
        Self::Normal
    }
}

impl From<PromptPriority> for u8 {
    fn from(priority: PromptPriority) -> Self {
        priority as Self
    }
}

impl TryFrom<u8> for PromptPriority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Normal),
            3 => Ok(Self::High),
            other => Err(format!("invalid priority {other}, expected 1-3")),
        }
    }
}

impl PromptPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" | "1" => Some(Self::Low),
            "normal" | "2" => Some(Self::Normal),
            "high" | "3" => Some(Self::High),
            _ => None,
        }
    }

    /// One step more urgent, capped at `High`.
    pub fn escalated(self) -> Self {
        match self {
            Self::Low => Self::Normal,
            Self::Normal | Self::High => Self::High,
        }
    }

    /// At least `floor`, keeping the current value when already higher.
    pub fn at_least(self, floor: Self) -> Self {
        self.max(floor)
    }
}

impl fmt::Display for PromptPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two generation writes has landed.
///
/// The generation pipeline intentionally writes content and status as two
/// separate store calls; this field records progress so the stuck-state
/// sweep is a pure function instead of an inferred heuristic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPhase {
    /// No generation write in flight.
    #[default]
    Idle,
    /// `generated_prompt`/`generated_at` written, status write pending.
    ContentWritten,
    /// Both writes landed.
    StatusWritten,
}

impl GenerationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ContentWritten => "content_written",
            Self::StatusWritten => "status_written",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "content_written" => Some(Self::ContentWritten),
            "status_written" => Some(Self::StatusWritten),
            _ => None,
        }
    }
}

/// A natural-language unit of work tracked through its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Unique identifier (draft until the store confirms)
    pub id: PromptId,
    /// Owning workspace
    pub workspace_id: Uuid,
    /// Optional product grouping
    pub product_id: Option<Uuid>,
    /// Optional epic grouping
    pub epic_id: Option<Uuid>,
    /// Human-readable title
    pub title: String,
    /// Rich-text description (may contain HTML markup)
    pub description: Option<String>,
    /// Current lifecycle status
    pub status: PromptStatus,
    /// Priority
    pub priority: PromptPriority,
    /// Manual ordering hint
    pub order_index: i32,
    /// AI-generated machine-ready instructions
    pub generated_prompt: Option<String>,
    /// When `generated_prompt` was produced; set only alongside it
    pub generated_at: Option<DateTime<Utc>>,
    /// Progress of the two-phase generation write
    pub generation_phase: GenerationPhase,
    /// Marks throwaway debugging prompts
    pub is_debug_session: bool,
    /// Coding-agent run linked to this prompt
    pub cursor_agent_id: Option<String>,
    /// Last reported agent run status
    pub cursor_agent_status: Option<AgentRunStatus>,
    /// Branch the agent works on
    pub cursor_branch_name: Option<String>,
    /// Pull request opened by the agent
    pub github_pr_url: Option<String>,
    pub github_pr_number: Option<i64>,
    pub github_pr_status: Option<PrStatus>,
    /// Free-form agent log trail
    pub cursor_logs: serde_json::Value,
    /// Free-form automation audit trail
    pub workflow_metadata: serde_json::Value,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last mutated (rewritten on every write, automation included)
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    /// Create a new speculative prompt with a draft id.
    pub fn new(workspace_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PromptId::draft(),
            workspace_id,
            product_id: None,
            epic_id: None,
            title: title.into(),
            description: None,
            status: PromptStatus::default(),
            priority: PromptPriority::default(),
            order_index: 0,
            generated_prompt: None,
            generated_at: None,
            generation_phase: GenerationPhase::default(),
            is_debug_session: false,
            cursor_agent_id: None,
            cursor_agent_status: None,
            cursor_branch_name: None,
            github_pr_url: None,
            github_pr_number: None,
            github_pr_status: None,
            cursor_logs: serde_json::Value::Object(serde_json::Map::new()),
            workflow_metadata: serde_json::Value::Object(serde_json::Map::new()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Assign to an epic.
    pub fn with_epic(mut self, epic_id: Uuid) -> Self {
        self.epic_id = Some(epic_id);
        self
    }

    /// Assign to a product.
    pub fn with_product(mut self, product_id: Uuid) -> Self {
        self.product_id = Some(product_id);
        self
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: PromptPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the manual ordering hint.
    pub fn with_order_index(mut self, order_index: i32) -> Self {
        self.order_index = order_index;
        self
    }

    /// Mark as a debug session.
    pub fn as_debug_session(mut self) -> Self {
        self.is_debug_session = true;
        self
    }

    /// Check if can transition to given status.
    pub fn can_transition_to(&self, new_status: PromptStatus) -> bool {
        self.status.can_transition_to(new_status)
    }

    /// Transition to a new status, bumping `updated_at`.
    pub fn transition_to(&mut self, new_status: PromptStatus) -> crate::domain::DomainResult<()> {
        if !self.can_transition_to(new_status) {
            return Err(crate::domain::DomainError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "not in the lifecycle graph".to_string(),
            });
        }
        self.status = new_status;
        self.touch();
        Ok(())
    }

    /// Bump `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether generated content is present and non-blank.
    pub fn has_generated_content(&self) -> bool {
        self.generated_prompt
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    /// Whether this row crashed between the two generation writes:
    /// status still `generating` but the content write already landed.
    pub fn is_stuck_generating(&self) -> bool {
        self.status == PromptStatus::Generating
            && self.generation_phase == GenerationPhase::ContentWritten
    }

    /// Combined searchable text (title + description).
    pub fn combined_text(&self) -> String {
        match &self.description {
            Some(desc) => format!("{} {desc}", self.title),
            None => self.title.clone(),
        }
    }

    /// Validate the prompt.
    pub fn validate(&self) -> crate::domain::DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(crate::domain::DomainError::ValidationFailed(
                "prompt title cannot be empty".to_string(),
            ));
        }
        if self.generated_at.is_some() != self.has_generated_content() {
            return Err(crate::domain::DomainError::ValidationFailed(
                "generated_at must be set exactly when generated_prompt is non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_id_roundtrip() {
        let draft = PromptId::draft();
        assert!(draft.is_draft());
        let parsed: PromptId = draft.to_string().parse().unwrap();
        assert_eq!(parsed, draft);

        let persisted = PromptId::persisted(Uuid::new_v4());
        assert!(!persisted.is_draft());
        let parsed: PromptId = persisted.to_string().parse().unwrap();
        assert_eq!(parsed, persisted);
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            PromptStatus::Todo,
            PromptStatus::InProgress,
            PromptStatus::Generating,
            PromptStatus::SendingToCursor,
            PromptStatus::SentToCursor,
            PromptStatus::CursorWorking,
            PromptStatus::PrCreated,
            PromptStatus::PrReview,
            PromptStatus::PrReady,
            PromptStatus::PrMerged,
            PromptStatus::Done,
            PromptStatus::Error,
        ] {
            assert_eq!(PromptStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(PromptStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_externally_driven_gating() {
        assert!(!PromptStatus::Todo.is_externally_driven());
        assert!(!PromptStatus::InProgress.is_externally_driven());
        assert!(!PromptStatus::Generating.is_externally_driven());
        assert!(PromptStatus::SendingToCursor.is_externally_driven());
        assert!(PromptStatus::Done.is_externally_driven());
        assert!(PromptStatus::Error.is_externally_driven());
    }

    #[test]
    fn test_cycle_stops_at_done() {
        assert_eq!(
            PromptStatus::Todo.next_in_cycle(),
            Some(PromptStatus::InProgress)
        );
        assert_eq!(
            PromptStatus::InProgress.next_in_cycle(),
            Some(PromptStatus::Done)
        );
        assert_eq!(PromptStatus::Done.next_in_cycle(), None);
        assert_eq!(PromptStatus::CursorWorking.next_in_cycle(), None);
    }

    #[test]
    fn test_generation_transitions() {
        let mut prompt = Prompt::new(Uuid::new_v4(), "Fix login bug");
        prompt.transition_to(PromptStatus::Generating).unwrap();
        prompt.transition_to(PromptStatus::Todo).unwrap();
        // Generating exits only to todo
        prompt.transition_to(PromptStatus::Generating).unwrap();
        assert!(prompt.transition_to(PromptStatus::Done).is_err());
    }

    #[test]
    fn test_dispatch_transitions() {
        let mut prompt = Prompt::new(Uuid::new_v4(), "Ship feature");
        prompt.transition_to(PromptStatus::SendingToCursor).unwrap();
        prompt.transition_to(PromptStatus::SentToCursor).unwrap();
        prompt.transition_to(PromptStatus::CursorWorking).unwrap();
        prompt.transition_to(PromptStatus::PrCreated).unwrap();
        prompt.transition_to(PromptStatus::Done).unwrap();
        assert!(prompt.status.is_terminal());
        // Reopen is allowed as an explicit override
        prompt.transition_to(PromptStatus::Todo).unwrap();
    }

    #[test]
    fn test_priority_escalation() {
        assert_eq!(PromptPriority::Low.escalated(), PromptPriority::Normal);
        assert_eq!(PromptPriority::Normal.escalated(), PromptPriority::High);
        assert_eq!(PromptPriority::High.escalated(), PromptPriority::High);
        assert_eq!(
            PromptPriority::Low.at_least(PromptPriority::Normal),
            PromptPriority::Normal
        );
        assert_eq!(
            PromptPriority::High.at_least(PromptPriority::Normal),
            PromptPriority::High
        );
    }

    #[test]
    fn test_priority_numeric_conversion() {
        assert_eq!(u8::from(PromptPriority::High), 3);
        assert_eq!(PromptPriority::try_from(2).unwrap(), PromptPriority::Normal);
        assert!(PromptPriority::try_from(0).is_err());
        assert!(PromptPriority::try_from(4).is_err());
    }

    #[test]
    fn test_stuck_detection() {
        let mut prompt = Prompt::new(Uuid::new_v4(), "Long enough description here");
        prompt.status = PromptStatus::Generating;
        prompt.generation_phase = GenerationPhase::ContentWritten;
        assert!(prompt.is_stuck_generating());

        prompt.generation_phase = GenerationPhase::StatusWritten;
        assert!(!prompt.is_stuck_generating());

        prompt.status = PromptStatus::Todo;
        prompt.generation_phase = GenerationPhase::ContentWritten;
        assert!(!prompt.is_stuck_generating());
    }

    #[test]
    fn test_validation() {
        let prompt = Prompt::new(Uuid::new_v4(), "");
        assert!(prompt.validate().is_err());

        let prompt = Prompt::new(Uuid::new_v4(), "   ");
        assert!(prompt.validate().is_err());

        let mut prompt = Prompt::new(Uuid::new_v4(), "Valid title");
        assert!(prompt.validate().is_ok());

        // generated_at without content violates the pairing invariant
        prompt.generated_at = Some(Utc::now());
        assert!(prompt.validate().is_err());
        prompt.generated_prompt = Some("generated".to_string());
        assert!(prompt.validate().is_ok());
    }
}
