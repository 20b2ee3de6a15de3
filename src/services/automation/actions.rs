//! Automation action and outcome types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::{ActivityEntity, EpicStatus, PromptPriority, PromptStatus};
use crate::services::automation::patterns::PatternReport;

/// Target of a single-entity status recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AutomationEntity {
    Prompt(Uuid),
    Epic(Uuid),
}

/// One automation action to run.
///
/// Each variant carries exactly the parameters its pass needs, so a caller
/// cannot ask for a prompt-scoped pass without a prompt id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AutomationAction {
    /// Recompute status from linked state. A prompt entity runs the
    /// transition table; an epic entity recomputes completion from its
    /// prompts; no entity sweeps every prompt in the workspace.
    AutoStatusUpdate { entity: Option<AutomationEntity> },
    /// Run the transition table for one prompt.
    TaskAutomation { prompt_id: Uuid },
    /// Escalate priorities by urgency keywords and recent activity.
    PriorityAdjustment,
    /// Assign or suggest epics for unassigned prompts by text similarity.
    EpicOrganization,
    /// Summarize recent activity patterns. Read-only.
    AnalyzePromptPatterns,
}

impl AutomationAction {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AutoStatusUpdate { .. } => "auto_status_update",
            Self::TaskAutomation { .. } => "task_automation",
            Self::PriorityAdjustment => "priority_adjustment",
            Self::EpicOrganization => "epic_organization",
            Self::AnalyzePromptPatterns => "analyze_prompt_patterns",
        }
    }

    /// The entity this action is scoped to, if any.
    pub const fn entity(&self) -> Option<(ActivityEntity, Uuid)> {
        match self {
            Self::AutoStatusUpdate {
                entity: Some(AutomationEntity::Prompt(id)),
            }
            | Self::TaskAutomation { prompt_id: id } => Some((ActivityEntity::Prompt, *id)),
            Self::AutoStatusUpdate {
                entity: Some(AutomationEntity::Epic(id)),
            } => Some((ActivityEntity::Epic, *id)),
            _ => None,
        }
    }
}

/// One status move decided by the transition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub prompt_id: Uuid,
    pub from: PromptStatus,
    pub to: PromptStatus,
    pub reason: String,
}

/// One priority escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityChange {
    pub prompt_id: Uuid,
    pub from: PromptPriority,
    pub to: PromptPriority,
    pub reason: String,
}

/// One prompt-to-epic match above a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpicMatch {
    pub prompt_id: Uuid,
    pub epic_id: Uuid,
    pub epic_name: String,
    pub score: f64,
}

/// What an automation action did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AutomationOutcome {
    /// Rows moved by the transition table.
    StatusUpdates { applied: Vec<StatusChange> },
    /// Priorities escalated.
    PriorityChanges { applied: Vec<PriorityChange> },
    /// Epics assigned outright and epics worth suggesting.
    EpicAssignments {
        assigned: Vec<EpicMatch>,
        suggested: Vec<EpicMatch>,
    },
    /// An epic's completion status recomputed from its prompts.
    EpicCompletion {
        epic_id: Uuid,
        from: EpicStatus,
        to: EpicStatus,
    },
    /// Pattern analysis report.
    Patterns(PatternReport),
    /// Nothing matched.
    NoChange,
}

impl AutomationOutcome {
    /// How many rows the action wrote.
    pub fn writes(&self) -> usize {
        match self {
            Self::StatusUpdates { applied } => applied.len(),
            Self::PriorityChanges { applied } => applied.len(),
            Self::EpicAssignments { assigned, .. } => assigned.len(),
            Self::EpicCompletion { .. } => 1,
            Self::Patterns(_) | Self::NoChange => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(
            AutomationAction::AutoStatusUpdate { entity: None }.name(),
            "auto_status_update"
        );
        assert_eq!(
            AutomationAction::PriorityAdjustment.name(),
            "priority_adjustment"
        );
        assert_eq!(
            AutomationAction::AnalyzePromptPatterns.name(),
            "analyze_prompt_patterns"
        );
    }

    #[test]
    fn test_entity_scoping() {
        let id = Uuid::new_v4();
        assert_eq!(
            AutomationAction::TaskAutomation { prompt_id: id }.entity(),
            Some((ActivityEntity::Prompt, id))
        );
        assert_eq!(
            AutomationAction::AutoStatusUpdate {
                entity: Some(AutomationEntity::Epic(id))
            }
            .entity(),
            Some((ActivityEntity::Epic, id))
        );
        assert_eq!(
            AutomationAction::AutoStatusUpdate { entity: None }.entity(),
            None
        );
        assert_eq!(AutomationAction::EpicOrganization.entity(), None);
    }

    #[test]
    fn test_outcome_write_counts() {
        assert_eq!(AutomationOutcome::NoChange.writes(), 0);
        let outcome = AutomationOutcome::StatusUpdates {
            applied: vec![StatusChange {
                prompt_id: Uuid::new_v4(),
                from: PromptStatus::CursorWorking,
                to: PromptStatus::Done,
                reason: "Cursor completed - Task finished".to_string(),
            }],
        };
        assert_eq!(outcome.writes(), 1);
    }
}
