//! Status transition table for agent-driven prompts.

use crate::domain::models::{AgentRunStatus, PrStatus, Prompt, PromptStatus};

/// A transition the table decided on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionDecision {
    pub to: PromptStatus,
    pub reason: &'static str,
}

impl TransitionDecision {
    const fn new(to: PromptStatus, reason: &'static str) -> Self {
        Self { to, reason }
    }
}

/// Decide whether a prompt should move, from its current status, its linked
/// agent run, and its pull request.
///
/// Rules are checked top-down and the first match wins:
/// 1. a merged pull request finishes the prompt
/// 2. a completed run with a pull request means review starts
/// 3. a completed run without one means the work simply landed
/// 4. a failed or cancelled run resets the prompt to todo
/// 5. a running agent moves sent -> working
pub fn decide_transition(prompt: &Prompt) -> Option<TransitionDecision> {
    let run = prompt.cursor_agent_status;

    if matches!(
        prompt.status,
        PromptStatus::InProgress | PromptStatus::PrCreated
    ) && prompt.github_pr_url.is_some()
        && prompt.github_pr_status == Some(PrStatus::Merged)
    {
        return Some(TransitionDecision::new(
            PromptStatus::Done,
            "Pull request merged successfully",
        ));
    }

    if prompt.status == PromptStatus::CursorWorking && run == Some(AgentRunStatus::Completed) {
        return Some(if prompt.github_pr_url.is_some() {
            TransitionDecision::new(PromptStatus::PrCreated, "Cursor completed - PR created")
        } else {
            TransitionDecision::new(PromptStatus::Done, "Cursor completed - Task finished")
        });
    }

    if matches!(
        prompt.status,
        PromptStatus::SendingToCursor | PromptStatus::SentToCursor | PromptStatus::CursorWorking
    ) {
        match run {
            Some(AgentRunStatus::Failed) => {
                return Some(TransitionDecision::new(
                    PromptStatus::Todo,
                    "Cursor failed - Reset to todo",
                ));
            }
            Some(AgentRunStatus::Cancelled) => {
                return Some(TransitionDecision::new(
                    PromptStatus::Todo,
                    "Cursor cancelled - Reset to todo",
                ));
            }
            _ => {}
        }
    }

    if prompt.status == PromptStatus::SentToCursor && run == Some(AgentRunStatus::Running) {
        return Some(TransitionDecision::new(
            PromptStatus::CursorWorking,
            "Cursor agent started working",
        ));
    }

    None
}
