//! Priority escalation pass.

use chrono::{DateTime, Duration, Utc};

use crate::domain::models::{AutomationConfig, Prompt, PromptPriority, PromptStatus};
use crate::services::automation::actions::PriorityChange;

/// Decide priority escalations over the collection.
///
/// Two rules, applied in order:
/// - a prompt created inside the window whose text carries an urgency
///   keyword moves one step up, capped at high
/// - an in-progress prompt touched inside the window is floored at normal,
///   for at most `max_activity_boosts` rows per pass
///
/// Terminal and debug rows are left alone. Pure; the caller writes.
pub fn escalation_pass(
    rows: &[Prompt],
    config: &AutomationConfig,
    now: DateTime<Utc>,
) -> Vec<PriorityChange> {
    let cutoff = now - Duration::hours(config.recent_window_hours);
    let mut changes = Vec::new();
    let mut activity_boosts = 0usize;

    for prompt in rows {
        if prompt.status.is_terminal() || prompt.is_debug_session {
            continue;
        }

        let mut priority = prompt.priority;
        let mut reason = None;

        if prompt.created_at >= cutoff {
            if let Some(keyword) = matched_keyword(prompt, &config.urgent_keywords) {
                let escalated = priority.escalated();
                if escalated != priority {
                    priority = escalated;
                    reason = Some(format!("urgent keyword '{keyword}'"));
                }
            }
        }

        if prompt.status == PromptStatus::InProgress
            && prompt.updated_at >= cutoff
            && activity_boosts < config.max_activity_boosts
        {
            let floored = priority.at_least(PromptPriority::Normal);
            if floored != priority {
                priority = floored;
                reason = Some("active task floored at normal priority".to_string());
                activity_boosts += 1;
            }
        }

        if let Some(reason) = reason {
            changes.push(PriorityChange {
                prompt_id: prompt.id.as_uuid(),
                from: prompt.priority,
                to: priority,
                reason,
            });
        }
    }
    changes
}

fn matched_keyword<'a>(prompt: &Prompt, keywords: &'a [String]) -> Option<&'a str> {
    let text = prompt.combined_text().to_lowercase();
    keywords
        .iter()
        .find(|k| text.contains(k.as_str()))
        .map(String::as_str)
}
