//! Epic auto-assignment by text similarity.

use std::collections::HashSet;

use crate::domain::models::{AutomationConfig, Epic, Prompt};
use crate::services::automation::actions::EpicMatch;

/// Lowercased bag of words, split on anything non-alphanumeric.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Overlap coefficient between two texts: shared words over the smaller
/// bag. A short epic name fully contained in a prompt scores 1.0, which is
/// the behavior the auto-assign threshold is calibrated against.
pub fn similarity(a: &str, b: &str) -> f64 {
    let set_a = tokenize(a);
    let set_b = tokenize(b);
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    #[allow(clippy::cast_precision_loss)]
    {
        intersection as f64 / set_a.len().min(set_b.len()) as f64
    }
}

/// Match unassigned prompts against epics.
///
/// Returns `(assigned, suggested)`: matches above the auto-assign threshold
/// to write, and weaker ones above the suggest threshold to surface without
/// writing. Pure; the caller writes.
pub fn organization_pass(
    rows: &[Prompt],
    epics: &[Epic],
    config: &AutomationConfig,
) -> (Vec<EpicMatch>, Vec<EpicMatch>) {
    let mut assigned = Vec::new();
    let mut suggested = Vec::new();

    for prompt in rows {
        if prompt.epic_id.is_some() || prompt.status.is_terminal() {
            continue;
        }
        let text = prompt.combined_text();

        let best = epics
            .iter()
            .map(|epic| (epic, similarity(&text, &epic.combined_text())))
            .max_by(|(_, a), (_, b)| a.total_cmp(b));

        if let Some((epic, score)) = best {
            let candidate = EpicMatch {
                prompt_id: prompt.id.as_uuid(),
                epic_id: epic.id,
                epic_name: epic.name.clone(),
                score,
            };
            if score > config.auto_assign_threshold {
                assigned.push(candidate);
            } else if score > config.suggest_threshold {
                suggested.push(candidate);
            }
        }
    }
    (assigned, suggested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{PromptId, PromptStatus};
    use uuid::Uuid;

    fn prompt(title: &str) -> Prompt {
        let mut p = Prompt::new(Uuid::new_v4(), title);
        p.id = PromptId::persisted(Uuid::new_v4());
        p
    }

    #[test]
    fn test_tokenize_splits_and_lowercases() {
        let tokens = tokenize("Fix billing, invoice-total!");
        assert!(tokens.contains("fix"));
        assert!(tokens.contains("billing"));
        assert!(tokens.contains("invoice"));
        assert!(tokens.contains("total"));
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_similarity_uses_smaller_bag() {
        // Epic name fully contained in the prompt
        assert!((similarity("Fix billing invoice total", "Billing") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("alpha beta", "gamma delta")).abs() < f64::EPSILON);
        assert!(similarity("", "anything").abs() < f64::EPSILON);
    }

    #[test]
    fn test_contained_epic_name_auto_assigns() {
        let workspace_id = Uuid::new_v4();
        let billing = Epic::new(workspace_id, "Billing");
        let onboarding = Epic::new(workspace_id, "Onboarding");

        let rows = vec![prompt("Fix billing invoice total")];
        let (assigned, suggested) =
            organization_pass(&rows, &[billing.clone(), onboarding], &AutomationConfig::default());

        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].epic_id, billing.id);
        assert!(assigned[0].score > 0.7);
        assert!(suggested.is_empty());
    }

    #[test]
    fn test_partial_match_only_suggests() {
        let workspace_id = Uuid::new_v4();
        let epic = Epic::new(workspace_id, "billing payments refunds");

        let rows = vec![prompt("update billing page")];
        let (assigned, suggested) =
            organization_pass(&rows, &[epic.clone()], &AutomationConfig::default());

        // 1 shared word over a 3-word epic bag: 0.33, above suggest only
        assert!(assigned.is_empty());
        assert_eq!(suggested.len(), 1);
        assert_eq!(suggested[0].epic_id, epic.id);
    }

    #[test]
    fn test_unrelated_prompt_matches_nothing() {
        let workspace_id = Uuid::new_v4();
        let billing = Epic::new(workspace_id, "Billing");
        let onboarding = Epic::new(workspace_id, "Onboarding");

        let rows = vec![prompt("Improve page speed")];
        let (assigned, suggested) =
            organization_pass(&rows, &[billing, onboarding], &AutomationConfig::default());
        assert!(assigned.is_empty());
        assert!(suggested.is_empty());
    }

    #[test]
    fn test_assigned_and_terminal_rows_skipped() {
        let workspace_id = Uuid::new_v4();
        let epic = Epic::new(workspace_id, "Billing");

        let mut already = prompt("billing work");
        already.epic_id = Some(Uuid::new_v4());
        let mut done = prompt("billing cleanup");
        done.status = PromptStatus::Done;

        let (assigned, suggested) =
            organization_pass(&[already, done], &[epic], &AutomationConfig::default());
        assert!(assigned.is_empty());
        assert!(suggested.is_empty());
    }
}
