//! Pure reconciliation of change-feed events into the local collection.

use crate::domain::models::{ChangeEvent, Prompt};

/// Compute the next collection after one change event.
///
/// Returns `None` when the event changes nothing, so callers can skip the
/// collection swap. Applying the same event twice always yields `None` the
/// second time; the function is idempotent over the delivered state.
pub fn reconcile(prev: &[Prompt], event: &ChangeEvent) -> Option<Vec<Prompt>> {
    match event {
        ChangeEvent::Inserted { row } => reconcile_insert(prev, row),
        ChangeEvent::Updated { row } => reconcile_update(prev, row),
        ChangeEvent::Deleted { id } => {
            if prev.iter().any(|p| p.id.as_uuid() == *id) {
                Some(
                    prev.iter()
                        .filter(|p| p.id.as_uuid() != *id)
                        .cloned()
                        .collect(),
                )
            } else {
                None
            }
        }
    }
}

fn reconcile_insert(prev: &[Prompt], row: &Prompt) -> Option<Vec<Prompt>> {
    // Draft rows never come from the store; a draft id here is an echo of a
    // local speculative insert and must not be double-applied.
    if row.id.is_draft() {
        return None;
    }
    if prev.iter().any(|p| p.id.as_uuid() == row.id.as_uuid()) {
        return None;
    }
    let mut next = Vec::with_capacity(prev.len() + 1);
    next.push(row.clone());
    next.extend(prev.iter().cloned());
    Some(next)
}

fn reconcile_update(prev: &[Prompt], row: &Prompt) -> Option<Vec<Prompt>> {
    if row.id.is_draft() {
        return None;
    }
    let position = prev
        .iter()
        .position(|p| p.id.as_uuid() == row.id.as_uuid())?;

    let merged = merge_row(&prev[position], row);
    if merged == prev[position] {
        return None;
    }
    let mut next = prev.to_vec();
    next[position] = merged;
    Some(next)
}

/// Merge an incoming row over the local one.
///
/// The event wins field-by-field except for generated content: a feed row
/// that lags behind a local generation write carries empty content, and
/// overwriting would wipe output the user already sees. Local non-empty
/// content is kept until an event that actually carries content arrives.
fn merge_row(local: &Prompt, incoming: &Prompt) -> Prompt {
    let mut merged = incoming.clone();
    let incoming_blank = incoming
        .generated_prompt
        .as_deref()
        .is_none_or(|s| s.trim().is_empty());
    if incoming_blank && local.has_generated_content() {
        merged.generated_prompt = local.generated_prompt.clone();
        merged.generated_at = local.generated_at;
        merged.generation_phase = local.generation_phase;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{GenerationPhase, PromptId, PromptStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn persisted(title: &str) -> Prompt {
        let mut p = Prompt::new(Uuid::new_v4(), title);
        p.id = PromptId::persisted(Uuid::new_v4());
        p
    }

    #[test]
    fn test_insert_prepends() {
        let existing = persisted("Old");
        let incoming = persisted("New");

        let next = reconcile(
            &[existing.clone()],
            &ChangeEvent::Inserted {
                row: incoming.clone(),
            },
        )
        .unwrap();

        assert_eq!(next.len(), 2);
        assert_eq!(next[0].id, incoming.id);
        assert_eq!(next[1].id, existing.id);
    }

    #[test]
    fn test_insert_skips_duplicates() {
        let existing = persisted("Row");
        let next = reconcile(
            &[existing.clone()],
            &ChangeEvent::Inserted { row: existing },
        );
        assert!(next.is_none());
    }

    #[test]
    fn test_insert_skips_draft_rows() {
        let draft = Prompt::new(Uuid::new_v4(), "Draft");
        assert!(draft.id.is_draft());
        assert!(reconcile(&[], &ChangeEvent::Inserted { row: draft }).is_none());
    }

    #[test]
    fn test_update_merges_by_id() {
        let mut local = persisted("Title");
        local.status = PromptStatus::Todo;

        let mut incoming = local.clone();
        incoming.status = PromptStatus::InProgress;
        incoming.updated_at = Utc::now();

        let next = reconcile(&[local], &ChangeEvent::Updated { row: incoming }).unwrap();
        assert_eq!(next[0].status, PromptStatus::InProgress);
    }

    #[test]
    fn test_update_ignores_unknown_ids() {
        let local = persisted("Known");
        let unknown = persisted("Unknown");
        assert!(reconcile(&[local], &ChangeEvent::Updated { row: unknown }).is_none());
    }

    #[test]
    fn test_update_preserves_local_generated_content() {
        let mut local = persisted("Title");
        local.generated_prompt = Some("Generated instructions".to_string());
        local.generated_at = Some(Utc::now());
        local.generation_phase = GenerationPhase::StatusWritten;

        // Stale feed row without the generated content
        let mut incoming = local.clone();
        incoming.generated_prompt = None;
        incoming.generated_at = None;
        incoming.generation_phase = GenerationPhase::Idle;
        incoming.status = PromptStatus::InProgress;

        let next = reconcile(&[local.clone()], &ChangeEvent::Updated { row: incoming }).unwrap();
        assert_eq!(next[0].generated_prompt, local.generated_prompt);
        assert_eq!(next[0].generated_at, local.generated_at);
        assert_eq!(next[0].generation_phase, GenerationPhase::StatusWritten);
        // Everything else still comes from the event
        assert_eq!(next[0].status, PromptStatus::InProgress);
    }

    #[test]
    fn test_update_accepts_incoming_generated_content() {
        let mut local = persisted("Title");
        local.generated_prompt = Some("Old".to_string());
        local.generated_at = Some(Utc::now());

        let mut incoming = local.clone();
        incoming.generated_prompt = Some("New".to_string());
        incoming.generated_at = Some(Utc::now());

        let next = reconcile(&[local], &ChangeEvent::Updated { row: incoming }).unwrap();
        assert_eq!(next[0].generated_prompt.as_deref(), Some("New"));
    }

    #[test]
    fn test_delete_removes_by_id() {
        let row = persisted("Row");
        let id = row.id.as_uuid();

        let next = reconcile(&[row], &ChangeEvent::Deleted { id }).unwrap();
        assert!(next.is_empty());

        // Second delivery is a no-op
        assert!(reconcile(&next, &ChangeEvent::Deleted { id }).is_none());
    }

    #[test]
    fn test_idempotent_over_delivered_state() {
        let row = persisted("Row");
        let event = ChangeEvent::Inserted { row };

        let once = reconcile(&[], &event).unwrap();
        assert!(reconcile(&once, &event).is_none());
    }
}
