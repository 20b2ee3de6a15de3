use chrono::Utc;
use promptdeck::domain::models::{
    ChangeEvent, GenerationPhase, Prompt, PromptId, PromptStatus,
};
use promptdeck::services::reconcile;
use proptest::prelude::*;
use std::collections::HashSet;
use uuid::Uuid;

fn persisted_row(workspace_id: Uuid, n: usize) -> Prompt {
    let mut row = Prompt::new(workspace_id, format!("Prompt {n}"));
    row.id = PromptId::persisted(Uuid::new_v4());
    row
}

fn collection(size: usize) -> Vec<Prompt> {
    let workspace_id = Uuid::new_v4();
    (0..size).map(|n| persisted_row(workspace_id, n)).collect()
}

proptest! {
    /// Property: a second delivery of the same event changes nothing
    ///
    /// Whatever one event does to the collection, delivering it again over
    /// the resulting state must return `None`.
    #[test]
    fn prop_second_delivery_is_a_no_op(size in 1usize..20, pick in 0usize..20) {
        let prev = collection(size);
        let target = prev[pick % size].clone();

        let mut updated = target.clone();
        updated.status = PromptStatus::InProgress;
        updated.updated_at = Utc::now();

        let events = [
            ChangeEvent::Inserted {
                row: persisted_row(target.workspace_id, 99),
            },
            ChangeEvent::Updated { row: updated },
            ChangeEvent::Deleted {
                id: target.id.as_uuid(),
            },
        ];

        for event in events {
            if let Some(next) = reconcile(&prev, &event) {
                prop_assert!(reconcile(&next, &event).is_none());
            }
        }
    }

    /// Property: insertion prepends and keeps every existing row in order
    #[test]
    fn prop_insert_prepends_and_preserves_order(size in 0usize..20) {
        let prev = collection(size);
        let row = persisted_row(Uuid::new_v4(), 99);

        let next = reconcile(&prev, &ChangeEvent::Inserted { row: row.clone() })
            .expect("fresh id must insert");

        prop_assert_eq!(next.len(), prev.len() + 1);
        prop_assert_eq!(next[0].id, row.id);
        for (before, after) in prev.iter().zip(&next[1..]) {
            prop_assert_eq!(before.id, after.id);
        }
    }

    /// Property: deletion removes exactly the target row
    ///
    /// Every other row survives, and a delete for an unknown id is a no-op.
    #[test]
    fn prop_delete_removes_exactly_the_target(size in 1usize..20, pick in 0usize..20) {
        let prev = collection(size);
        let target_id = prev[pick % size].id.as_uuid();

        let next = reconcile(&prev, &ChangeEvent::Deleted { id: target_id })
            .expect("known id must delete");

        prop_assert_eq!(next.len(), prev.len() - 1);
        prop_assert!(next.iter().all(|p| p.id.as_uuid() != target_id));

        let survivors: HashSet<Uuid> = next.iter().map(|p| p.id.as_uuid()).collect();
        for row in &prev {
            if row.id.as_uuid() != target_id {
                prop_assert!(survivors.contains(&row.id.as_uuid()));
            }
        }

        prop_assert!(reconcile(&prev, &ChangeEvent::Deleted { id: Uuid::new_v4() }).is_none());
    }

    /// Property: an update rewrites only the target position
    #[test]
    fn prop_update_rewrites_only_the_target(size in 1usize..20, pick in 0usize..20) {
        let prev = collection(size);
        let position = pick % size;

        let mut incoming = prev[position].clone();
        incoming.title = "Renamed".to_string();

        let next = reconcile(&prev, &ChangeEvent::Updated { row: incoming })
            .expect("changed row must update");

        prop_assert_eq!(next.len(), prev.len());
        for (i, (before, after)) in prev.iter().zip(&next).enumerate() {
            prop_assert_eq!(before.id, after.id);
            if i == position {
                prop_assert_eq!(after.title.as_str(), "Renamed");
            } else {
                prop_assert_eq!(before, after);
            }
        }
    }

    /// Property: a stale feed row never wipes locally generated content
    ///
    /// Feed rows that lag behind a local generation write carry blank
    /// content; the merge must keep the local output while still taking the
    /// rest of the incoming fields.
    #[test]
    fn prop_stale_rows_never_wipe_generated_content(size in 1usize..20, pick in 0usize..20) {
        let mut prev = collection(size);
        let position = pick % size;
        prev[position].generated_prompt = Some("Committed output".to_string());
        prev[position].generated_at = Some(Utc::now());
        prev[position].generation_phase = GenerationPhase::StatusWritten;

        let mut incoming = prev[position].clone();
        incoming.generated_prompt = None;
        incoming.generated_at = None;
        incoming.generation_phase = GenerationPhase::Idle;
        incoming.status = PromptStatus::InProgress;

        let next = reconcile(&prev, &ChangeEvent::Updated { row: incoming })
            .expect("status change must update");

        prop_assert_eq!(
            next[position].generated_prompt.as_deref(),
            Some("Committed output")
        );
        prop_assert_eq!(next[position].generation_phase, GenerationPhase::StatusWritten);
        prop_assert_eq!(next[position].status, PromptStatus::InProgress);
    }

    /// Property: draft ids are local speculation and never come from the feed
    #[test]
    fn prop_draft_rows_are_ignored(size in 0usize..20) {
        let prev = collection(size);
        let draft = Prompt::new(Uuid::new_v4(), "Draft idea");
        prop_assert!(draft.id.is_draft());

        prop_assert!(reconcile(&prev, &ChangeEvent::Inserted { row: draft.clone() }).is_none());
        prop_assert!(reconcile(&prev, &ChangeEvent::Updated { row: draft }).is_none());
    }
}
