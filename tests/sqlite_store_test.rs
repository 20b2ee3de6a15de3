//! Tests for the SQLite adapters against a migrated in-memory database.

use std::time::Duration;

use chrono::Utc;
use promptdeck::adapters::sqlite::{
    create_migrated_test_pool, SqliteAuditStore, SqliteEpicStore, SqlitePromptStore,
};
use promptdeck::domain::models::{ActivityRecord, Epic, EpicStatus, PromptPriority, PromptStatus};
use promptdeck::domain::ports::{
    AuditStore, EpicStore, NewPrompt, PromptFilter, PromptPatch, PromptStore,
};
use promptdeck::DomainError;
use serde_json::json;
use uuid::Uuid;

async fn prompt_store() -> SqlitePromptStore {
    let pool = create_migrated_test_pool()
        .await
        .expect("failed to create test pool");
    SqlitePromptStore::new(pool)
}

#[tokio::test]
async fn test_insert_and_get_round_trip() {
    let store = prompt_store().await;
    let workspace_id = Uuid::new_v4();
    let epic_id = Uuid::new_v4();

    let inserted = store
        .insert(
            NewPrompt::new(workspace_id, "Add exports")
                .with_description("CSV and JSON export for the billing page")
                .with_priority(PromptPriority::High)
                .with_epic(epic_id)
                .with_order_index(3),
        )
        .await
        .expect("insert failed");

    assert!(!inserted.id.is_draft());
    let fetched = store
        .get(inserted.id.as_uuid())
        .await
        .expect("get failed")
        .expect("row missing");

    assert_eq!(fetched.title, "Add exports");
    assert_eq!(
        fetched.description.as_deref(),
        Some("CSV and JSON export for the billing page")
    );
    assert_eq!(fetched.priority, PromptPriority::High);
    assert_eq!(fetched.epic_id, Some(epic_id));
    assert_eq!(fetched.order_index, 3);
    assert_eq!(fetched.status, PromptStatus::Todo);
    assert_eq!(fetched.cursor_logs, json!({}));
}

#[tokio::test]
async fn test_list_filters_and_ordering() {
    let store = prompt_store().await;
    let workspace_id = Uuid::new_v4();
    let epic_id = Uuid::new_v4();

    let first = store
        .insert(NewPrompt::new(workspace_id, "Pinned").with_order_index(0))
        .await
        .expect("insert failed");
    let second = store
        .insert(
            NewPrompt::new(workspace_id, "Grouped")
                .with_epic(epic_id)
                .with_order_index(1),
        )
        .await
        .expect("insert failed");
    let debug = store
        .insert(
            NewPrompt::new(workspace_id, "Scratch")
                .as_debug_session()
                .with_order_index(2),
        )
        .await
        .expect("insert failed");
    store
        .insert(NewPrompt::new(Uuid::new_v4(), "Other workspace"))
        .await
        .expect("insert failed");
    store
        .update(second.id.as_uuid(), PromptPatch::status(PromptStatus::Done))
        .await
        .expect("update failed");

    let all = store
        .list(PromptFilter::workspace(workspace_id))
        .await
        .expect("list failed");
    assert_eq!(all.len(), 3);
    // order_index ascending
    assert_eq!(all[0].id, first.id);
    assert_eq!(all[1].id, second.id);
    assert_eq!(all[2].id, debug.id);

    let done = store
        .list(PromptFilter::workspace(workspace_id).with_status(PromptStatus::Done))
        .await
        .expect("list failed");
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id, second.id);

    let grouped = store
        .list(PromptFilter::workspace(workspace_id).with_epic(epic_id))
        .await
        .expect("list failed");
    assert_eq!(grouped.len(), 1);

    let without_debug = store
        .list(PromptFilter::workspace(workspace_id).without_debug())
        .await
        .expect("list failed");
    assert_eq!(without_debug.len(), 2);

    let mut limited = PromptFilter::workspace(workspace_id);
    limited.limit = Some(1);
    let limited = store.list(limited).await.expect("list failed");
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, first.id);
}

#[tokio::test]
async fn test_list_updated_after_cutoff() {
    let store = prompt_store().await;
    let workspace_id = Uuid::new_v4();

    let old = store
        .insert(NewPrompt::new(workspace_id, "Settled"))
        .await
        .expect("insert failed");
    let cutoff = Utc::now();
    tokio::time::sleep(Duration::from_millis(5)).await;
    store
        .update(old.id.as_uuid(), PromptPatch::status(PromptStatus::Done))
        .await
        .expect("update failed");

    let changed = store
        .list(PromptFilter::workspace(workspace_id).updated_after(cutoff))
        .await
        .expect("list failed");
    assert_eq!(changed.len(), 1);
}

#[tokio::test]
async fn test_patch_only_touches_named_fields() {
    let store = prompt_store().await;
    let workspace_id = Uuid::new_v4();
    let inserted = store
        .insert(
            NewPrompt::new(workspace_id, "Original")
                .with_description("Keep this")
                .with_priority(PromptPriority::Low),
        )
        .await
        .expect("insert failed");
    let id = inserted.id.as_uuid();

    let updated = store
        .update(
            id,
            PromptPatch {
                title: Some("Renamed".to_string()),
                ..PromptPatch::default()
            },
        )
        .await
        .expect("update failed");

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.description.as_deref(), Some("Keep this"));
    assert_eq!(updated.priority, PromptPriority::Low);
    assert!(updated.updated_at > inserted.updated_at);
}

#[tokio::test]
async fn test_cursor_logs_accumulate_across_patches() {
    let store = prompt_store().await;
    let workspace_id = Uuid::new_v4();
    let inserted = store
        .insert(NewPrompt::new(workspace_id, "Agent work"))
        .await
        .expect("insert failed");
    let id = inserted.id.as_uuid();

    store
        .update(
            id,
            PromptPatch {
                merge_cursor_logs: Some(json!({"launched_at": "t0", "last_status": "CREATING"})),
                ..PromptPatch::default()
            },
        )
        .await
        .expect("update failed");
    let row = store
        .update(
            id,
            PromptPatch {
                merge_cursor_logs: Some(json!({"last_status": "RUNNING"})),
                ..PromptPatch::default()
            },
        )
        .await
        .expect("update failed");

    // Earlier keys survive, the repeated key takes the latest value.
    assert_eq!(row.cursor_logs["launched_at"], "t0");
    assert_eq!(row.cursor_logs["last_status"], "RUNNING");
}

#[tokio::test]
async fn test_update_unknown_row_is_not_found() {
    let store = prompt_store().await;
    let missing = Uuid::new_v4();
    let err = store
        .update(missing, PromptPatch::status(PromptStatus::Done))
        .await
        .expect_err("expected not found");
    assert!(matches!(err, DomainError::PromptNotFound(id) if id == missing));
}

#[tokio::test]
async fn test_assign_and_clear_epic() {
    let store = prompt_store().await;
    let workspace_id = Uuid::new_v4();
    let epic_id = Uuid::new_v4();
    let inserted = store
        .insert(NewPrompt::new(workspace_id, "Groupable"))
        .await
        .expect("insert failed");
    let id = inserted.id.as_uuid();

    let row = store
        .assign_epic(id, Some(epic_id))
        .await
        .expect("assign failed");
    assert_eq!(row.epic_id, Some(epic_id));

    let row = store.assign_epic(id, None).await.expect("clear failed");
    assert_eq!(row.epic_id, None);
}

#[tokio::test]
async fn test_delete_removes_row() {
    let store = prompt_store().await;
    let workspace_id = Uuid::new_v4();
    let inserted = store
        .insert(NewPrompt::new(workspace_id, "Short-lived"))
        .await
        .expect("insert failed");
    let id = inserted.id.as_uuid();

    store.delete(id).await.expect("delete failed");
    assert!(store.get(id).await.expect("get failed").is_none());

    let err = store.delete(id).await.expect_err("expected not found");
    assert!(matches!(err, DomainError::PromptNotFound(_)));
}

#[tokio::test]
async fn test_get_by_agent_linkage() {
    let store = prompt_store().await;
    let workspace_id = Uuid::new_v4();
    let inserted = store
        .insert(NewPrompt::new(workspace_id, "Dispatched"))
        .await
        .expect("insert failed");

    store
        .update(
            inserted.id.as_uuid(),
            PromptPatch {
                cursor_agent_id: Some("agent-7".to_string()),
                ..PromptPatch::default()
            },
        )
        .await
        .expect("update failed");

    let found = store
        .get_by_agent("agent-7")
        .await
        .expect("get_by_agent failed")
        .expect("row missing");
    assert_eq!(found.id, inserted.id);

    assert!(store
        .get_by_agent("agent-999")
        .await
        .expect("get_by_agent failed")
        .is_none());
}

#[tokio::test]
async fn test_every_write_reaches_the_change_feed() {
    let store = prompt_store().await;
    let workspace_id = Uuid::new_v4();
    let mut feed = store.subscribe();

    let inserted = store
        .insert(NewPrompt::new(workspace_id, "Watched"))
        .await
        .expect("insert failed");
    let id = inserted.id.as_uuid();
    store
        .update(id, PromptPatch::status(PromptStatus::InProgress))
        .await
        .expect("update failed");
    store.delete(id).await.expect("delete failed");

    let mut kinds = Vec::new();
    for _ in 0..3 {
        let event = tokio::time::timeout(Duration::from_secs(1), feed.recv())
            .await
            .expect("feed timed out")
            .expect("feed closed");
        assert_eq!(event.row_id(), id);
        kinds.push(event.kind());
    }
    assert_eq!(kinds, vec!["inserted", "updated", "deleted"]);
}

#[tokio::test]
async fn test_epic_store_round_trip() {
    let pool = create_migrated_test_pool()
        .await
        .expect("failed to create test pool");
    let store = SqliteEpicStore::new(pool);
    let workspace_id = Uuid::new_v4();

    let epic = Epic::new(workspace_id, "Checkout")
        .with_description("Everything cart and payment")
        .with_color("#ff7700");
    store.insert(&epic).await.expect("insert failed");

    let fetched = store
        .get(epic.id)
        .await
        .expect("get failed")
        .expect("epic missing");
    assert_eq!(fetched.name, "Checkout");
    assert_eq!(
        fetched.description.as_deref(),
        Some("Everything cart and payment")
    );
    assert_eq!(fetched.color, "#ff7700");
    assert_eq!(fetched.status, EpicStatus::Todo);

    let mut renamed = fetched;
    renamed.name = "Checkout v2".to_string();
    renamed.status = EpicStatus::InProgress;
    renamed.updated_at = Utc::now();
    store.update(&renamed).await.expect("update failed");

    let listed = store.list(workspace_id).await.expect("list failed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Checkout v2");
    assert_eq!(listed[0].status, EpicStatus::InProgress);

    store.delete(epic.id).await.expect("delete failed");
    assert!(store.get(epic.id).await.expect("get failed").is_none());

    let err = store.update(&renamed).await.expect_err("expected not found");
    assert!(matches!(err, DomainError::EpicNotFound(id) if id == epic.id));
}

#[tokio::test]
async fn test_audit_store_append_and_agent_identity() {
    let pool = create_migrated_test_pool()
        .await
        .expect("failed to create test pool");
    let store = SqliteAuditStore::new(pool);
    let workspace_id = Uuid::new_v4();

    let agent = store
        .find_or_create_agent(workspace_id)
        .await
        .expect("agent lookup failed");
    let again = store
        .find_or_create_agent(workspace_id)
        .await
        .expect("agent lookup failed");
    assert_eq!(agent.id, again.id);

    let record = ActivityRecord::new(workspace_id, agent.id, "auto_status_update")
        .with_details("2 status updates")
        .finished(true, 12);
    store.append(&record).await.expect("append failed");
    store.touch_agent(agent.id).await.expect("touch failed");

    let records = store
        .list_recent(workspace_id, 10)
        .await
        .expect("list_recent failed");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "auto_status_update");
    assert_eq!(records[0].details.as_deref(), Some("2 status updates"));
    assert!(records[0].success);
    assert_eq!(records[0].processing_time_ms, 12);

    // Other workspaces see nothing.
    let other = store
        .list_recent(Uuid::new_v4(), 10)
        .await
        .expect("list_recent failed");
    assert!(other.is_empty());
}
