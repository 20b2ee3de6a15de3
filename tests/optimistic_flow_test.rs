//! End-to-end tests for the optimistic write path: every mutation lands
//! locally first, commits remotely, and rolls back cleanly on rejection.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{persisted_prompt, test_config, InMemoryStore, MockCursor, MockTransformer};
use promptdeck::adapters::sqlite::{create_migrated_test_pool, SqliteAuditStore, SqliteEpicStore};
use promptdeck::application::WorkspaceSession;
use promptdeck::domain::models::{PromptPriority, PromptStatus};
use promptdeck::domain::ports::NewPrompt;
use uuid::Uuid;

type TestSession = WorkspaceSession<
    InMemoryStore,
    MockTransformer,
    MockCursor,
    SqliteEpicStore,
    SqliteAuditStore,
>;

async fn open_session(store: Arc<InMemoryStore>) -> (TestSession, Uuid) {
    let workspace_id = Uuid::new_v4();
    let pool = create_migrated_test_pool()
        .await
        .expect("failed to create test pool");
    let mut session = WorkspaceSession::new(
        workspace_id,
        store,
        Arc::new(MockTransformer::returning("Expanded instructions")),
        Arc::new(MockCursor::new()),
        Arc::new(SqliteEpicStore::new(pool.clone())),
        Arc::new(SqliteAuditStore::new(pool)),
        &test_config(),
    );
    session.start().await.expect("failed to start session");
    (session, workspace_id)
}

#[tokio::test]
async fn test_create_shows_locally_and_persists() {
    let store = Arc::new(InMemoryStore::new());
    let (session, workspace_id) = open_session(store.clone()).await;

    let prompt = session
        .prompts()
        .create(NewPrompt::new(workspace_id, "Fix login"))
        .await
        .expect("create failed");

    assert!(!prompt.id.is_draft());
    assert_eq!(prompt.status, PromptStatus::Todo);
    assert_eq!(session.prompts().list().len(), 1);
    assert!(store.row(prompt.id.as_uuid()).is_some());

    session.shutdown().await;
}

#[tokio::test]
async fn test_failed_insert_rolls_back_local_row() {
    let store = Arc::new(InMemoryStore::new());
    let (session, workspace_id) = open_session(store.clone()).await;

    store.fail_next_insert.store(true, Ordering::SeqCst);
    let result = session
        .prompts()
        .create(NewPrompt::new(workspace_id, "Doomed"))
        .await;

    assert!(result.is_err());
    assert!(session.prompts().list().is_empty());
    assert!(store.all_rows().is_empty());

    session.shutdown().await;
}

#[tokio::test]
async fn test_failed_update_restores_previous_row() {
    let store = Arc::new(InMemoryStore::new());
    let (session, workspace_id) = open_session(store.clone()).await;

    let prompt = session
        .prompts()
        .create(NewPrompt::new(workspace_id, "Original title"))
        .await
        .expect("create failed");
    let id = prompt.id.as_uuid();

    store.fail_next_update.store(true, Ordering::SeqCst);
    let result = session
        .prompts()
        .update(id, Some("New title".to_string()), None)
        .await;

    assert!(result.is_err());
    let local = session.prompts().get(id).expect("row vanished");
    assert_eq!(local.title, "Original title");
    assert_eq!(store.row(id).unwrap().title, "Original title");

    session.shutdown().await;
}

#[tokio::test]
async fn test_cycle_marks_done_and_reopen() {
    let store = Arc::new(InMemoryStore::new());
    let (session, workspace_id) = open_session(store).await;

    let prompt = session
        .prompts()
        .create(NewPrompt::new(workspace_id, "Cycled"))
        .await
        .expect("create failed");
    let id = prompt.id.as_uuid();

    let p = session.prompts().cycle_status(id).await.expect("cycle");
    assert_eq!(p.status, PromptStatus::InProgress);
    let p = session.prompts().cycle_status(id).await.expect("cycle");
    assert_eq!(p.status, PromptStatus::Done);

    // Terminal states do not cycle further
    let p = session.prompts().cycle_status(id).await.expect("cycle");
    assert_eq!(p.status, PromptStatus::Done);

    let p = session.prompts().reopen(id).await.expect("reopen");
    assert_eq!(p.status, PromptStatus::Todo);

    // Reopen is only valid out of a terminal state
    assert!(session.prompts().reopen(id).await.is_err());

    session.shutdown().await;
}

#[tokio::test]
async fn test_cycle_is_gated_while_agent_owns_the_row() {
    let store = Arc::new(InMemoryStore::new());
    let (session, workspace_id) = open_session(store.clone()).await;

    let mut row = persisted_prompt(workspace_id, "Agent-held");
    row.status = PromptStatus::CursorWorking;
    let id = row.id.as_uuid();
    store.seed(row);
    session.prompts().refresh().await.expect("refresh failed");

    // Cycling is a silent no-op while dispatch owns the status.
    let p = session.prompts().cycle_status(id).await.expect("cycle");
    assert_eq!(p.status, PromptStatus::CursorWorking);
    assert_eq!(
        store.row(id).expect("row missing").status,
        PromptStatus::CursorWorking
    );

    // Priority is never gated, even while an agent holds the row.
    let p = session
        .prompts()
        .set_priority(id, PromptPriority::High)
        .await
        .expect("set priority");
    assert_eq!(p.priority, PromptPriority::High);
    assert_eq!(p.status, PromptStatus::CursorWorking);

    session.shutdown().await;
}

#[tokio::test]
async fn test_priority_and_epic_assignment() {
    let store = Arc::new(InMemoryStore::new());
    let (session, workspace_id) = open_session(store.clone()).await;

    let epic = session
        .create_epic("Billing", Some("Invoices and refunds"))
        .await
        .expect("create epic");

    let prompt = session
        .prompts()
        .create(NewPrompt::new(workspace_id, "Export invoices"))
        .await
        .expect("create failed");
    let id = prompt.id.as_uuid();

    let p = session
        .prompts()
        .set_priority(id, PromptPriority::High)
        .await
        .expect("set priority");
    assert_eq!(p.priority, PromptPriority::High);

    let p = session
        .prompts()
        .assign_epic(id, Some(epic.id))
        .await
        .expect("assign epic");
    assert_eq!(p.epic_id, Some(epic.id));
    assert_eq!(store.row(id).unwrap().epic_id, Some(epic.id));

    let p = session
        .prompts()
        .assign_epic(id, None)
        .await
        .expect("clear epic");
    assert_eq!(p.epic_id, None);

    session.shutdown().await;
}

#[tokio::test]
async fn test_delete_and_failed_delete_rollback() {
    let store = Arc::new(InMemoryStore::new());
    let (session, workspace_id) = open_session(store.clone()).await;

    let keep = session
        .prompts()
        .create(NewPrompt::new(workspace_id, "Keep me"))
        .await
        .expect("create failed");
    let gone = session
        .prompts()
        .create(NewPrompt::new(workspace_id, "Delete me"))
        .await
        .expect("create failed");

    session
        .prompts()
        .delete(gone.id.as_uuid())
        .await
        .expect("delete failed");
    assert_eq!(session.prompts().list().len(), 1);
    assert!(store.row(gone.id.as_uuid()).is_none());

    store.fail_next_delete.store(true, Ordering::SeqCst);
    let result = session.prompts().delete(keep.id.as_uuid()).await;
    assert!(result.is_err());
    // The rejected delete reappears locally
    assert_eq!(session.prompts().list().len(), 1);
    assert!(session.prompts().get(keep.id.as_uuid()).is_some());

    session.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_copies_fields_and_resets_lifecycle() {
    let store = Arc::new(InMemoryStore::new());
    let (session, workspace_id) = open_session(store).await;

    let original = session
        .prompts()
        .create(
            NewPrompt::new(workspace_id, "Original")
                .with_description("Needs the full twenty characters here")
                .with_priority(PromptPriority::High),
        )
        .await
        .expect("create failed");

    let copy = session
        .prompts()
        .duplicate(original.id.as_uuid())
        .await
        .expect("duplicate failed");

    assert_eq!(copy.title, "Original (Copy)");
    assert_eq!(copy.description, original.description);
    assert_eq!(copy.priority, PromptPriority::High);
    assert_eq!(copy.status, PromptStatus::Todo);
    assert!(copy.cursor_agent_id.is_none());
    assert!(copy.generated_prompt.is_none());
    assert_ne!(copy.id.as_uuid(), original.id.as_uuid());

    session.shutdown().await;
}
