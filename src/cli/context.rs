//! Shared wiring for CLI commands.
//!
//! Every command starts from a [`CommandContext`]: loaded config plus an open
//! database pool. Commands that need the live mutation engine open a
//! [`Session`] on top of it.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{
    initialize_from_config, SqliteAuditStore, SqliteEpicStore, SqlitePromptStore,
};
use crate::application::WorkspaceSession;
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::cursor::HttpCursorAgent;
use crate::infrastructure::transform::HttpTransformer;

/// The concrete session type the CLI wires up.
pub type Session = WorkspaceSession<
    SqlitePromptStore,
    HttpTransformer,
    HttpCursorAgent,
    SqliteEpicStore,
    SqliteAuditStore,
>;

/// Loaded configuration and database pool for a single command invocation.
pub struct CommandContext {
    /// Resolved configuration.
    pub config: Config,
    /// Open connection pool against the deck database.
    pub pool: SqlitePool,
}

impl CommandContext {
    /// Load config and open the deck database.
    pub async fn load() -> Result<Self> {
        let config = ConfigLoader::load()?;
        let pool = initialize_from_config(&config.database)
            .await
            .context("Failed to open database. Run 'promptdeck init' first.")?;
        Ok(Self { config, pool })
    }

    /// Resolve the workspace to operate on.
    ///
    /// A `--workspace` flag wins over the id recorded in config.
    pub fn workspace_id(&self, flag: Option<Uuid>) -> Result<Uuid> {
        match flag.or(self.config.workspace.id) {
            Some(id) => Ok(id),
            None => {
                bail!("No workspace configured. Run 'promptdeck init' or pass --workspace.")
            }
        }
    }

    /// Build and start a full workspace session.
    pub async fn open_session(&self, workspace_id: Uuid) -> Result<Session> {
        let store = Arc::new(SqlitePromptStore::new(self.pool.clone()));
        let epic_store = Arc::new(SqliteEpicStore::new(self.pool.clone()));
        let audit = Arc::new(SqliteAuditStore::new(self.pool.clone()));
        let transformer = Arc::new(HttpTransformer::new(
            &self.config.transform,
            &self.config.retry,
        )?);
        let agent = Arc::new(HttpCursorAgent::new(&self.config.cursor, &self.config.retry)?);

        let mut session = WorkspaceSession::new(
            workspace_id,
            store,
            transformer,
            agent,
            epic_store,
            audit,
            &self.config,
        );
        session.start().await?;
        Ok(session)
    }
}
