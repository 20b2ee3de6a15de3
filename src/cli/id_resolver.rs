//! Short ID prefix resolution for CLI commands.
//!
//! Lets users pass any unique prefix of a UUID instead of the full 36-char
//! id, similar to git short hashes.

use anyhow::{bail, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Resolve a prompt ID prefix to a full UUID.
pub async fn resolve_prompt_id(pool: &SqlitePool, prefix: &str) -> Result<Uuid> {
    resolve_prefix(pool, prefix, "prompt", PROMPT_QUERY).await
}

/// Resolve an epic ID prefix to a full UUID.
pub async fn resolve_epic_id(pool: &SqlitePool, prefix: &str) -> Result<Uuid> {
    resolve_prefix(pool, prefix, "epic", EPIC_QUERY).await
}

const PROMPT_QUERY: &str = "SELECT id FROM prompts WHERE id LIKE ?";
const EPIC_QUERY: &str = "SELECT id FROM epics WHERE id LIKE ?";

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        bail!("ID prefix must not be empty");
    }
    if !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        bail!(
            "Invalid ID prefix '{}': must contain only hex characters and dashes",
            prefix
        );
    }
    Ok(())
}

async fn resolve_prefix(
    pool: &SqlitePool,
    prefix: &str,
    entity: &str,
    query: &str,
) -> Result<Uuid> {
    // Fast path: if it parses as a full UUID, return directly
    if let Ok(uuid) = Uuid::parse_str(prefix) {
        return Ok(uuid);
    }

    validate_prefix(prefix)?;

    let pattern = format!("{prefix}%");
    let rows: Vec<(String,)> = sqlx::query_as(query).bind(&pattern).fetch_all(pool).await?;

    match rows.len() {
        0 => bail!("No {} found matching '{}'", entity, prefix),
        1 => Ok(Uuid::parse_str(&rows[0].0)?),
        n => {
            let mut msg = format!("Ambiguous prefix '{}': matches {} {}s:", prefix, n, entity);
            for row in &rows {
                msg.push_str(&format!("\n  {}", row.0));
            }
            bail!("{}", msg)
        }
    }
}
