//! State snapshot repository — metadata rows only.
//!
//! Content is deliberately not cached; the workspace repository resolves
//! it from the event log on demand.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::cache::row_types::StateRow;
use crate::errors::Result;

/// State repository — stateless, every method takes `&Connection`.
pub struct StateRepo;

impl StateRepo {
    /// Insert a state metadata row. Duplicate IDs are a no-op.
    pub fn insert(
        conn: &Connection,
        id: &str,
        workspace_id: &str,
        name: &str,
        timestamp: i64,
    ) -> Result<bool> {
        let changed = conn.execute(
            "INSERT INTO states (id, workspace_id, name, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO NOTHING",
            params![id, workspace_id, name, timestamp],
        )?;
        Ok(changed > 0)
    }

    /// Delete a state row.
    pub fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM states WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Get state metadata by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<StateRow>> {
        let row = conn
            .query_row(
                "SELECT id, workspace_id, name, created_at FROM states WHERE id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List states in a workspace, newest first.
    pub fn list_for_workspace(conn: &Connection, workspace_id: &str) -> Result<Vec<StateRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, workspace_id, name, created_at
             FROM states WHERE workspace_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![workspace_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<StateRow> {
        Ok(StateRow {
            id: row.get(0)?,
            workspace_id: row.get(1)?,
            name: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
