//! Memory trace repository.

use rusqlite::{Connection, Row, params};

use crate::cache::row_types::TraceRow;
use crate::errors::Result;

/// Trace repository — stateless, every method takes `&Connection`.
pub struct TraceRepo;

impl TraceRepo {
    /// Insert a trace row. Duplicate IDs are a no-op.
    pub fn insert(
        conn: &Connection,
        id: &str,
        workspace_id: &str,
        content: &str,
        category: Option<&str>,
        timestamp: i64,
    ) -> Result<bool> {
        let changed = conn.execute(
            "INSERT INTO memory_traces (id, workspace_id, content, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO NOTHING",
            params![id, workspace_id, content, category, timestamp],
        )?;
        Ok(changed > 0)
    }

    /// List traces in a workspace, oldest first (append order).
    pub fn list_for_workspace(conn: &Connection, workspace_id: &str) -> Result<Vec<TraceRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, workspace_id, content, category, created_at
             FROM memory_traces WHERE workspace_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![workspace_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// List traces in a workspace filtered by category.
    pub fn list_by_category(
        conn: &Connection,
        workspace_id: &str,
        category: &str,
    ) -> Result<Vec<TraceRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, workspace_id, content, category, created_at
             FROM memory_traces WHERE workspace_id = ?1 AND category = ?2
             ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![workspace_id, category], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<TraceRow> {
        Ok(TraceRow {
            id: row.get(0)?,
            workspace_id: row.get(1)?,
            content: row.get(2)?,
            category: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
