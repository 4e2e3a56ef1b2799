//! Branch repository.
//!
//! Branches reference their fork point by message ID only. The parent
//! message stays in the `messages` table; nothing is duplicated.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::cache::row_types::BranchRow;
use crate::errors::Result;

/// Partial update of branch fields.
#[derive(Default)]
pub struct BranchUpdate<'a> {
    /// New name.
    pub name: Option<&'a str>,
}

impl BranchUpdate<'_> {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}

/// Branch repository — stateless, every method takes `&Connection`.
pub struct BranchRepo;

impl BranchRepo {
    /// Insert a branch row. Duplicate IDs are a no-op.
    pub fn insert(
        conn: &Connection,
        id: &str,
        conversation_id: &str,
        name: Option<&str>,
        parent_message_id: Option<&str>,
        timestamp: i64,
    ) -> Result<bool> {
        let changed = conn.execute(
            "INSERT INTO branches (id, conversation_id, name, parent_message_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(id) DO NOTHING",
            params![id, conversation_id, name, parent_message_id, timestamp],
        )?;
        Ok(changed > 0)
    }

    /// Apply a partial update. Returns false when the row does not exist.
    pub fn update(
        conn: &Connection,
        id: &str,
        update: &BranchUpdate<'_>,
        timestamp: i64,
    ) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }
        let changed = conn.execute(
            "UPDATE branches SET name = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, update.name, timestamp],
        )?;
        Ok(changed > 0)
    }

    /// Get branch by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<BranchRow>> {
        let row = conn
            .query_row(
                "SELECT id, conversation_id, name, parent_message_id, created_at, updated_at
                 FROM branches WHERE id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List branches in a conversation, oldest first.
    pub fn list_for_conversation(
        conn: &Connection,
        conversation_id: &str,
    ) -> Result<Vec<BranchRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, name, parent_message_id, created_at, updated_at
             FROM branches WHERE conversation_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![conversation_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<BranchRow> {
        Ok(BranchRow {
            id: row.get(0)?,
            conversation_id: row.get(1)?,
            name: row.get(2)?,
            parent_message_id: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
