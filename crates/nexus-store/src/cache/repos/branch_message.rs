//! Branch message repository — per-branch threads with their own
//! gapless sequence numbers.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::cache::row_types::BranchMessageRow;
use crate::errors::Result;

/// Partial update of branch message fields.
#[derive(Default)]
pub struct BranchMessageUpdate<'a> {
    /// New content.
    pub content: Option<&'a str>,
    /// New reasoning.
    pub reasoning: Option<&'a str>,
}

impl BranchMessageUpdate<'_> {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.reasoning.is_none()
    }
}

/// Branch message repository — stateless, every method takes `&Connection`.
pub struct BranchMessageRepo;

impl BranchMessageRepo {
    /// Next sequence number within a branch. Starts at 0.
    pub fn next_sequence(conn: &Connection, branch_id: &str) -> Result<i64> {
        let seq: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_number), -1) + 1
             FROM branch_messages WHERE branch_id = ?1",
            params![branch_id],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    /// Insert a branch message row at a given sequence. Duplicate IDs are
    /// a no-op.
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        conn: &Connection,
        id: &str,
        branch_id: &str,
        conversation_id: &str,
        role: &str,
        content: &str,
        reasoning: Option<&str>,
        sequence_number: i64,
        timestamp: i64,
    ) -> Result<bool> {
        let changed = conn.execute(
            "INSERT INTO branch_messages (id, branch_id, conversation_id, role, content,
                                          reasoning, sequence_number, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             ON CONFLICT(id) DO NOTHING",
            params![
                id,
                branch_id,
                conversation_id,
                role,
                content,
                reasoning,
                sequence_number,
                timestamp
            ],
        )?;
        Ok(changed > 0)
    }

    /// Apply a partial update. Returns false when the row does not exist.
    pub fn update(
        conn: &Connection,
        id: &str,
        update: &BranchMessageUpdate<'_>,
        timestamp: i64,
    ) -> Result<bool> {
        use std::fmt::Write;
        if update.is_empty() {
            return Ok(false);
        }

        let mut sql = String::from("UPDATE branch_messages SET updated_at = ?1");
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(timestamp)];

        if let Some(content) = update.content {
            let _ = write!(sql, ", content = ?{}", values.len() + 1);
            values.push(Box::new(content.to_owned()));
        }
        if let Some(reasoning) = update.reasoning {
            let _ = write!(sql, ", reasoning = ?{}", values.len() + 1);
            values.push(Box::new(reasoning.to_owned()));
        }
        let _ = write!(sql, " WHERE id = ?{}", values.len() + 1);
        values.push(Box::new(id.to_owned()));

        let changed = conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(changed > 0)
    }

    /// Get branch message by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<BranchMessageRow>> {
        let row = conn
            .query_row(
                "SELECT id, branch_id, conversation_id, role, content, reasoning,
                        sequence_number, created_at, updated_at
                 FROM branch_messages WHERE id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List every message in a branch, in sequence order.
    pub fn list_for_branch(conn: &Connection, branch_id: &str) -> Result<Vec<BranchMessageRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, branch_id, conversation_id, role, content, reasoning,
                    sequence_number, created_at, updated_at
             FROM branch_messages WHERE branch_id = ?1 ORDER BY sequence_number ASC",
        )?;
        let rows = stmt
            .query_map(params![branch_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<BranchMessageRow> {
        Ok(BranchMessageRow {
            id: row.get(0)?,
            branch_id: row.get(1)?,
            conversation_id: row.get(2)?,
            role: row.get(3)?,
            content: row.get(4)?,
            reasoning: row.get(5)?,
            sequence_number: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
