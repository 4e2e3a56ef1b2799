//! Conversation repository.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::cache::row_types::ConversationRow;
use crate::errors::Result;

/// Partial update of conversation fields.
#[derive(Default)]
pub struct ConversationUpdate<'a> {
    /// New title.
    pub title: Option<&'a str>,
    /// New workspace association.
    pub workspace_id: Option<&'a str>,
}

impl ConversationUpdate<'_> {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.workspace_id.is_none()
    }
}

/// Options for listing conversations.
#[derive(Default)]
pub struct ListConversationsOptions<'a> {
    /// Filter by workspace association.
    pub workspace_id: Option<&'a str>,
    /// Maximum results.
    pub limit: Option<i64>,
    /// Skip results.
    pub offset: Option<i64>,
}

/// Conversation repository — stateless, every method takes `&Connection`.
pub struct ConversationRepo;

impl ConversationRepo {
    /// Insert a conversation row. Duplicate IDs are a no-op.
    pub fn insert(
        conn: &Connection,
        id: &str,
        title: &str,
        workspace_id: Option<&str>,
        timestamp: i64,
    ) -> Result<bool> {
        let changed = conn.execute(
            "INSERT INTO conversations (id, title, workspace_id, message_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?4)
             ON CONFLICT(id) DO NOTHING",
            params![id, title, workspace_id, timestamp],
        )?;
        Ok(changed > 0)
    }

    /// Apply a partial update. Returns false when the row does not exist.
    pub fn update(
        conn: &Connection,
        id: &str,
        update: &ConversationUpdate<'_>,
        timestamp: i64,
    ) -> Result<bool> {
        use std::fmt::Write;
        if update.is_empty() {
            return Ok(false);
        }

        let mut sql = String::from("UPDATE conversations SET updated_at = ?1");
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(timestamp)];

        if let Some(title) = update.title {
            let _ = write!(sql, ", title = ?{}", values.len() + 1);
            values.push(Box::new(title.to_owned()));
        }
        if let Some(workspace_id) = update.workspace_id {
            let _ = write!(sql, ", workspace_id = ?{}", values.len() + 1);
            values.push(Box::new(workspace_id.to_owned()));
        }
        let _ = write!(sql, " WHERE id = ?{}", values.len() + 1);
        values.push(Box::new(id.to_owned()));

        let changed = conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(changed > 0)
    }

    /// Delete a conversation row; messages and branches cascade.
    pub fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM conversations WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Get conversation by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<ConversationRow>> {
        let row = conn
            .query_row(
                "SELECT id, title, workspace_id, message_count, created_at, updated_at
                 FROM conversations WHERE id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List conversations, most recently updated first.
    pub fn list(
        conn: &Connection,
        opts: &ListConversationsOptions<'_>,
    ) -> Result<Vec<ConversationRow>> {
        use std::fmt::Write;
        let mut sql = String::from(
            "SELECT id, title, workspace_id, message_count, created_at, updated_at
             FROM conversations WHERE 1=1",
        );
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(workspace_id) = opts.workspace_id {
            let _ = write!(sql, " AND workspace_id = ?{}", values.len() + 1);
            values.push(Box::new(workspace_id.to_owned()));
        }
        sql.push_str(" ORDER BY updated_at DESC");
        if let Some(limit) = opts.limit {
            let _ = write!(sql, " LIMIT ?{}", values.len() + 1);
            values.push(Box::new(limit));
        } else if opts.offset.is_some() {
            // SQLite requires LIMIT before OFFSET; -1 means unbounded.
            sql.push_str(" LIMIT -1");
        }
        if let Some(offset) = opts.offset {
            let _ = write!(sql, " OFFSET ?{}", values.len() + 1);
            values.push(Box::new(offset));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(values.iter()), Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Total number of conversations, optionally scoped to a workspace.
    pub fn count(conn: &Connection, workspace_id: Option<&str>) -> Result<i64> {
        let count = match workspace_id {
            Some(ws) => conn.query_row(
                "SELECT COUNT(*) FROM conversations WHERE workspace_id = ?1",
                params![ws],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))?,
        };
        Ok(count)
    }

    /// Bump the denormalized message counter and `updated_at`.
    ///
    /// Runs in the same transaction as the message insert so the counter
    /// can never drift from the actual row count.
    pub fn increment_message_count(conn: &Connection, id: &str, timestamp: i64) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE conversations
             SET message_count = message_count + 1, updated_at = ?2
             WHERE id = ?1",
            params![id, timestamp],
        )?;
        Ok(changed > 0)
    }

    /// Touch `updated_at` without changing any other field.
    pub fn touch(conn: &Connection, id: &str, timestamp: i64) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE conversations SET updated_at = ?2 WHERE id = ?1",
            params![id, timestamp],
        )?;
        Ok(changed > 0)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ConversationRow> {
        Ok(ConversationRow {
            id: row.get(0)?,
            title: row.get(1)?,
            workspace_id: row.get(2)?,
            message_count: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::cache::repos::test_support::open_cache;

    #[test]
    fn insert_update_get() {
        let conn = open_cache();
        ConversationRepo::insert(&conn, "conv_1", "Chat", None, 100).unwrap();

        let update = ConversationUpdate {
            title: Some("Renamed"),
            workspace_id: Some("ws_1"),
        };
        assert!(ConversationRepo::update(&conn, "conv_1", &update, 200).unwrap());

        let row = ConversationRepo::get(&conn, "conv_1").unwrap().unwrap();
        assert_eq!(row.title, "Renamed");
        assert_eq!(row.workspace_id.as_deref(), Some("ws_1"));
        assert_eq!(row.message_count, 0);
    }

    #[test]
    fn list_orders_by_recent_activity() {
        let conn = open_cache();
        ConversationRepo::insert(&conn, "conv_a", "A", None, 100).unwrap();
        ConversationRepo::insert(&conn, "conv_b", "B", None, 200).unwrap();
        ConversationRepo::touch(&conn, "conv_a", 300).unwrap();

        let rows = ConversationRepo::list(&conn, &ListConversationsOptions::default()).unwrap();
        assert_eq!(rows[0].id, "conv_a");
    }

    #[test]
    fn list_with_limit_and_offset() {
        let conn = open_cache();
        for i in 0..5 {
            ConversationRepo::insert(&conn, &format!("conv_{i}"), "C", None, i).unwrap();
        }
        let opts = ListConversationsOptions {
            workspace_id: None,
            limit: Some(2),
            offset: Some(1),
        };
        let rows = ConversationRepo::list(&conn, &opts).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "conv_3");
    }

    #[test]
    fn increment_message_count() {
        let conn = open_cache();
        ConversationRepo::insert(&conn, "conv_1", "Chat", None, 100).unwrap();
        ConversationRepo::increment_message_count(&conn, "conv_1", 150).unwrap();
        ConversationRepo::increment_message_count(&conn, "conv_1", 160).unwrap();

        let row = ConversationRepo::get(&conn, "conv_1").unwrap().unwrap();
        assert_eq!(row.message_count, 2);
        assert_eq!(row.updated_at, 160);
    }

    #[test]
    fn count_scoped_to_workspace() {
        let conn = open_cache();
        ConversationRepo::insert(&conn, "conv_a", "A", Some("ws_1"), 1).unwrap();
        ConversationRepo::insert(&conn, "conv_b", "B", None, 1).unwrap();

        assert_eq!(ConversationRepo::count(&conn, None).unwrap(), 2);
        assert_eq!(ConversationRepo::count(&conn, Some("ws_1")).unwrap(), 1);
    }
}
