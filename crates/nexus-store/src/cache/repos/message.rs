//! Message repository — main-thread messages with gapless sequence numbers.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::cache::row_types::MessageRow;
use crate::errors::Result;

/// Partial update of message fields.
#[derive(Default)]
pub struct MessageUpdate<'a> {
    /// New content.
    pub content: Option<&'a str>,
    /// New reasoning.
    pub reasoning: Option<&'a str>,
}

impl MessageUpdate<'_> {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.reasoning.is_none()
    }
}

/// Message repository — stateless, every method takes `&Connection`.
pub struct MessageRepo;

impl MessageRepo {
    /// Next sequence number for a conversation's main thread.
    ///
    /// Starts at 0 for an empty thread. Must run inside the same
    /// transaction as the insert that uses it.
    pub fn next_sequence(conn: &Connection, conversation_id: &str) -> Result<i64> {
        let seq: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_number), -1) + 1
             FROM messages WHERE conversation_id = ?1",
            params![conversation_id],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    /// Insert a message row at a given sequence. Duplicate IDs are a no-op.
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        conn: &Connection,
        id: &str,
        conversation_id: &str,
        role: &str,
        content: &str,
        reasoning: Option<&str>,
        model: Option<&str>,
        sequence_number: i64,
        timestamp: i64,
    ) -> Result<bool> {
        let changed = conn.execute(
            "INSERT INTO messages (id, conversation_id, role, content, reasoning, model,
                                   sequence_number, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             ON CONFLICT(id) DO NOTHING",
            params![
                id,
                conversation_id,
                role,
                content,
                reasoning,
                model,
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
        update: &MessageUpdate<'_>,
        timestamp: i64,
    ) -> Result<bool> {
        use std::fmt::Write;
        if update.is_empty() {
            return Ok(false);
        }

        let mut sql = String::from("UPDATE messages SET updated_at = ?1");
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

    /// Get message by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
        let row = conn
            .query_row(
                "SELECT id, conversation_id, role, content, reasoning, model,
                        sequence_number, created_at, updated_at
                 FROM messages WHERE id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List a page of main-thread messages in sequence order.
    pub fn list_page(
        conn: &Connection,
        conversation_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MessageRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, role, content, reasoning, model,
                    sequence_number, created_at, updated_at
             FROM messages WHERE conversation_id = ?1
             ORDER BY sequence_number ASC LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
            .query_map(params![conversation_id, limit, offset], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Number of main-thread messages in a conversation.
    pub fn count(conn: &Connection, conversation_id: &str) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
            params![conversation_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
        Ok(MessageRow {
            id: row.get(0)?,
            conversation_id: row.get(1)?,
            role: row.get(2)?,
            content: row.get(3)?,
            reasoning: row.get(4)?,
            model: row.get(5)?,
            sequence_number: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
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
    use crate::cache::repos::ConversationRepo;
    use crate::cache::repos::test_support::open_cache;

    fn with_conversation() -> Connection {
        let conn = open_cache();
        ConversationRepo::insert(&conn, "conv_1", "Chat", None, 1).unwrap();
        conn
    }

    fn add(conn: &Connection, id: &str, content: &str, ts: i64) {
        let seq = MessageRepo::next_sequence(conn, "conv_1").unwrap();
        MessageRepo::insert(conn, id, "conv_1", "user", content, None, None, seq, ts).unwrap();
    }

    #[test]
    fn sequence_starts_at_zero_and_is_gapless() {
        let conn = with_conversation();
        assert_eq!(MessageRepo::next_sequence(&conn, "conv_1").unwrap(), 0);
        add(&conn, "msg_a", "first", 10);
        add(&conn, "msg_b", "second", 20);
        add(&conn, "msg_c", "third", 30);

        let rows = MessageRepo::list_page(&conn, "conv_1", 100, 0).unwrap();
        let seqs: Vec<i64> = rows.iter().map(|m| m.sequence_number).collect();
        assert_eq!(seqs, [0, 1, 2]);
    }

    #[test]
    fn update_preserves_untouched_fields() {
        let conn = with_conversation();
        MessageRepo::insert(
            &conn,
            "msg_1",
            "conv_1",
            "assistant",
            "answer",
            Some("because"),
            Some("nova-2"),
            0,
            10,
        )
        .unwrap();

        let update = MessageUpdate {
            content: Some("better answer"),
            reasoning: None,
        };
        assert!(MessageRepo::update(&conn, "msg_1", &update, 20).unwrap());

        let row = MessageRepo::get(&conn, "msg_1").unwrap().unwrap();
        assert_eq!(row.content, "better answer");
        assert_eq!(row.reasoning.as_deref(), Some("because"));
        assert_eq!(row.model.as_deref(), Some("nova-2"));
        assert_eq!(row.created_at, 10);
        assert_eq!(row.updated_at, 20);
    }

    #[test]
    fn pagination_in_sequence_order() {
        let conn = with_conversation();
        for i in 0..5 {
            add(&conn, &format!("msg_{i}"), &format!("m{i}"), i);
        }
        let page = MessageRepo::list_page(&conn, "conv_1", 2, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].sequence_number, 2);
        assert_eq!(page[1].sequence_number, 3);
    }

    #[test]
    fn cascade_on_conversation_delete() {
        let conn = with_conversation();
        add(&conn, "msg_1", "hello", 10);
        ConversationRepo::delete(&conn, "conv_1").unwrap();
        assert_eq!(MessageRepo::count(&conn, "conv_1").unwrap(), 0);
    }
}
