//! Full-text search over the FTS5 shadow tables.
//!
//! Queries are wrapped as quoted phrases before hitting FTS5, so user
//! input can never be misparsed as match syntax.

use rusqlite::{Connection, params};

use crate::cache::row_types::{ConversationRow, MessageRow, WorkspaceRow};
use crate::errors::Result;

/// Escape arbitrary user input into an FTS5 phrase query.
fn phrase(query: &str) -> String {
    format!("\"{}\"", query.replace('"', "\"\""))
}

/// Search repository — stateless, every method takes `&Connection`.
pub struct SearchRepo;

impl SearchRepo {
    /// Workspaces whose name or description matches the query.
    pub fn workspaces(conn: &Connection, query: &str) -> Result<Vec<WorkspaceRow>> {
        let mut stmt = conn.prepare(
            "SELECT w.id, w.name, w.description, w.created_at, w.updated_at
             FROM workspaces_fts f
             JOIN workspaces w ON w.id = f.id
             WHERE workspaces_fts MATCH ?1
             ORDER BY rank",
        )?;
        let rows = stmt
            .query_map(params![phrase(query)], |row| {
                Ok(WorkspaceRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Conversations whose title matches the query.
    pub fn conversations(conn: &Connection, query: &str) -> Result<Vec<ConversationRow>> {
        let mut stmt = conn.prepare(
            "SELECT c.id, c.title, c.workspace_id, c.message_count, c.created_at, c.updated_at
             FROM conversations_fts f
             JOIN conversations c ON c.id = f.id
             WHERE conversations_fts MATCH ?1
             ORDER BY rank",
        )?;
        let rows = stmt
            .query_map(params![phrase(query)], |row| {
                Ok(ConversationRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    workspace_id: row.get(2)?,
                    message_count: row.get(3)?,
                    created_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Messages whose content or reasoning matches the query, optionally
    /// scoped to one conversation.
    pub fn messages(
        conn: &Connection,
        query: &str,
        conversation_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<MessageRow>> {
        use std::fmt::Write;
        let mut sql = String::from(
            "SELECT m.id, m.conversation_id, m.role, m.content, m.reasoning, m.model,
                    m.sequence_number, m.created_at, m.updated_at
             FROM messages_fts f
             JOIN messages m ON m.id = f.id
             WHERE messages_fts MATCH ?1",
        );
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(phrase(query))];

        if let Some(conversation_id) = conversation_id {
            let _ = write!(sql, " AND m.conversation_id = ?{}", values.len() + 1);
            values.push(Box::new(conversation_id.to_owned()));
        }
        let _ = write!(sql, " ORDER BY rank LIMIT ?{}", values.len() + 1);
        values.push(Box::new(limit));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(values.iter()), |row| {
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
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
