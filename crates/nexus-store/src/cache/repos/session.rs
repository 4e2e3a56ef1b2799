//! Session repository.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::cache::row_types::SessionRow;
use crate::errors::Result;

/// Partial update of session fields.
#[derive(Default)]
pub struct SessionUpdate<'a> {
    /// New title.
    pub title: Option<&'a str>,
    /// New model.
    pub model: Option<&'a str>,
}

impl SessionUpdate<'_> {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.model.is_none()
    }
}

/// Session repository — stateless, every method takes `&Connection`.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a session row. Duplicate IDs are a no-op.
    pub fn insert(
        conn: &Connection,
        id: &str,
        workspace_id: &str,
        title: Option<&str>,
        model: Option<&str>,
        timestamp: i64,
    ) -> Result<bool> {
        let changed = conn.execute(
            "INSERT INTO sessions (id, workspace_id, title, model, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(id) DO NOTHING",
            params![id, workspace_id, title, model, timestamp],
        )?;
        Ok(changed > 0)
    }

    /// Apply a partial update. Returns false when the row does not exist.
    pub fn update(
        conn: &Connection,
        id: &str,
        update: &SessionUpdate<'_>,
        timestamp: i64,
    ) -> Result<bool> {
        use std::fmt::Write;
        if update.is_empty() {
            return Ok(false);
        }

        let mut sql = String::from("UPDATE sessions SET updated_at = ?1");
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(timestamp)];

        if let Some(title) = update.title {
            let _ = write!(sql, ", title = ?{}", values.len() + 1);
            values.push(Box::new(title.to_owned()));
        }
        if let Some(model) = update.model {
            let _ = write!(sql, ", model = ?{}", values.len() + 1);
            values.push(Box::new(model.to_owned()));
        }
        let _ = write!(sql, " WHERE id = ?{}", values.len() + 1);
        values.push(Box::new(id.to_owned()));

        let changed = conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(changed > 0)
    }

    /// Get session by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<SessionRow>> {
        let row = conn
            .query_row(
                "SELECT id, workspace_id, title, model, created_at, updated_at
                 FROM sessions WHERE id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List sessions in a workspace, newest first.
    pub fn list_for_workspace(conn: &Connection, workspace_id: &str) -> Result<Vec<SessionRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, workspace_id, title, model, created_at, updated_at
             FROM sessions WHERE workspace_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![workspace_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<SessionRow> {
        Ok(SessionRow {
            id: row.get(0)?,
            workspace_id: row.get(1)?,
            title: row.get(2)?,
            model: row.get(3)?,
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
    use crate::cache::repos::WorkspaceRepo;
    use crate::cache::repos::test_support::open_cache;

    fn with_workspace() -> Connection {
        let conn = open_cache();
        WorkspaceRepo::insert(&conn, "ws_1", "W", None, 1).unwrap();
        conn
    }

    #[test]
    fn insert_requires_existing_workspace() {
        let conn = open_cache();
        let result = SessionRepo::insert(&conn, "sess_1", "ws_ghost", None, None, 1);
        assert!(result.is_err());
    }

    #[test]
    fn insert_update_get() {
        let conn = with_workspace();
        SessionRepo::insert(&conn, "sess_1", "ws_1", Some("Draft"), Some("nova-2"), 10).unwrap();

        let update = SessionUpdate {
            title: Some("Final"),
            model: None,
        };
        assert!(SessionRepo::update(&conn, "sess_1", &update, 20).unwrap());

        let row = SessionRepo::get(&conn, "sess_1").unwrap().unwrap();
        assert_eq!(row.title.as_deref(), Some("Final"));
        assert_eq!(row.model.as_deref(), Some("nova-2"));
        assert_eq!(row.updated_at, 20);
    }

    #[test]
    fn list_scoped_to_workspace() {
        let conn = with_workspace();
        WorkspaceRepo::insert(&conn, "ws_2", "Other", None, 1).unwrap();
        SessionRepo::insert(&conn, "sess_a", "ws_1", None, None, 10).unwrap();
        SessionRepo::insert(&conn, "sess_b", "ws_2", None, None, 10).unwrap();

        let rows = SessionRepo::list_for_workspace(&conn, "ws_1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "sess_a");
    }
}
