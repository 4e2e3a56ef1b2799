//! Workspace repository — materialized workspace rows.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::cache::row_types::WorkspaceRow;
use crate::errors::Result;

/// Partial update of workspace fields. `None` leaves the column untouched.
#[derive(Default)]
pub struct WorkspaceUpdate<'a> {
    /// New name.
    pub name: Option<&'a str>,
    /// New description.
    pub description: Option<&'a str>,
}

impl WorkspaceUpdate<'_> {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Workspace repository — stateless, every method takes `&Connection`.
pub struct WorkspaceRepo;

impl WorkspaceRepo {
    /// Insert a workspace row. Replaying the same creation event is a
    /// no-op rather than an error.
    pub fn insert(
        conn: &Connection,
        id: &str,
        name: &str,
        description: Option<&str>,
        timestamp: i64,
    ) -> Result<bool> {
        let changed = conn.execute(
            "INSERT INTO workspaces (id, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(id) DO NOTHING",
            params![id, name, description, timestamp],
        )?;
        Ok(changed > 0)
    }

    /// Apply a partial update. Returns false when the row does not exist.
    pub fn update(
        conn: &Connection,
        id: &str,
        update: &WorkspaceUpdate<'_>,
        timestamp: i64,
    ) -> Result<bool> {
        use std::fmt::Write;
        if update.is_empty() {
            return Ok(false);
        }

        let mut sql = String::from("UPDATE workspaces SET updated_at = ?1");
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(timestamp)];

        if let Some(name) = update.name {
            let _ = write!(sql, ", name = ?{}", values.len() + 1);
            values.push(Box::new(name.to_owned()));
        }
        if let Some(description) = update.description {
            let _ = write!(sql, ", description = ?{}", values.len() + 1);
            values.push(Box::new(description.to_owned()));
        }
        let _ = write!(sql, " WHERE id = ?{}", values.len() + 1);
        values.push(Box::new(id.to_owned()));

        let changed = conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(changed > 0)
    }

    /// Delete a workspace row; child rows cascade.
    pub fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM workspaces WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Get workspace by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<WorkspaceRow>> {
        let row = conn
            .query_row(
                "SELECT id, name, description, created_at, updated_at
                 FROM workspaces WHERE id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List all workspaces, newest first.
    pub fn list(conn: &Connection) -> Result<Vec<WorkspaceRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM workspaces ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<WorkspaceRow> {
        Ok(WorkspaceRow {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
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
    fn insert_and_get() {
        let conn = open_cache();
        assert!(WorkspaceRepo::insert(&conn, "ws_1", "Research", Some("notes"), 100).unwrap());

        let row = WorkspaceRepo::get(&conn, "ws_1").unwrap().unwrap();
        assert_eq!(row.name, "Research");
        assert_eq!(row.description.as_deref(), Some("notes"));
        assert_eq!(row.created_at, 100);
        assert_eq!(row.updated_at, 100);
    }

    #[test]
    fn duplicate_insert_is_noop() {
        let conn = open_cache();
        WorkspaceRepo::insert(&conn, "ws_1", "First", None, 100).unwrap();
        assert!(!WorkspaceRepo::insert(&conn, "ws_1", "Second", None, 200).unwrap());

        let row = WorkspaceRepo::get(&conn, "ws_1").unwrap().unwrap();
        assert_eq!(row.name, "First");
    }

    #[test]
    fn partial_update_preserves_other_fields() {
        let conn = open_cache();
        WorkspaceRepo::insert(&conn, "ws_1", "Research", Some("original"), 100).unwrap();

        let update = WorkspaceUpdate {
            name: Some("Research v2"),
            description: None,
        };
        assert!(WorkspaceRepo::update(&conn, "ws_1", &update, 200).unwrap());

        let row = WorkspaceRepo::get(&conn, "ws_1").unwrap().unwrap();
        assert_eq!(row.name, "Research v2");
        assert_eq!(row.description.as_deref(), Some("original"));
        assert_eq!(row.updated_at, 200);
    }

    #[test]
    fn update_missing_row_returns_false() {
        let conn = open_cache();
        let update = WorkspaceUpdate {
            name: Some("x"),
            description: None,
        };
        assert!(!WorkspaceRepo::update(&conn, "ws_ghost", &update, 1).unwrap());
    }

    #[test]
    fn empty_update_is_noop() {
        let conn = open_cache();
        WorkspaceRepo::insert(&conn, "ws_1", "W", None, 100).unwrap();
        assert!(!WorkspaceRepo::update(&conn, "ws_1", &WorkspaceUpdate::default(), 200).unwrap());
        let row = WorkspaceRepo::get(&conn, "ws_1").unwrap().unwrap();
        assert_eq!(row.updated_at, 100);
    }

    #[test]
    fn delete_is_idempotent() {
        let conn = open_cache();
        WorkspaceRepo::insert(&conn, "ws_1", "W", None, 100).unwrap();
        assert!(WorkspaceRepo::delete(&conn, "ws_1").unwrap());
        assert!(!WorkspaceRepo::delete(&conn, "ws_1").unwrap());
    }

    #[test]
    fn list_newest_first() {
        let conn = open_cache();
        WorkspaceRepo::insert(&conn, "ws_old", "Old", None, 100).unwrap();
        WorkspaceRepo::insert(&conn, "ws_new", "New", None, 200).unwrap();

        let rows = WorkspaceRepo::list(&conn).unwrap();
        assert_eq!(rows[0].id, "ws_new");
        assert_eq!(rows[1].id, "ws_old");
    }
}
