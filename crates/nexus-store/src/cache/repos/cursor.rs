//! Sync cursor repository.
//!
//! One row per foreign device, holding the highest event timestamp that
//! sync has already examined for that device. The cursor only moves
//! forward.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;

/// Cursor repository — stateless, every method takes `&Connection`.
pub struct CursorRepo;

impl CursorRepo {
    /// Last examined event timestamp for a device, if any.
    pub fn get(conn: &Connection, device_id: &str) -> Result<Option<i64>> {
        let ts = conn
            .query_row(
                "SELECT last_timestamp FROM sync_cursors WHERE device_id = ?1",
                params![device_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ts)
    }

    /// Advance a device cursor. Never moves backwards.
    pub fn set(conn: &Connection, device_id: &str, timestamp: i64, now: i64) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO sync_cursors (device_id, last_timestamp, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(device_id) DO UPDATE SET
               last_timestamp = MAX(last_timestamp, excluded.last_timestamp),
               updated_at = excluded.updated_at",
            params![device_id, timestamp, now],
        )?;
        Ok(())
    }

    /// All known device cursors.
    pub fn list(conn: &Connection) -> Result<Vec<(String, i64)>> {
        let mut stmt =
            conn.prepare("SELECT device_id, last_timestamp FROM sync_cursors ORDER BY device_id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
