//! Applied-event ledger.
//!
//! Records every event ID that has been materialized into the cache, so
//! replays and overlapping sync windows are deduplicated exactly once.

use rusqlite::{Connection, params};

use crate::errors::Result;

/// Applied-event repository — stateless, every method takes `&Connection`.
pub struct AppliedEventRepo;

impl AppliedEventRepo {
    /// Has this event already been materialized?
    pub fn is_applied(conn: &Connection, event_id: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM applied_events WHERE event_id = ?1",
            params![event_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Record an event as materialized. Idempotent.
    pub fn mark(conn: &Connection, event_id: &str, now: i64) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO applied_events (event_id, applied_at) VALUES (?1, ?2)
             ON CONFLICT(event_id) DO NOTHING",
            params![event_id, now],
        )?;
        Ok(())
    }

    /// Number of ledger entries.
    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM applied_events", [], |row| row.get(0))?;
        Ok(count)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::repos::test_support::open_cache;

    #[test]
    fn mark_and_check() {
        let conn = open_cache();
        assert!(!AppliedEventRepo::is_applied(&conn, "evt_1").unwrap());
        AppliedEventRepo::mark(&conn, "evt_1", 100).unwrap();
        assert!(AppliedEventRepo::is_applied(&conn, "evt_1").unwrap());
    }

    #[test]
    fn mark_is_idempotent() {
        let conn = open_cache();
        AppliedEventRepo::mark(&conn, "evt_1", 100).unwrap();
        AppliedEventRepo::mark(&conn, "evt_1", 200).unwrap();
        assert_eq!(AppliedEventRepo::count(&conn).unwrap(), 1);
    }
}
