//! Sync coordinator — keeps the cache converged with the logs.
//!
//! Three entry points:
//!
//! * [`SyncCoordinator::sync`] — incremental: pick up foreign-device
//!   events the cache has not materialized yet. Runs at startup and
//!   whenever the app detects log files changed underneath it.
//! * [`SyncCoordinator::rebuild`] — nuclear: wipe every table and replay
//!   every log from the beginning.
//! * [`SyncCoordinator::self_heal`] — startup scan that re-applies any
//!   event present in a log but missing from the applied-event ledger,
//!   closing the crash window between a log append and its cache write.
//!
//! A failure on one event or one file never aborts the pass; it is
//! counted, logged, and the pass moves on. Cursors advance past failed
//! events — the applied-event ledger, not the cursor, is the correctness
//! mechanism.

use std::collections::HashMap;
use std::path::PathBuf;

use metrics::counter;
use tracing::{debug, error, info, instrument, warn};

use nexus_core::now_ms;
use nexus_core::time::ms_to_rfc3339;

use crate::apply::apply_event;
use crate::cache::ConnectionPool;
use crate::cache::repos::{AppliedEventRepo, CursorRepo, clear_all_tables};
use crate::config::StoreConfig;
use crate::errors::Result;
use crate::events::StorageEvent;
use crate::log::{EventLog, list_log_files};
use crate::paths::StorePaths;

/// Outcome of an incremental sync pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Events newly materialized into the cache.
    pub applied: usize,
    /// Events examined but not applied (already applied, or no-op).
    pub skipped: usize,
    /// Events that errored; they stay unapplied and will be retried.
    pub failed: usize,
    /// Log files scanned.
    pub files_scanned: usize,
}

/// Outcome of a full rebuild.
#[derive(Clone, Debug, Default)]
pub struct RebuildReport {
    /// Events materialized into the fresh cache.
    pub applied: usize,
    /// Events replayed as no-ops.
    pub skipped: usize,
    /// Log files that could not be read, with the error text.
    pub failed_files: Vec<(PathBuf, String)>,
}

/// Outcome of a self-heal scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HealReport {
    /// Events found in a log but absent from the cache, now re-applied.
    pub healed: usize,
}

/// Coordinates log reads with cache writes.
pub struct SyncCoordinator {
    pool: ConnectionPool,
    log: EventLog,
    paths: StorePaths,
    rebuild_batch_size: usize,
}

impl SyncCoordinator {
    /// Build a coordinator over an open pool and log.
    #[must_use]
    pub fn new(pool: ConnectionPool, log: EventLog, paths: StorePaths, config: &StoreConfig) -> Self {
        Self {
            pool,
            log,
            paths,
            rebuild_batch_size: config.rebuild_batch_size.max(1),
        }
    }

    /// Incremental sync: materialize unseen foreign-device events.
    #[instrument(skip(self))]
    pub async fn sync(&self) -> Result<SyncReport> {
        let files = self.all_log_files().await?;
        let conn = self.pool.get()?;

        let mut report = SyncReport {
            files_scanned: files.len(),
            ..SyncReport::default()
        };
        // Snapshot of the cursors persisted by earlier passes. The
        // fast-path skip must consult only this snapshot: `cursors`
        // advances as events apply, and checking it would drop later
        // events from the same device sharing one timestamp.
        let start_cursors: HashMap<String, i64> =
            CursorRepo::list(&conn)?.into_iter().collect();
        let mut cursors = start_cursors.clone();

        // Reads start from the beginning of each log: a device seen for
        // the first time may carry timestamps older than every cursor.
        // The snapshot skip and the ledger make re-examination cheap.
        let mut events = Vec::new();
        for path in &files {
            events.extend(self.log.read_foreign_since(path, -1).await?);
        }
        sort_for_replay(&mut events);

        for event in &events {
            let device = event.device_id.as_str();
            // Cursor is a fast-path skip; the ledger below is what
            // guarantees exactly-once.
            if start_cursors.get(device).is_some_and(|c| event.timestamp <= *c) {
                continue;
            }
            if AppliedEventRepo::is_applied(&conn, event.id.as_str())? {
                report.skipped += 1;
            } else {
                match apply_in_tx(&conn, event) {
                    Ok(true) => report.applied += 1,
                    Ok(false) => report.skipped += 1,
                    Err(e) => {
                        error!(event_id = %event.id, error = %e, "sync failed to apply event");
                        report.failed += 1;
                        continue;
                    }
                }
            }
            let cursor = cursors.entry(device.to_owned()).or_insert(i64::MIN);
            *cursor = (*cursor).max(event.timestamp);
        }

        let now = now_ms();
        for (device, ts) in &cursors {
            CursorRepo::set(&conn, device, *ts, now)?;
            debug!(device = %device, cursor = %ms_to_rfc3339(*ts), "cursor advanced");
        }

        counter!("nexus_sync_applied_total").increment(report.applied as u64);
        counter!("nexus_sync_failed_total").increment(report.failed as u64);
        info!(
            applied = report.applied,
            skipped = report.skipped,
            failed = report.failed,
            files = report.files_scanned,
            "sync complete"
        );
        Ok(report)
    }

    /// Full rebuild: wipe the cache and replay every log from scratch.
    ///
    /// Events replay in timestamp order across all files, in batches of
    /// `rebuild_batch_size` per transaction. A file that cannot be read
    /// is recorded in the report and the rebuild continues.
    ///
    /// Conversation deletes are cache-local and leave no event, so a
    /// rebuild brings deleted conversations back. Workspace deletes are
    /// events and replay as deletes.
    #[instrument(skip(self))]
    pub async fn rebuild(&self) -> Result<RebuildReport> {
        let files = self.all_log_files().await?;
        let mut report = RebuildReport::default();

        let mut events = Vec::new();
        for path in &files {
            match self.log.read_all(path).await {
                Ok(batch) => events.extend(batch),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "rebuild skipping unreadable log");
                    report.failed_files.push((path.clone(), e.to_string()));
                }
            }
        }
        sort_for_replay(&mut events);

        let conn = self.pool.get()?;
        clear_all_tables(&conn)?;

        let now = now_ms();
        let mut cursors: HashMap<String, i64> = HashMap::new();
        for batch in events.chunks(self.rebuild_batch_size) {
            let tx = conn.unchecked_transaction()?;
            for event in batch {
                match apply_event(&tx, event) {
                    Ok(outcome) if outcome.is_applied() => report.applied += 1,
                    Ok(_) => report.skipped += 1,
                    Err(e) => {
                        // Row-level failures do not poison the batch.
                        error!(event_id = %event.id, error = %e, "rebuild failed to apply event");
                        report.skipped += 1;
                    }
                }
                AppliedEventRepo::mark(&tx, event.id.as_str(), now)?;
                if event.device_id != *self.log.device_id() {
                    let cursor = cursors
                        .entry(event.device_id.as_str().to_owned())
                        .or_insert(i64::MIN);
                    *cursor = (*cursor).max(event.timestamp);
                }
            }
            tx.commit()?;
        }

        for (device, ts) in &cursors {
            CursorRepo::set(&conn, device, *ts, now)?;
        }

        counter!("nexus_rebuild_applied_total").increment(report.applied as u64);
        info!(
            applied = report.applied,
            skipped = report.skipped,
            failed_files = report.failed_files.len(),
            "rebuild complete"
        );
        Ok(report)
    }

    /// Re-apply any logged event missing from the applied-event ledger.
    ///
    /// Local writes normally hit log and cache together; a crash between
    /// the two leaves the log ahead. This scan closes that gap without a
    /// full rebuild.
    #[instrument(skip(self))]
    pub async fn self_heal(&self) -> Result<HealReport> {
        let files = self.all_log_files().await?;
        let conn = self.pool.get()?;
        let mut report = HealReport::default();

        for path in &files {
            let mut events = self.log.read_all(path).await?;
            sort_for_replay(&mut events);
            for event in &events {
                if AppliedEventRepo::is_applied(&conn, event.id.as_str())? {
                    continue;
                }
                debug!(event_id = %event.id, "healing unapplied event");
                match apply_in_tx(&conn, event) {
                    Ok(true) => report.healed += 1,
                    Ok(false) => {}
                    Err(e) => {
                        error!(event_id = %event.id, error = %e, "self-heal failed to apply event");
                    }
                }
            }
        }

        if report.healed > 0 {
            counter!("nexus_heal_applied_total").increment(report.healed as u64);
            info!(healed = report.healed, "self-heal applied missing events");
        }
        Ok(report)
    }

    async fn all_log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = list_log_files(&self.paths.workspaces_dir()).await?;
        files.extend(list_log_files(&self.paths.conversations_dir()).await?);
        Ok(files)
    }
}

/// Replay order: timestamp, then event ID (time-ordered UUIDs) as the
/// tie-break so replays are deterministic.
fn sort_for_replay(events: &mut [StorageEvent]) {
    events.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.id.as_str().cmp(b.id.as_str()))
    });
}

fn apply_in_tx(conn: &rusqlite::Connection, event: &StorageEvent) -> Result<bool> {
    Ok(crate::apply::apply_and_mark(conn, event)?.is_applied())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
