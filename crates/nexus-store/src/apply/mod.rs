//! Event appliers — the single path from events to cache rows.
//!
//! Every cache mutation, whether from a local write, an incremental sync,
//! or a full rebuild, goes through [`apply_event`]. The appliers are
//! deterministic and defensive: applying the same event twice converges
//! to the same cache state, and an event whose target row is missing is
//! skipped with a reason instead of failing the whole batch.
//!
//! Callers own the transaction. Sync and the repositories wrap each event
//! in its own transaction; rebuild batches many events per transaction.

mod conversation;
mod workspace;

use rusqlite::Connection;
use tracing::warn;

use crate::errors::Result;
use crate::events::{EventFamily, StorageEvent};

/// What applying one event did to the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The event mutated the cache.
    Applied,
    /// The event was a no-op, with the reason why.
    Skipped(&'static str),
}

impl ApplyOutcome {
    /// True when the event mutated the cache.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Apply one event to the cache.
///
/// Errors are reserved for infrastructure failures (SQL errors). Domain
/// mismatches — duplicate creations, updates to rows that no longer
/// exist — come back as [`ApplyOutcome::Skipped`].
pub fn apply_event(conn: &Connection, event: &StorageEvent) -> Result<ApplyOutcome> {
    let outcome = match event.payload.family() {
        EventFamily::Workspace => workspace::apply(conn, event)?,
        EventFamily::Conversation => conversation::apply(conn, event)?,
    };
    if let ApplyOutcome::Skipped(reason) = &outcome {
        warn!(
            event_id = %event.id,
            event_type = event.payload.type_name(),
            reason,
            "event skipped"
        );
    }
    Ok(outcome)
}

/// Apply one event and record it in the applied-event ledger, in a single
/// transaction.
///
/// Returns the apply outcome. Skipped events are marked too — they are
/// permanent no-ops and must not be re-examined by later passes.
pub(crate) fn apply_and_mark(conn: &Connection, event: &StorageEvent) -> Result<ApplyOutcome> {
    use crate::cache::repos::AppliedEventRepo;

    let tx = conn.unchecked_transaction()?;
    let outcome = apply_event(&tx, event)?;
    AppliedEventRepo::mark(&tx, event.id.as_str(), nexus_core::now_ms())?;
    tx.commit()?;
    Ok(outcome)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
