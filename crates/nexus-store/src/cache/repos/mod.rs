//! Stateless cache repositories.
//!
//! Every repository is a unit struct whose methods take `&Connection`, so
//! callers control transaction boundaries. Appliers and the high-level
//! repositories both go through these — there is exactly one way to touch
//! each table.

mod applied;
mod branch;
mod branch_message;
mod conversation;
mod cursor;
mod message;
mod search;
mod session;
mod state;
mod trace;
mod workspace;

pub use applied::AppliedEventRepo;
pub use branch::{BranchRepo, BranchUpdate};
pub use branch_message::{BranchMessageRepo, BranchMessageUpdate};
pub use conversation::{ConversationRepo, ConversationUpdate, ListConversationsOptions};
pub use cursor::CursorRepo;
pub use message::{MessageRepo, MessageUpdate};
pub use search::SearchRepo;
pub use session::{SessionRepo, SessionUpdate};
pub use state::StateRepo;
pub use trace::TraceRepo;
pub use workspace::{WorkspaceRepo, WorkspaceUpdate};

use rusqlite::Connection;

use crate::errors::Result;

/// Wipe every materialized table, including sync bookkeeping.
///
/// Used by full rebuild before replaying the logs. Runs in one
/// transaction so a crash mid-wipe cannot leave a half-empty cache.
pub fn clear_all_tables(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DELETE FROM branch_messages;
         DELETE FROM branches;
         DELETE FROM messages;
         DELETE FROM conversations;
         DELETE FROM memory_traces;
         DELETE FROM states;
         DELETE FROM sessions;
         DELETE FROM workspaces;
         DELETE FROM applied_events;
         DELETE FROM sync_cursors;",
    )?;
    tx.commit()?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
