//! High-level repositories — the write path of the store.
//!
//! Every mutation is a dual write: the event is appended to its log first
//! (the log is the source of truth), then applied to the cache and marked
//! in the applied-event ledger. Both halves run under the store-wide
//! write lock so concurrent writers cannot interleave log lines and cache
//! transactions. If the process dies between the halves, the startup
//! self-heal scan replays the orphaned event.

mod conversation;
mod workspace;

pub use conversation::{
    ConversationChanges, ConversationRepository, MessageChanges, NewMessage,
};
pub use workspace::{SessionChanges, WorkspaceChanges, WorkspaceRepository};

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::apply::apply_and_mark;
use crate::cache::{ConnectionPool, PooledConnection};
use crate::errors::Result;
use crate::events::{EventPayload, StorageEvent};
use crate::log::EventLog;
use crate::paths::StorePaths;

/// Shared plumbing behind every repository.
pub(crate) struct StoreContext {
    pub(crate) pool: ConnectionPool,
    pub(crate) log: EventLog,
    pub(crate) paths: StorePaths,
    /// Serializes dual writes across all repositories.
    pub(crate) write_lock: Mutex<()>,
    /// Memoized state snapshot contents, filled lazily from the logs.
    pub(crate) state_content: DashMap<String, serde_json::Value>,
}

impl StoreContext {
    pub(crate) fn new(pool: ConnectionPool, log: EventLog, paths: StorePaths) -> Arc<Self> {
        Arc::new(Self {
            pool,
            log,
            paths,
            write_lock: Mutex::new(()),
            state_content: DashMap::new(),
        })
    }

    pub(crate) fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// The dual write: append to the log, then materialize into the cache.
    pub(crate) async fn write(&self, path: &Path, payload: EventPayload) -> Result<StorageEvent> {
        let _guard = self.write_lock.lock().await;
        let event = self.log.append(path, payload).await?;
        let conn = self.conn()?;
        let _ = apply_and_mark(&conn, &event)?;
        Ok(event)
    }
}
