//! Persistence core: append-only event logs plus a queryable `SQLite`
//! cache.
//!
//! The event logs (one JSONL file per workspace or conversation) are the
//! source of truth; every mutation is an immutable event appended there.
//! The cache is a disposable projection of those logs that serves all
//! queries — pagination, filtering, full-text search — and can be wiped
//! and rebuilt at any time.
//!
//! [`NexusStore`] is the entry point; see its module docs for the
//! startup sequence.

#![deny(unsafe_code)]

pub mod apply;
pub mod cache;
pub mod config;
pub mod device;
pub mod errors;
pub mod events;
pub mod export;
pub mod log;
pub mod migrate;
pub mod paths;
pub mod repos;
pub mod store;
pub mod sync;

pub use config::{ConnectionConfig, StoreConfig};
pub use errors::{Result, StoreError};
pub use events::{EventFamily, EventPayload, StorageEvent};
pub use export::{ExportOptions, ExportReport, FineTuneExporter};
pub use migrate::{MigratedFiles, MigrationStats, MigrationStatus};
pub use repos::{
    ConversationChanges, ConversationRepository, MessageChanges, NewMessage, SessionChanges,
    WorkspaceChanges, WorkspaceRepository,
};
pub use store::NexusStore;
pub use sync::{HealReport, RebuildReport, SyncReport};
