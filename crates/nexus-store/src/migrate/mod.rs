//! Legacy JSON to event-log migration.
//!
//! Earlier app versions persisted one mutable JSON document per workspace
//! and per conversation. The migrator converts each document into an
//! ordered batch of events appended to the matching log, then archives
//! the legacy folders by renaming them with an `-archived` suffix.
//!
//! The run is resumable: progress lives in `migration-status.json`, a
//! completed run short-circuits, and a document that fails to convert is
//! recorded and retried on the next run. Legacy folders are only archived
//! once every document converted cleanly.

mod convert;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::errors::Result;
use crate::repos::StoreContext;

/// Current migration format version.
pub const MIGRATION_VERSION: u32 = 1;

/// Per-category lists of source files already converted. A retry after a
/// partial failure never appends a tracked document's events twice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigratedFiles {
    /// Workspace document paths converted.
    pub workspaces: Vec<String>,
    /// Conversation document paths converted.
    pub conversations: Vec<String>,
}

/// Aggregate counters for the migration so far.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStats {
    /// Workspace documents converted.
    pub workspaces: usize,
    /// Conversation documents converted.
    pub conversations: usize,
    /// Events appended across all documents.
    pub events_written: usize,
}

/// Persisted migration bookkeeping (`migration-status.json`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    /// True once every document converted and the folders were archived.
    pub completed: bool,
    /// Migration format version that produced this status.
    pub version: u32,
    /// Successfully converted files, tracked by path.
    pub migrated_files: MigratedFiles,
    /// Whether the legacy folders have been renamed away.
    pub legacy_archived: bool,
    /// Aggregate counters.
    pub stats: MigrationStats,
    /// Per-file conversion errors from the most recent run.
    pub errors: Vec<String>,
}

/// Converts legacy documents into log events.
pub struct LegacyMigrator {
    ctx: Arc<StoreContext>,
}

impl LegacyMigrator {
    pub(crate) fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    /// Run the migration. Idempotent: a completed run returns its status
    /// without touching anything.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<MigrationStatus> {
        let status_path = self.ctx.paths.migration_status();
        let mut status = load_status(&status_path).await?;
        if status.completed {
            info!("legacy migration already completed, skipping");
            return Ok(status);
        }

        status.version = MIGRATION_VERSION;
        status.errors.clear();

        let _guard = self.ctx.write_lock.lock().await;

        let workspaces_dir = self.ctx.paths.legacy_workspaces_dir();
        self.migrate_dir(&workspaces_dir, true, &mut status).await?;
        let conversations_dir = self.ctx.paths.legacy_conversations_dir();
        self.migrate_dir(&conversations_dir, false, &mut status)
            .await?;

        if status.errors.is_empty() {
            archive_dir(&workspaces_dir).await?;
            archive_dir(&conversations_dir).await?;
            status.legacy_archived = true;
            status.completed = true;
            info!(
                workspaces = status.stats.workspaces,
                conversations = status.stats.conversations,
                events = status.stats.events_written,
                "legacy migration complete"
            );
        } else {
            warn!(
                errors = status.errors.len(),
                "legacy migration finished with errors; failed files will be retried"
            );
        }

        save_status(&status_path, &status).await?;
        Ok(status)
    }

    async fn migrate_dir(
        &self,
        dir: &Path,
        is_workspace: bool,
        status: &mut MigrationStatus,
    ) -> Result<()> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let key = path.display().to_string();
            let tracked = if is_workspace {
                &status.migrated_files.workspaces
            } else {
                &status.migrated_files.conversations
            };
            if tracked.contains(&key) {
                continue;
            }
            match self.migrate_file(&path, is_workspace).await {
                Ok(events) => {
                    status.stats.events_written += events;
                    if is_workspace {
                        status.migrated_files.workspaces.push(key);
                        status.stats.workspaces += 1;
                    } else {
                        status.migrated_files.conversations.push(key);
                        status.stats.conversations += 1;
                    }
                }
                Err(message) => {
                    error!(path = %path.display(), error = %message, "failed to migrate document");
                    status.errors.push(format!("{}: {message}", path.display()));
                }
            }
        }
        Ok(())
    }

    async fn migrate_file(
        &self,
        path: &Path,
        is_workspace: bool,
    ) -> std::result::Result<usize, String> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| e.to_string())?;

        let device = self.ctx.log.device_id();
        let converted = if is_workspace {
            convert::workspace_doc(&raw, device)?
        } else {
            convert::conversation_doc(&raw, device)?
        };

        let log_path = if is_workspace {
            self.ctx.paths.workspace_log(&converted.entity_id)
        } else {
            self.ctx.paths.conversation_log(&converted.entity_id)
        };
        let count = converted.events.len();
        self.ctx
            .log
            .append_events(&log_path, &converted.events)
            .await
            .map_err(|e| e.to_string())?;
        Ok(count)
    }
}

async fn load_status(path: &Path) -> Result<MigrationStatus> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(MigrationStatus::default()),
        Err(e) => Err(e.into()),
    }
}

async fn save_status(path: &Path, status: &MigrationStatus) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_string_pretty(status)?).await?;
    Ok(())
}

async fn archive_dir(dir: &Path) -> Result<()> {
    match tokio::fs::metadata(dir).await {
        Ok(_) => {
            let target = crate::paths::StorePaths::archived(dir);
            tokio::fs::rename(dir, &target).await?;
            info!(from = %dir.display(), to = %target.display(), "archived legacy folder");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
