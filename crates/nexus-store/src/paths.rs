//! On-disk layout under the store base directory.
//!
//! ```text
//! .nexus/
//!   workspaces/ws_{id}.jsonl        append-only workspace-family logs
//!   conversations/conv_{id}.jsonl   append-only conversation-family logs
//!   cache.db                        rebuildable SQLite cache
//!   migration-status.json           legacy migration bookkeeping
//!   device-id                       stable per-install device identity
//!   legacy-workspaces/              pre-migration input (read-only)
//!   legacy-conversations/           pre-migration input (read-only)
//! ```
//!
//! Log file names embed the owning entity id, so the id must already carry
//! its `ws_`/`conv_` prefix — see `nexus_core::ids`.

use std::path::{Path, PathBuf};

/// Subdirectory holding workspace-family log files.
pub const WORKSPACES_DIR: &str = "workspaces";

/// Subdirectory holding conversation-family log files.
pub const CONVERSATIONS_DIR: &str = "conversations";

/// Legacy (pre-event-sourcing) workspace documents.
pub const LEGACY_WORKSPACES_DIR: &str = "legacy-workspaces";

/// Legacy (pre-event-sourcing) conversation documents.
pub const LEGACY_CONVERSATIONS_DIR: &str = "legacy-conversations";

/// Suffix appended to legacy folders after a successful migration.
pub const ARCHIVED_SUFFIX: &str = "-archived";

/// Resolved paths for one store instance.
#[derive(Clone, Debug)]
pub struct StorePaths {
    base: PathBuf,
}

impl StorePaths {
    /// Root all paths at the given base directory.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The base directory itself.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory of workspace-family logs.
    #[must_use]
    pub fn workspaces_dir(&self) -> PathBuf {
        self.base.join(WORKSPACES_DIR)
    }

    /// Directory of conversation-family logs.
    #[must_use]
    pub fn conversations_dir(&self) -> PathBuf {
        self.base.join(CONVERSATIONS_DIR)
    }

    /// Log file owned by one workspace.
    #[must_use]
    pub fn workspace_log(&self, workspace_id: &str) -> PathBuf {
        self.workspaces_dir().join(format!("{workspace_id}.jsonl"))
    }

    /// Log file owned by one conversation.
    #[must_use]
    pub fn conversation_log(&self, conversation_id: &str) -> PathBuf {
        self.conversations_dir()
            .join(format!("{conversation_id}.jsonl"))
    }

    /// The embedded cache database file.
    #[must_use]
    pub fn cache_db(&self) -> PathBuf {
        self.base.join("cache.db")
    }

    /// Legacy migration status file.
    #[must_use]
    pub fn migration_status(&self) -> PathBuf {
        self.base.join("migration-status.json")
    }

    /// Persisted device identity file.
    #[must_use]
    pub fn device_id_file(&self) -> PathBuf {
        self.base.join("device-id")
    }

    /// Legacy workspace documents directory.
    #[must_use]
    pub fn legacy_workspaces_dir(&self) -> PathBuf {
        self.base.join(LEGACY_WORKSPACES_DIR)
    }

    /// Legacy conversation documents directory.
    #[must_use]
    pub fn legacy_conversations_dir(&self) -> PathBuf {
        self.base.join(LEGACY_CONVERSATIONS_DIR)
    }

    /// Archive name for a legacy directory (rename target after migration).
    #[must_use]
    pub fn archived(dir: &Path) -> PathBuf {
        let mut name = dir
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        name.push_str(ARCHIVED_SUFFIX);
        dir.with_file_name(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
