//! The store facade — opens the on-disk layout and wires every component
//! together.
//!
//! Typical startup sequence:
//!
//! ```no_run
//! # async fn open() -> nexus_store::Result<()> {
//! use nexus_store::{NexusStore, StoreConfig};
//!
//! let store = NexusStore::open(StoreConfig::with_base_dir("/data/.nexus")).await?;
//! let _ = store.migrate_legacy().await?; // one-time, no-op afterwards
//! let _ = store.self_heal().await?;      // close any crash gap
//! let _ = store.sync().await?;           // pick up foreign-device events
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::{info, instrument};

use nexus_core::ids::DeviceId;

use crate::cache::connection::new_file;
use crate::cache::migrations::{current_version, run_migrations};
use crate::config::StoreConfig;
use crate::device;
use crate::errors::Result;
use crate::export::FineTuneExporter;
use crate::log::EventLog;
use crate::migrate::{LegacyMigrator, MigrationStatus};
use crate::paths::StorePaths;
use crate::repos::{ConversationRepository, StoreContext, WorkspaceRepository};
use crate::sync::{HealReport, RebuildReport, SyncCoordinator, SyncReport};

/// The persistence core: event logs as the source of truth, a `SQLite`
/// cache for queries.
pub struct NexusStore {
    ctx: Arc<StoreContext>,
    coordinator: SyncCoordinator,
    workspaces: WorkspaceRepository,
    conversations: ConversationRepository,
    exporter: FineTuneExporter,
    migrator: LegacyMigrator,
    device_id: DeviceId,
}

impl NexusStore {
    /// Open (or create) a store rooted at `config.base_dir`.
    ///
    /// Creates the directory layout, loads the device identity, opens the
    /// cache pool, and runs any pending schema migrations.
    #[instrument(skip(config), fields(base_dir = %config.base_dir.display()))]
    pub async fn open(config: StoreConfig) -> Result<Self> {
        let paths = StorePaths::new(&config.base_dir);
        tokio::fs::create_dir_all(paths.workspaces_dir()).await?;
        tokio::fs::create_dir_all(paths.conversations_dir()).await?;

        let device_id = device::load_or_create(&paths.device_id_file()).await?;
        let log = EventLog::new(device_id.clone());

        let pool = new_file(&paths.cache_db(), &config.connection)?;
        let conn = pool.get()?;
        let _ = run_migrations(&conn)?;
        drop(conn);

        let ctx = StoreContext::new(pool.clone(), log.clone(), paths.clone());
        let coordinator = SyncCoordinator::new(pool, log, paths, &config);

        info!(device_id = %device_id, "store opened");
        Ok(Self {
            workspaces: WorkspaceRepository::new(Arc::clone(&ctx)),
            conversations: ConversationRepository::new(Arc::clone(&ctx)),
            exporter: FineTuneExporter::new(Arc::clone(&ctx)),
            migrator: LegacyMigrator::new(Arc::clone(&ctx)),
            ctx,
            coordinator,
            device_id,
        })
    }

    /// Workspace-family operations.
    #[must_use]
    pub fn workspaces(&self) -> &WorkspaceRepository {
        &self.workspaces
    }

    /// Conversation-family operations.
    #[must_use]
    pub fn conversations(&self) -> &ConversationRepository {
        &self.conversations
    }

    /// Fine-tuning dataset export.
    #[must_use]
    pub fn exporter(&self) -> &FineTuneExporter {
        &self.exporter
    }

    /// This installation's device identity.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Incremental sync: materialize unseen foreign-device events.
    pub async fn sync(&self) -> Result<SyncReport> {
        self.coordinator.sync().await
    }

    /// Full rebuild: wipe the cache and replay every log.
    pub async fn rebuild(&self) -> Result<RebuildReport> {
        self.coordinator.rebuild().await
    }

    /// Re-apply logged events missing from the cache.
    pub async fn self_heal(&self) -> Result<HealReport> {
        self.coordinator.self_heal().await
    }

    /// Convert legacy JSON documents into log events, then materialize
    /// them. Idempotent.
    pub async fn migrate_legacy(&self) -> Result<MigrationStatus> {
        let status = self.migrator.run().await?;
        // Migrated events carry the local device id, so sync would skip
        // them; self-heal picks them up instead.
        let _ = self.coordinator.self_heal().await?;
        Ok(status)
    }

    /// Applied cache schema version.
    pub fn cache_schema_version(&self) -> Result<u32> {
        let conn = self.ctx.conn()?;
        current_version(&conn)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::repos::{MessageChanges, NewMessage, WorkspaceChanges};
    use nexus_core::PageRequest;

    async fn open_store(dir: &std::path::Path) -> NexusStore {
        NexusStore::open(StoreConfig::with_base_dir(dir)).await.unwrap()
    }

    fn user_message(content: &str) -> NewMessage {
        NewMessage {
            role: "user".into(),
            content: content.into(),
            reasoning: None,
            model: None,
        }
    }

    #[tokio::test]
    async fn workspace_flow_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;

        let ws = store
            .workspaces()
            .create_workspace("Research", Some("experiments"))
            .await
            .unwrap();
        let session = store
            .workspaces()
            .create_session(&ws.id, Some("Day 1"), Some("nova-2"))
            .await
            .unwrap();
        assert_eq!(session.workspace_id, ws.id);

        let updated = store
            .workspaces()
            .update_workspace(
                &ws.id,
                WorkspaceChanges {
                    name: Some("Research v2".into()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Research v2");
        assert_eq!(updated.description.as_deref(), Some("experiments"));

        // The log carries the whole history.
        let log = EventLog::new(store.device_id().clone());
        let events = log
            .read_all(&StorePaths::new(dir.path()).workspace_log(&ws.id))
            .await
            .unwrap();
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn state_content_is_resolved_lazily_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let content = serde_json::json!({"canvas": [1, 2, 3]});
        let state_id;
        {
            let store = open_store(dir.path()).await;
            let ws = store
                .workspaces()
                .create_workspace("W", None)
                .await
                .unwrap();
            let state = store
                .workspaces()
                .save_state(&ws.id, "Draft1", content.clone())
                .await
                .unwrap();
            state_id = state.id;
        }

        // Fresh process: memoization cache is empty, content comes from
        // the log.
        let store = open_store(dir.path()).await;
        let loaded = store
            .workspaces()
            .get_state_content(&state_id)
            .await
            .unwrap();
        assert_eq!(loaded, content);
    }

    #[tokio::test]
    async fn conversation_flow_with_branches() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;

        let conv = store
            .conversations()
            .create_conversation("Plot ideas", None)
            .await
            .unwrap();
        let m1 = store
            .conversations()
            .add_message(&conv.id, user_message("opening"))
            .await
            .unwrap();
        let m2 = store
            .conversations()
            .add_message(&conv.id, user_message("twist"))
            .await
            .unwrap();
        assert_eq!((m1.sequence_number, m2.sequence_number), (0, 1));

        let branch = store
            .conversations()
            .create_branch(&conv.id, Some("alt ending"), Some(&m1.id))
            .await
            .unwrap();
        let bm = store
            .conversations()
            .add_branch_message(&branch.id, user_message("different twist"))
            .await
            .unwrap();
        assert_eq!(bm.sequence_number, 0);

        let conv = store.conversations().get_conversation(&conv.id).await.unwrap();
        // Branch messages never count into the main thread.
        assert_eq!(conv.message_count, 2);

        let edited = store
            .conversations()
            .update_message(
                &m2.id,
                MessageChanges {
                    content: Some("better twist".into()),
                    reasoning: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.content, "better twist");
        assert_eq!(edited.sequence_number, 1);
    }

    #[tokio::test]
    async fn rebuild_reproduces_cache_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let conv_id;
        {
            let store = open_store(dir.path()).await;
            let conv = store
                .conversations()
                .create_conversation("Chat", None)
                .await
                .unwrap();
            conv_id = conv.id.clone();
            for i in 0..4 {
                store
                    .conversations()
                    .add_message(&conv.id, user_message(&format!("m{i}")))
                    .await
                    .unwrap();
            }
        }

        let store = open_store(dir.path()).await;
        // Simulate cache loss.
        let report = store.rebuild().await.unwrap();
        assert_eq!(report.applied, 5);

        let page = store
            .conversations()
            .list_messages(&conv_id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 4);
        let seqs: Vec<i64> = page.items.iter().map(|m| m.sequence_number).collect();
        assert_eq!(seqs, [0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn deleted_workspace_stays_absent_after_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;

        let keep = store.workspaces().create_workspace("Keep", None).await.unwrap();
        let doomed = store.workspaces().create_workspace("Doomed", None).await.unwrap();
        store.workspaces().delete_workspace(&doomed.id).await.unwrap();

        // The delete is an event, so a full replay reproduces the absence.
        store.rebuild().await.unwrap();
        assert!(store.workspaces().get_workspace(&doomed.id).await.is_err());
        assert!(store.workspaces().get_workspace(&keep.id).await.is_ok());
    }

    #[tokio::test]
    async fn interleaved_conversations_sequence_independently() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;

        let a = store.conversations().create_conversation("A", None).await.unwrap();
        let b = store.conversations().create_conversation("B", None).await.unwrap();

        let a0 = store.conversations().add_message(&a.id, user_message("a0")).await.unwrap();
        let b0 = store.conversations().add_message(&b.id, user_message("b0")).await.unwrap();
        let a1 = store.conversations().add_message(&a.id, user_message("a1")).await.unwrap();
        let b1 = store.conversations().add_message(&b.id, user_message("b1")).await.unwrap();

        assert_eq!((a0.sequence_number, a1.sequence_number), (0, 1));
        assert_eq!((b0.sequence_number, b1.sequence_number), (0, 1));

        let a = store.conversations().get_conversation(&a.id).await.unwrap();
        let b = store.conversations().get_conversation(&b.id).await.unwrap();
        assert_eq!(a.message_count, 2);
        assert_eq!(b.message_count, 2);
    }

    #[tokio::test]
    async fn workspace_and_state_survive_rebuild_from_log_only() {
        let dir = tempfile::tempdir().unwrap();
        let state_id;
        let ws_id;
        {
            let store = open_store(dir.path()).await;
            let ws = store
                .workspaces()
                .create_workspace("Research", None)
                .await
                .unwrap();
            let state = store
                .workspaces()
                .save_state(&ws.id, "Checkpoint", serde_json::json!({"step": 1}))
                .await
                .unwrap();
            ws_id = ws.id;
            state_id = state.id;
        }

        // Fresh process, then wipe and replay: everything must come back
        // from the logs alone.
        let store = open_store(dir.path()).await;
        store.rebuild().await.unwrap();

        let ws = store.workspaces().get_workspace(&ws_id).await.unwrap();
        assert_eq!(ws.name, "Research");
        let content = store.workspaces().get_state_content(&state_id).await.unwrap();
        assert_eq!(content, serde_json::json!({"step": 1}));
    }

    #[tokio::test]
    async fn migrate_legacy_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StorePaths::new(dir.path());
        tokio::fs::create_dir_all(paths.legacy_workspaces_dir())
            .await
            .unwrap();
        tokio::fs::write(
            paths.legacy_workspaces_dir().join("ws.json"),
            r#"{"id": "ws_old", "name": "Legacy", "createdAt": 1000,
                "sessions": [{"id": "sess_1", "title": "S", "createdAt": 1100}]}"#,
        )
        .await
        .unwrap();

        let store = open_store(dir.path()).await;
        let status = store.migrate_legacy().await.unwrap();
        assert!(status.completed);

        // Migrated data is queryable straight away.
        let ws = store.workspaces().get_workspace("ws_old").await.unwrap();
        assert_eq!(ws.name, "Legacy");
        assert_eq!(ws.created_at, 1000);
        let sessions = store.workspaces().list_sessions("ws_old").await.unwrap();
        assert_eq!(sessions.len(), 1);

        // Second call is a no-op.
        let again = store.migrate_legacy().await.unwrap();
        assert_eq!(status, again);
    }

    #[tokio::test]
    async fn schema_version_is_current_after_open() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        assert_eq!(
            store.cache_schema_version().unwrap(),
            crate::cache::migrations::latest_version()
        );
    }
}
