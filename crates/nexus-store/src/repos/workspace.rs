//! Workspace repository — workspaces, sessions, state snapshots, and
//! memory traces.

use std::sync::Arc;

use serde_json::Value;
use tracing::instrument;

use nexus_core::ids::{SessionId, StateId, TraceId, WorkspaceId};

use crate::cache::repos::{SearchRepo, SessionRepo, StateRepo, TraceRepo, WorkspaceRepo};
use crate::cache::row_types::{SessionRow, StateRow, TraceRow, WorkspaceRow};
use crate::errors::{Result, StoreError};
use crate::events::{EventPayload, StorageEvent};

use super::StoreContext;

/// Fields to change on a workspace. `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceChanges {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Fields to change on a session.
#[derive(Clone, Debug, Default)]
pub struct SessionChanges {
    /// New title.
    pub title: Option<String>,
    /// New model.
    pub model: Option<String>,
}

/// Public API for the workspace family. Cheap to clone.
#[derive(Clone)]
pub struct WorkspaceRepository {
    ctx: Arc<StoreContext>,
}

impl WorkspaceRepository {
    pub(crate) fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    // ── Workspaces ──────────────────────────────────────────────────────

    /// Create a workspace.
    #[instrument(skip(self))]
    pub async fn create_workspace(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<WorkspaceRow> {
        let id = WorkspaceId::new();
        let path = self.ctx.paths.workspace_log(id.as_str());
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::WorkspaceCreated {
                    workspace_id: id.as_str().to_owned(),
                    name: name.to_owned(),
                    description: description.map(str::to_owned),
                },
            )
            .await?;
        self.get_workspace(id.as_str()).await
    }

    /// Fetch a workspace or fail with `NotFound`.
    pub async fn get_workspace(&self, id: &str) -> Result<WorkspaceRow> {
        let conn = self.ctx.conn()?;
        WorkspaceRepo::get(&conn, id)?.ok_or_else(|| StoreError::not_found("workspace", id))
    }

    /// All workspaces, newest first.
    pub async fn list_workspaces(&self) -> Result<Vec<WorkspaceRow>> {
        let conn = self.ctx.conn()?;
        WorkspaceRepo::list(&conn)
    }

    /// Apply a partial update to a workspace.
    #[instrument(skip(self, changes))]
    pub async fn update_workspace(
        &self,
        id: &str,
        changes: WorkspaceChanges,
    ) -> Result<WorkspaceRow> {
        if changes.name.is_none() && changes.description.is_none() {
            return Err(StoreError::InvalidOperation(
                "workspace update has no fields".into(),
            ));
        }
        // Fail before logging anything for a workspace that is not there.
        let _ = self.get_workspace(id).await?;
        let path = self.ctx.paths.workspace_log(id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::WorkspaceUpdated {
                    workspace_id: id.to_owned(),
                    name: changes.name,
                    description: changes.description,
                },
            )
            .await?;
        self.get_workspace(id).await
    }

    /// Delete a workspace. The cache rows go away; the log keeps history.
    #[instrument(skip(self))]
    pub async fn delete_workspace(&self, id: &str) -> Result<()> {
        let _ = self.get_workspace(id).await?;
        let path = self.ctx.paths.workspace_log(id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::WorkspaceDeleted {
                    workspace_id: id.to_owned(),
                },
            )
            .await?;
        Ok(())
    }

    /// Full-text search over workspace names and descriptions.
    pub async fn search_workspaces(&self, query: &str) -> Result<Vec<WorkspaceRow>> {
        let conn = self.ctx.conn()?;
        SearchRepo::workspaces(&conn, query)
    }

    // ── Sessions ────────────────────────────────────────────────────────

    /// Start a session in a workspace.
    #[instrument(skip(self))]
    pub async fn create_session(
        &self,
        workspace_id: &str,
        title: Option<&str>,
        model: Option<&str>,
    ) -> Result<SessionRow> {
        let _ = self.get_workspace(workspace_id).await?;
        let id = SessionId::new();
        let path = self.ctx.paths.workspace_log(workspace_id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::SessionCreated {
                    session_id: id.as_str().to_owned(),
                    workspace_id: workspace_id.to_owned(),
                    title: title.map(str::to_owned),
                    model: model.map(str::to_owned),
                },
            )
            .await?;
        self.get_session(id.as_str()).await
    }

    /// Fetch a session or fail with `NotFound`.
    pub async fn get_session(&self, id: &str) -> Result<SessionRow> {
        let conn = self.ctx.conn()?;
        SessionRepo::get(&conn, id)?.ok_or_else(|| StoreError::not_found("session", id))
    }

    /// Apply a partial update to a session.
    #[instrument(skip(self, changes))]
    pub async fn update_session(&self, id: &str, changes: SessionChanges) -> Result<SessionRow> {
        if changes.title.is_none() && changes.model.is_none() {
            return Err(StoreError::InvalidOperation(
                "session update has no fields".into(),
            ));
        }
        let session = self.get_session(id).await?;
        let path = self.ctx.paths.workspace_log(&session.workspace_id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::SessionUpdated {
                    session_id: id.to_owned(),
                    title: changes.title,
                    model: changes.model,
                },
            )
            .await?;
        self.get_session(id).await
    }

    /// Sessions in a workspace, newest first.
    pub async fn list_sessions(&self, workspace_id: &str) -> Result<Vec<SessionRow>> {
        let conn = self.ctx.conn()?;
        SessionRepo::list_for_workspace(&conn, workspace_id)
    }

    // ── State snapshots ─────────────────────────────────────────────────

    /// Save an immutable state snapshot.
    ///
    /// The full content goes into the log; the cache holds metadata only.
    #[instrument(skip(self, content))]
    pub async fn save_state(
        &self,
        workspace_id: &str,
        name: &str,
        content: Value,
    ) -> Result<StateRow> {
        let _ = self.get_workspace(workspace_id).await?;
        let id = StateId::new();
        let path = self.ctx.paths.workspace_log(workspace_id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::StateSaved {
                    state_id: id.as_str().to_owned(),
                    workspace_id: workspace_id.to_owned(),
                    name: name.to_owned(),
                    content: content.clone(),
                },
            )
            .await?;
        // The write already paid for the content; memoize it.
        let _ = self
            .ctx
            .state_content
            .insert(id.as_str().to_owned(), content);
        self.get_state(id.as_str()).await
    }

    /// Fetch state metadata or fail with `NotFound`.
    pub async fn get_state(&self, id: &str) -> Result<StateRow> {
        let conn = self.ctx.conn()?;
        StateRepo::get(&conn, id)?.ok_or_else(|| StoreError::not_found("state", id))
    }

    /// State metadata in a workspace, newest first.
    pub async fn list_states(&self, workspace_id: &str) -> Result<Vec<StateRow>> {
        let conn = self.ctx.conn()?;
        StateRepo::list_for_workspace(&conn, workspace_id)
    }

    /// Resolve a snapshot's content from the log, memoizing the result.
    pub async fn get_state_content(&self, id: &str) -> Result<Value> {
        let state = self.get_state(id).await?;
        if let Some(content) = self.ctx.state_content.get(id) {
            return Ok(content.clone());
        }

        let path = self.ctx.paths.workspace_log(&state.workspace_id);
        let events = self.ctx.log.read_all(&path).await?;
        for event in events {
            if let StorageEvent {
                payload: EventPayload::StateSaved {
                    state_id, content, ..
                },
                ..
            } = event
                && state_id == id
            {
                let _ = self.ctx.state_content.insert(id.to_owned(), content.clone());
                return Ok(content);
            }
        }
        // Metadata row exists but the log line is gone or unreadable.
        Err(StoreError::not_found("state content", id))
    }

    /// States are immutable — there is no update, only save and delete.
    pub async fn update_state(&self, id: &str) -> Result<()> {
        Err(StoreError::InvalidOperation(format!(
            "state {id} is immutable; save a new state instead"
        )))
    }

    /// Delete a state snapshot from the cache.
    #[instrument(skip(self))]
    pub async fn delete_state(&self, id: &str) -> Result<()> {
        let state = self.get_state(id).await?;
        let path = self.ctx.paths.workspace_log(&state.workspace_id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::StateDeleted {
                    state_id: id.to_owned(),
                },
            )
            .await?;
        let _ = self.ctx.state_content.remove(id);
        Ok(())
    }

    // ── Memory traces ───────────────────────────────────────────────────

    /// Record a memory trace. Traces are append-only.
    #[instrument(skip(self, content))]
    pub async fn add_trace(
        &self,
        workspace_id: &str,
        content: &str,
        category: Option<&str>,
    ) -> Result<TraceRow> {
        let _ = self.get_workspace(workspace_id).await?;
        let id = TraceId::new();
        let path = self.ctx.paths.workspace_log(workspace_id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::TraceAdded {
                    trace_id: id.as_str().to_owned(),
                    workspace_id: workspace_id.to_owned(),
                    content: content.to_owned(),
                    category: category.map(str::to_owned),
                },
            )
            .await?;
        let conn = self.ctx.conn()?;
        let traces = TraceRepo::list_for_workspace(&conn, workspace_id)?;
        traces
            .into_iter()
            .find(|t| t.id == id.as_str())
            .ok_or_else(|| StoreError::not_found("trace", id.as_str()))
    }

    /// Traces in a workspace in append order, optionally by category.
    pub async fn list_traces(
        &self,
        workspace_id: &str,
        category: Option<&str>,
    ) -> Result<Vec<TraceRow>> {
        let conn = self.ctx.conn()?;
        match category {
            Some(category) => TraceRepo::list_by_category(&conn, workspace_id, category),
            None => TraceRepo::list_for_workspace(&conn, workspace_id),
        }
    }
}
