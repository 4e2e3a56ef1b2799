//! Appliers for workspace-family events.

use rusqlite::Connection;

use crate::cache::repos::{
    SessionRepo, SessionUpdate, StateRepo, TraceRepo, WorkspaceRepo, WorkspaceUpdate,
};
use crate::errors::Result;
use crate::events::{EventPayload, StorageEvent};

use super::ApplyOutcome;

pub(super) fn apply(conn: &Connection, event: &StorageEvent) -> Result<ApplyOutcome> {
    let ts = event.timestamp;
    let outcome = match &event.payload {
        EventPayload::WorkspaceCreated {
            workspace_id,
            name,
            description,
        } => {
            if WorkspaceRepo::insert(conn, workspace_id, name, description.as_deref(), ts)? {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("workspace already exists")
            }
        }
        EventPayload::WorkspaceUpdated {
            workspace_id,
            name,
            description,
        } => {
            let update = WorkspaceUpdate {
                name: name.as_deref(),
                description: description.as_deref(),
            };
            if update.is_empty() {
                ApplyOutcome::Skipped("empty update")
            } else if WorkspaceRepo::update(conn, workspace_id, &update, ts)? {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("workspace not found")
            }
        }
        EventPayload::WorkspaceDeleted { workspace_id } => {
            if WorkspaceRepo::delete(conn, workspace_id)? {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("workspace not found")
            }
        }
        EventPayload::SessionCreated {
            session_id,
            workspace_id,
            title,
            model,
        } => {
            if WorkspaceRepo::get(conn, workspace_id)?.is_none() {
                ApplyOutcome::Skipped("workspace not found")
            } else if SessionRepo::insert(
                conn,
                session_id,
                workspace_id,
                title.as_deref(),
                model.as_deref(),
                ts,
            )? {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("session already exists")
            }
        }
        EventPayload::SessionUpdated {
            session_id,
            title,
            model,
        } => {
            let update = SessionUpdate {
                title: title.as_deref(),
                model: model.as_deref(),
            };
            if update.is_empty() {
                ApplyOutcome::Skipped("empty update")
            } else if SessionRepo::update(conn, session_id, &update, ts)? {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("session not found")
            }
        }
        EventPayload::StateSaved {
            state_id,
            workspace_id,
            name,
            content: _,
        } => {
            // Content stays in the log; only metadata is materialized.
            if WorkspaceRepo::get(conn, workspace_id)?.is_none() {
                ApplyOutcome::Skipped("workspace not found")
            } else if StateRepo::insert(conn, state_id, workspace_id, name, ts)? {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("state already exists")
            }
        }
        EventPayload::StateDeleted { state_id } => {
            if StateRepo::delete(conn, state_id)? {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("state not found")
            }
        }
        EventPayload::TraceAdded {
            trace_id,
            workspace_id,
            content,
            category,
        } => {
            if WorkspaceRepo::get(conn, workspace_id)?.is_none() {
                ApplyOutcome::Skipped("workspace not found")
            } else if TraceRepo::insert(
                conn,
                trace_id,
                workspace_id,
                content,
                category.as_deref(),
                ts,
            )? {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("trace already exists")
            }
        }
        _ => ApplyOutcome::Skipped("wrong event family"),
    };
    Ok(outcome)
}
