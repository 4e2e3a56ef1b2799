//! Appliers for conversation-family events.

use rusqlite::Connection;

use crate::cache::repos::{
    BranchMessageRepo, BranchMessageUpdate, BranchRepo, BranchUpdate, ConversationRepo,
    ConversationUpdate, MessageRepo, MessageUpdate,
};
use crate::errors::Result;
use crate::events::{EventPayload, StorageEvent};

use super::ApplyOutcome;

pub(super) fn apply(conn: &Connection, event: &StorageEvent) -> Result<ApplyOutcome> {
    let ts = event.timestamp;
    let outcome = match &event.payload {
        EventPayload::Metadata {
            conversation_id,
            title,
            workspace_id,
        } => {
            if ConversationRepo::insert(conn, conversation_id, title, workspace_id.as_deref(), ts)?
            {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("conversation already exists")
            }
        }
        EventPayload::ConversationUpdated {
            conversation_id,
            title,
            workspace_id,
        } => {
            let update = ConversationUpdate {
                title: title.as_deref(),
                workspace_id: workspace_id.as_deref(),
            };
            if update.is_empty() {
                ApplyOutcome::Skipped("empty update")
            } else if ConversationRepo::update(conn, conversation_id, &update, ts)? {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("conversation not found")
            }
        }
        EventPayload::Message {
            message_id,
            conversation_id,
            role,
            content,
            reasoning,
            model,
        } => {
            if ConversationRepo::get(conn, conversation_id)?.is_none() {
                ApplyOutcome::Skipped("conversation not found")
            } else {
                // Sequence assignment and the counter bump share the
                // caller's transaction with the insert.
                let seq = MessageRepo::next_sequence(conn, conversation_id)?;
                if MessageRepo::insert(
                    conn,
                    message_id,
                    conversation_id,
                    role,
                    content,
                    reasoning.as_deref(),
                    model.as_deref(),
                    seq,
                    ts,
                )? {
                    let _ = ConversationRepo::increment_message_count(conn, conversation_id, ts)?;
                    ApplyOutcome::Applied
                } else {
                    ApplyOutcome::Skipped("message already exists")
                }
            }
        }
        EventPayload::MessageUpdated {
            message_id,
            content,
            reasoning,
        } => {
            let update = MessageUpdate {
                content: content.as_deref(),
                reasoning: reasoning.as_deref(),
            };
            if update.is_empty() {
                ApplyOutcome::Skipped("empty update")
            } else if MessageRepo::update(conn, message_id, &update, ts)? {
                if let Some(row) = MessageRepo::get(conn, message_id)? {
                    let _ = ConversationRepo::touch(conn, &row.conversation_id, ts)?;
                }
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("message not found")
            }
        }
        EventPayload::BranchCreated {
            branch_id,
            conversation_id,
            name,
            parent_message_id,
        } => {
            if ConversationRepo::get(conn, conversation_id)?.is_none() {
                ApplyOutcome::Skipped("conversation not found")
            } else if BranchRepo::insert(
                conn,
                branch_id,
                conversation_id,
                name.as_deref(),
                parent_message_id.as_deref(),
                ts,
            )? {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("branch already exists")
            }
        }
        EventPayload::BranchMessage {
            branch_message_id,
            branch_id,
            conversation_id,
            role,
            content,
            reasoning,
        } => {
            if BranchRepo::get(conn, branch_id)?.is_none() {
                ApplyOutcome::Skipped("branch not found")
            } else {
                let seq = BranchMessageRepo::next_sequence(conn, branch_id)?;
                if BranchMessageRepo::insert(
                    conn,
                    branch_message_id,
                    branch_id,
                    conversation_id,
                    role,
                    content,
                    reasoning.as_deref(),
                    seq,
                    ts,
                )? {
                    let _ = ConversationRepo::touch(conn, conversation_id, ts)?;
                    ApplyOutcome::Applied
                } else {
                    ApplyOutcome::Skipped("branch message already exists")
                }
            }
        }
        EventPayload::BranchMessageUpdated {
            branch_message_id,
            content,
            reasoning,
        } => {
            let update = BranchMessageUpdate {
                content: content.as_deref(),
                reasoning: reasoning.as_deref(),
            };
            if update.is_empty() {
                ApplyOutcome::Skipped("empty update")
            } else if BranchMessageRepo::update(conn, branch_message_id, &update, ts)? {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("branch message not found")
            }
        }
        EventPayload::BranchUpdated { branch_id, name } => {
            let update = BranchUpdate {
                name: name.as_deref(),
            };
            if update.is_empty() {
                ApplyOutcome::Skipped("empty update")
            } else if BranchRepo::update(conn, branch_id, &update, ts)? {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Skipped("branch not found")
            }
        }
        _ => ApplyOutcome::Skipped("wrong event family"),
    };
    Ok(outcome)
}
