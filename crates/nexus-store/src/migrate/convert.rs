//! Conversion of legacy JSON documents into ordered event batches.
//!
//! The legacy format stored one mutable JSON document per workspace or
//! conversation. Each document converts to a creation event followed by
//! one event per child record, all stamped with the original timestamps
//! so replay order matches the history the documents describe.

use serde::Deserialize;
use serde_json::Value;

use nexus_core::ids::{
    BranchId, BranchMessageId, ConversationId, DeviceId, MessageId, SessionId, StateId, TraceId,
    WorkspaceId,
};
use nexus_core::now_ms;

use crate::events::{EventPayload, StorageEvent};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyWorkspaceDoc {
    id: Option<String>,
    name: String,
    description: Option<String>,
    created_at: Option<i64>,
    #[serde(default)]
    sessions: Vec<LegacySession>,
    #[serde(default)]
    states: Vec<LegacyState>,
    #[serde(default)]
    traces: Vec<LegacyTrace>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacySession {
    id: Option<String>,
    title: Option<String>,
    model: Option<String>,
    created_at: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyState {
    id: Option<String>,
    name: String,
    content: Value,
    created_at: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTrace {
    id: Option<String>,
    content: String,
    category: Option<String>,
    created_at: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyConversationDoc {
    id: Option<String>,
    title: String,
    workspace_id: Option<String>,
    created_at: Option<i64>,
    #[serde(default)]
    messages: Vec<LegacyMessage>,
    #[serde(default)]
    branches: Vec<LegacyBranch>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyMessage {
    id: Option<String>,
    role: String,
    content: String,
    reasoning: Option<String>,
    model: Option<String>,
    created_at: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyBranch {
    id: Option<String>,
    name: Option<String>,
    parent_message_id: Option<String>,
    created_at: Option<i64>,
    #[serde(default)]
    messages: Vec<LegacyMessage>,
}

/// The converted form of one legacy document.
pub(crate) struct ConvertedDoc {
    /// Log-owning entity ID (names the target log file).
    pub entity_id: String,
    /// Events in replay order, timestamps preserved.
    pub events: Vec<StorageEvent>,
}

/// Convert a legacy workspace document.
pub(crate) fn workspace_doc(
    raw: &str,
    device: &DeviceId,
) -> std::result::Result<ConvertedDoc, String> {
    let doc: LegacyWorkspaceDoc =
        serde_json::from_str(raw).map_err(|e| format!("invalid workspace document: {e}"))?;

    let workspace_id = doc.id.unwrap_or_else(|| WorkspaceId::new().into_inner());
    let base_ts = doc.created_at.unwrap_or_else(now_ms);
    let mut events = vec![StorageEvent::stamp_at(
        device,
        base_ts,
        EventPayload::WorkspaceCreated {
            workspace_id: workspace_id.clone(),
            name: doc.name,
            description: doc.description,
        },
    )];

    for session in doc.sessions {
        events.push(StorageEvent::stamp_at(
            device,
            session.created_at.unwrap_or(base_ts),
            EventPayload::SessionCreated {
                session_id: session.id.unwrap_or_else(|| SessionId::new().into_inner()),
                workspace_id: workspace_id.clone(),
                title: session.title,
                model: session.model,
            },
        ));
    }
    for state in doc.states {
        events.push(StorageEvent::stamp_at(
            device,
            state.created_at.unwrap_or(base_ts),
            EventPayload::StateSaved {
                state_id: state.id.unwrap_or_else(|| StateId::new().into_inner()),
                workspace_id: workspace_id.clone(),
                name: state.name,
                content: state.content,
            },
        ));
    }
    for trace in doc.traces {
        events.push(StorageEvent::stamp_at(
            device,
            trace.created_at.unwrap_or(base_ts),
            EventPayload::TraceAdded {
                trace_id: trace.id.unwrap_or_else(|| TraceId::new().into_inner()),
                workspace_id: workspace_id.clone(),
                content: trace.content,
                category: trace.category,
            },
        ));
    }

    sort_children(&mut events);
    Ok(ConvertedDoc {
        entity_id: workspace_id,
        events,
    })
}

/// Convert a legacy conversation document.
pub(crate) fn conversation_doc(
    raw: &str,
    device: &DeviceId,
) -> std::result::Result<ConvertedDoc, String> {
    let doc: LegacyConversationDoc =
        serde_json::from_str(raw).map_err(|e| format!("invalid conversation document: {e}"))?;

    let conversation_id = doc.id.unwrap_or_else(|| ConversationId::new().into_inner());
    let base_ts = doc.created_at.unwrap_or_else(now_ms);
    let mut events = vec![StorageEvent::stamp_at(
        device,
        base_ts,
        EventPayload::Metadata {
            conversation_id: conversation_id.clone(),
            title: doc.title,
            workspace_id: doc.workspace_id,
        },
    )];

    // Main-thread order is the array order; sequence numbers come from
    // replay, so only relative order matters here.
    for message in doc.messages {
        events.push(StorageEvent::stamp_at(
            device,
            message.created_at.unwrap_or(base_ts),
            EventPayload::Message {
                message_id: message.id.unwrap_or_else(|| MessageId::new().into_inner()),
                conversation_id: conversation_id.clone(),
                role: message.role,
                content: message.content,
                reasoning: message.reasoning,
                model: message.model,
            },
        ));
    }

    for branch in doc.branches {
        let branch_id = branch.id.unwrap_or_else(|| BranchId::new().into_inner());
        let branch_ts = branch.created_at.unwrap_or(base_ts);
        events.push(StorageEvent::stamp_at(
            device,
            branch_ts,
            EventPayload::BranchCreated {
                branch_id: branch_id.clone(),
                conversation_id: conversation_id.clone(),
                name: branch.name,
                parent_message_id: branch.parent_message_id,
            },
        ));
        for message in branch.messages {
            events.push(StorageEvent::stamp_at(
                device,
                message.created_at.unwrap_or(branch_ts),
                EventPayload::BranchMessage {
                    branch_message_id: message
                        .id
                        .unwrap_or_else(|| BranchMessageId::new().into_inner()),
                    branch_id: branch_id.clone(),
                    conversation_id: conversation_id.clone(),
                    role: message.role,
                    content: message.content,
                    reasoning: message.reasoning,
                },
            ));
        }
    }

    sort_children(&mut events);
    Ok(ConvertedDoc {
        entity_id: conversation_id,
        events,
    })
}

/// Stable sort by timestamp, keeping the creation event first and array
/// order for ties.
fn sort_children(events: &mut [StorageEvent]) {
    if events.len() < 2 {
        return;
    }
    events[1..].sort_by_key(|e| e.timestamp);
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
