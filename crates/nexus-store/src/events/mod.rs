//! The event model — every mutation in the store is one of these records.
//!
//! [`StorageEvent`] is the persisted line format: base fields (`id`,
//! `deviceId`, `timestamp`) at the top level with the payload fields
//! flattened alongside a `type` discriminator, exactly one JSON object per
//! log line:
//!
//! ```json
//! {"id":"evt_…","type":"workspace_created","deviceId":"dev_…","timestamp":1719000000000,"workspaceId":"ws_…","name":"Research"}
//! ```
//!
//! [`EventPayload`] is a closed, internally tagged enum — one variant per
//! event type, each fully typed. Unknown `type` strings fail the line
//! parse and are skipped by the log reader, so logs written by newer
//! versions degrade gracefully instead of aborting a read.
//!
//! Update payloads carry `Option` fields with `skip_serializing_if`:
//! a field absent from the wire means "leave the existing value alone",
//! never "clear it".

use serde::{Deserialize, Serialize};
use serde_json::Value;

use nexus_core::ids::{DeviceId, EventId};
use nexus_core::now_ms;

/// Which log family an event belongs to.
///
/// Workspace-family events live in `workspaces/ws_{id}.jsonl`,
/// conversation-family events in `conversations/conv_{id}.jsonl`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventFamily {
    /// Workspace, session, state, and trace events.
    Workspace,
    /// Conversation, message, and branch events.
    Conversation,
}

/// A persisted storage event.
///
/// Immutable once appended: `id`, `device_id`, and `timestamp` are
/// injected by the log writer at append time and preserved verbatim when
/// an event read from disk is re-serialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEvent {
    /// Unique event ID (prefixed UUID v7).
    pub id: EventId,
    /// Device that originally wrote this event.
    pub device_id: DeviceId,
    /// Milliseconds since the Unix epoch at write time.
    pub timestamp: i64,
    /// Typed, type-discriminated payload (flattened onto the line).
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl StorageEvent {
    /// Stamp a payload with a fresh id, the local device, and now.
    #[must_use]
    pub fn stamp(device_id: &DeviceId, payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            device_id: device_id.clone(),
            timestamp: now_ms(),
            payload,
        }
    }

    /// Stamp a payload but preserve an original timestamp.
    ///
    /// Used by legacy migration so converted events keep the ordering of
    /// the documents they came from.
    #[must_use]
    pub fn stamp_at(device_id: &DeviceId, timestamp: i64, payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            device_id: device_id.clone(),
            timestamp,
            payload,
        }
    }
}

/// Closed set of event payloads, discriminated by the `type` field.
///
/// Variant names serialize to the exact snake_case strings on the wire
/// (`workspace_created`, `metadata`, `branch_message`, ...). Field names
/// serialize as camelCase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EventPayload {
    // ── Workspace family ────────────────────────────────────────────────
    /// A workspace came into existence.
    WorkspaceCreated {
        /// Owning workspace ID (also names the log file).
        workspace_id: String,
        /// Display name.
        name: String,
        /// Optional description.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Partial update of workspace fields.
    WorkspaceUpdated {
        /// Target workspace.
        workspace_id: String,
        /// New name, if changing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// New description, if changing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Workspace removed from the cache (the log retains history).
    WorkspaceDeleted {
        /// Target workspace.
        workspace_id: String,
    },
    /// A session started inside a workspace.
    SessionCreated {
        /// New session ID.
        session_id: String,
        /// Owning workspace.
        workspace_id: String,
        /// Optional title.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Model in use, if known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    /// Partial update of session fields.
    SessionUpdated {
        /// Target session.
        session_id: String,
        /// New title, if changing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// New model, if changing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    /// A state snapshot was saved. `content` lives only in the log;
    /// the cache keeps metadata and resolves content lazily.
    StateSaved {
        /// New state ID.
        state_id: String,
        /// Owning workspace.
        workspace_id: String,
        /// Snapshot name.
        name: String,
        /// Full snapshot content (arbitrary JSON).
        content: Value,
    },
    /// State snapshot removed from the cache.
    StateDeleted {
        /// Target state.
        state_id: String,
    },
    /// A memory trace was recorded.
    TraceAdded {
        /// New trace ID.
        trace_id: String,
        /// Owning workspace.
        workspace_id: String,
        /// Trace text.
        content: String,
        /// Optional category tag.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },

    // ── Conversation family ─────────────────────────────────────────────
    /// Conversation creation (historical wire name: `metadata`).
    Metadata {
        /// New conversation ID (also names the log file).
        conversation_id: String,
        /// Conversation title.
        title: String,
        /// Workspace this conversation is associated with, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workspace_id: Option<String>,
    },
    /// Partial update of conversation fields.
    ConversationUpdated {
        /// Target conversation.
        conversation_id: String,
        /// New title, if changing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// New workspace association, if changing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workspace_id: Option<String>,
    },
    /// A message was added to the main thread.
    Message {
        /// New message ID.
        message_id: String,
        /// Owning conversation.
        conversation_id: String,
        /// Speaker role ("user", "assistant", "system").
        role: String,
        /// Message text.
        content: String,
        /// Model reasoning text, when captured.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
        /// Model that produced the message, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    /// Partial update of a message.
    MessageUpdated {
        /// Target message.
        message_id: String,
        /// New content, if changing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// New reasoning, if changing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
    },
    /// A branch was forked off the main thread.
    BranchCreated {
        /// New branch ID.
        branch_id: String,
        /// Owning conversation.
        conversation_id: String,
        /// Optional branch name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Message the branch forks from (foreign key by id, never an
        /// embedded object).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_message_id: Option<String>,
    },
    /// A message was added to a branch.
    BranchMessage {
        /// New branch message ID.
        branch_message_id: String,
        /// Owning branch.
        branch_id: String,
        /// Owning conversation (the log file owner).
        conversation_id: String,
        /// Speaker role.
        role: String,
        /// Message text.
        content: String,
        /// Model reasoning text, when captured.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
    },
    /// Partial update of a branch message.
    BranchMessageUpdated {
        /// Target branch message.
        branch_message_id: String,
        /// New content, if changing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// New reasoning, if changing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
    },
    /// Partial update of a branch.
    BranchUpdated {
        /// Target branch.
        branch_id: String,
        /// New name, if changing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl EventPayload {
    /// The wire `type` string for this payload.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::WorkspaceCreated { .. } => "workspace_created",
            Self::WorkspaceUpdated { .. } => "workspace_updated",
            Self::WorkspaceDeleted { .. } => "workspace_deleted",
            Self::SessionCreated { .. } => "session_created",
            Self::SessionUpdated { .. } => "session_updated",
            Self::StateSaved { .. } => "state_saved",
            Self::StateDeleted { .. } => "state_deleted",
            Self::TraceAdded { .. } => "trace_added",
            Self::Metadata { .. } => "metadata",
            Self::ConversationUpdated { .. } => "conversation_updated",
            Self::Message { .. } => "message",
            Self::MessageUpdated { .. } => "message_updated",
            Self::BranchCreated { .. } => "branch_created",
            Self::BranchMessage { .. } => "branch_message",
            Self::BranchMessageUpdated { .. } => "branch_message_updated",
            Self::BranchUpdated { .. } => "branch_updated",
        }
    }

    /// Which log family this payload belongs to.
    #[must_use]
    pub fn family(&self) -> EventFamily {
        match self {
            Self::WorkspaceCreated { .. }
            | Self::WorkspaceUpdated { .. }
            | Self::WorkspaceDeleted { .. }
            | Self::SessionCreated { .. }
            | Self::SessionUpdated { .. }
            | Self::StateSaved { .. }
            | Self::StateDeleted { .. }
            | Self::TraceAdded { .. } => EventFamily::Workspace,
            Self::Metadata { .. }
            | Self::ConversationUpdated { .. }
            | Self::Message { .. }
            | Self::MessageUpdated { .. }
            | Self::BranchCreated { .. }
            | Self::BranchMessage { .. }
            | Self::BranchMessageUpdated { .. }
            | Self::BranchUpdated { .. } => EventFamily::Conversation,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::ids::DeviceId;

    fn device() -> DeviceId {
        DeviceId::from("dev_test")
    }

    #[test]
    fn stamp_injects_base_fields() {
        let event = StorageEvent::stamp(
            &device(),
            EventPayload::WorkspaceDeleted {
                workspace_id: "ws_1".into(),
            },
        );
        assert!(event.id.as_str().starts_with("evt_"));
        assert_eq!(event.device_id.as_str(), "dev_test");
        assert!(event.timestamp > 0);
    }

    #[test]
    fn stamp_at_preserves_timestamp() {
        let event = StorageEvent::stamp_at(
            &device(),
            1_000,
            EventPayload::StateDeleted {
                state_id: "st_1".into(),
            },
        );
        assert_eq!(event.timestamp, 1_000);
    }

    #[test]
    fn wire_format_is_flat() {
        let event = StorageEvent::stamp(
            &device(),
            EventPayload::WorkspaceCreated {
                workspace_id: "ws_1".into(),
                name: "Research".into(),
                description: None,
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "workspace_created");
        assert_eq!(json["workspaceId"], "ws_1");
        assert_eq!(json["name"], "Research");
        assert_eq!(json["deviceId"], "dev_test");
        // Omitted optional fields never appear on the wire.
        assert!(json.get("description").is_none());
    }

    #[test]
    fn parses_persisted_line() {
        let line = r#"{"id":"evt_1","type":"message","deviceId":"dev_a","timestamp":42,"messageId":"msg_1","conversationId":"conv_1","role":"user","content":"hi"}"#;
        let event: StorageEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.id.as_str(), "evt_1");
        assert_eq!(event.timestamp, 42);
        match event.payload {
            EventPayload::Message {
                ref conversation_id,
                ref role,
                ..
            } => {
                assert_eq!(conversation_id, "conv_1");
                assert_eq!(role, "user");
            }
            ref other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn unknown_type_fails_parse() {
        let line = r#"{"id":"evt_1","type":"hologram_created","deviceId":"dev_a","timestamp":1}"#;
        assert!(serde_json::from_str::<StorageEvent>(line).is_err());
    }

    #[test]
    fn metadata_is_conversation_creation() {
        let payload = EventPayload::Metadata {
            conversation_id: "conv_1".into(),
            title: "Chat".into(),
            workspace_id: None,
        };
        assert_eq!(payload.type_name(), "metadata");
        assert_eq!(payload.family(), EventFamily::Conversation);
    }

    #[test]
    fn type_names_match_serde_tags() {
        let payloads = [
            EventPayload::WorkspaceDeleted {
                workspace_id: "ws_1".into(),
            },
            EventPayload::StateDeleted {
                state_id: "st_1".into(),
            },
            EventPayload::BranchUpdated {
                branch_id: "br_1".into(),
                name: Some("alt".into()),
            },
        ];
        for payload in payloads {
            let json = serde_json::to_value(&payload).unwrap();
            assert_eq!(json["type"], payload.type_name());
        }
    }

    #[test]
    fn roundtrip_preserves_base_fields_verbatim() {
        let line = r#"{"id":"evt_keep","type":"trace_added","deviceId":"dev_other","timestamp":777,"traceId":"tr_1","workspaceId":"ws_1","content":"observed"}"#;
        let event: StorageEvent = serde_json::from_str(line).unwrap();
        let out = serde_json::to_value(&event).unwrap();
        assert_eq!(out["id"], "evt_keep");
        assert_eq!(out["deviceId"], "dev_other");
        assert_eq!(out["timestamp"], 777);
    }

    #[test]
    fn families_split_by_log_ownership() {
        let ws = EventPayload::SessionCreated {
            session_id: "sess_1".into(),
            workspace_id: "ws_1".into(),
            title: None,
            model: None,
        };
        let conv = EventPayload::BranchMessage {
            branch_message_id: "bm_1".into(),
            branch_id: "br_1".into(),
            conversation_id: "conv_1".into(),
            role: "assistant".into(),
            content: "answer".into(),
            reasoning: None,
        };
        assert_eq!(ws.family(), EventFamily::Workspace);
        assert_eq!(conv.family(), EventFamily::Conversation);
    }
}
