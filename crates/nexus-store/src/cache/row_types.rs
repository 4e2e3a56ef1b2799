//! Database row types for mapping between `SQLite` rows and Rust structs.
//!
//! These are the materialized shapes the cache serves to callers. All
//! timestamps are milliseconds since the Unix epoch, copied verbatim from
//! the events that produced the row.

use serde::{Deserialize, Serialize};

/// Raw workspace row from the `workspaces` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRow {
    /// Workspace ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// Raw session row from the `sessions` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    /// Session ID.
    pub id: String,
    /// Owning workspace ID.
    pub workspace_id: String,
    /// Optional title.
    pub title: Option<String>,
    /// Model in use, if known.
    pub model: Option<String>,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// Raw state row from the `states` table.
///
/// Metadata only. Snapshot content lives in the event log and is resolved
/// lazily by the workspace repository.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRow {
    /// State ID.
    pub id: String,
    /// Owning workspace ID.
    pub workspace_id: String,
    /// Snapshot name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: i64,
}

/// Raw memory trace row from the `memory_traces` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRow {
    /// Trace ID.
    pub id: String,
    /// Owning workspace ID.
    pub workspace_id: String,
    /// Trace text.
    pub content: String,
    /// Optional category tag.
    pub category: Option<String>,
    /// Creation timestamp.
    pub created_at: i64,
}

/// Raw conversation row from the `conversations` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRow {
    /// Conversation ID.
    pub id: String,
    /// Conversation title.
    pub title: String,
    /// Associated workspace, if any.
    pub workspace_id: Option<String>,
    /// Denormalized main-thread message count.
    pub message_count: i64,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// Raw message row from the `messages` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRow {
    /// Message ID.
    pub id: String,
    /// Owning conversation ID.
    pub conversation_id: String,
    /// Speaker role.
    pub role: String,
    /// Message text.
    pub content: String,
    /// Model reasoning text, when captured.
    pub reasoning: Option<String>,
    /// Model that produced the message, if any.
    pub model: Option<String>,
    /// Position in the main thread (0-based, gapless).
    pub sequence_number: i64,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// Raw branch row from the `branches` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRow {
    /// Branch ID.
    pub id: String,
    /// Owning conversation ID.
    pub conversation_id: String,
    /// Optional branch name.
    pub name: Option<String>,
    /// Message the branch forks from, by ID.
    pub parent_message_id: Option<String>,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// Raw branch message row from the `branch_messages` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchMessageRow {
    /// Branch message ID.
    pub id: String,
    /// Owning branch ID.
    pub branch_id: String,
    /// Owning conversation ID.
    pub conversation_id: String,
    /// Speaker role.
    pub role: String,
    /// Message text.
    pub content: String,
    /// Model reasoning text, when captured.
    pub reasoning: Option<String>,
    /// Position within the branch (0-based, gapless).
    pub sequence_number: i64,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}
