//! Conversation repository — conversations, messages, and branches.

use std::sync::Arc;

use tracing::instrument;

use nexus_core::ids::{BranchId, BranchMessageId, ConversationId, MessageId};
use nexus_core::{Page, PageRequest};

use crate::cache::repos::{
    BranchMessageRepo, BranchRepo, ConversationRepo, ListConversationsOptions, MessageRepo,
    SearchRepo,
};
use crate::cache::row_types::{BranchMessageRow, BranchRow, ConversationRow, MessageRow};
use crate::errors::{Result, StoreError};
use crate::events::EventPayload;

use super::StoreContext;

/// Fields to change on a conversation.
#[derive(Clone, Debug, Default)]
pub struct ConversationChanges {
    /// New title.
    pub title: Option<String>,
    /// New workspace association.
    pub workspace_id: Option<String>,
}

/// A new message for the main thread or a branch.
#[derive(Clone, Debug)]
pub struct NewMessage {
    /// Speaker role ("user", "assistant", "system").
    pub role: String,
    /// Message text.
    pub content: String,
    /// Model reasoning text, when captured.
    pub reasoning: Option<String>,
    /// Model that produced the message, if any.
    pub model: Option<String>,
}

/// Fields to change on a message.
#[derive(Clone, Debug, Default)]
pub struct MessageChanges {
    /// New content.
    pub content: Option<String>,
    /// New reasoning.
    pub reasoning: Option<String>,
}

/// Public API for the conversation family. Cheap to clone.
#[derive(Clone)]
pub struct ConversationRepository {
    ctx: Arc<StoreContext>,
}

impl ConversationRepository {
    pub(crate) fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    // ── Conversations ───────────────────────────────────────────────────

    /// Create a conversation.
    #[instrument(skip(self))]
    pub async fn create_conversation(
        &self,
        title: &str,
        workspace_id: Option<&str>,
    ) -> Result<ConversationRow> {
        let id = ConversationId::new();
        let path = self.ctx.paths.conversation_log(id.as_str());
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::Metadata {
                    conversation_id: id.as_str().to_owned(),
                    title: title.to_owned(),
                    workspace_id: workspace_id.map(str::to_owned),
                },
            )
            .await?;
        self.get_conversation(id.as_str()).await
    }

    /// Fetch a conversation or fail with `NotFound`.
    pub async fn get_conversation(&self, id: &str) -> Result<ConversationRow> {
        let conn = self.ctx.conn()?;
        ConversationRepo::get(&conn, id)?.ok_or_else(|| StoreError::not_found("conversation", id))
    }

    /// A page of conversations, most recently active first.
    pub async fn list_conversations(
        &self,
        workspace_id: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<ConversationRow>> {
        let page = page.normalized();
        let conn = self.ctx.conn()?;
        let total = ConversationRepo::count(&conn, workspace_id)?;
        let opts = ListConversationsOptions {
            workspace_id,
            limit: Some(page.limit()),
            offset: Some(page.offset()),
        };
        let items = ConversationRepo::list(&conn, &opts)?;
        Ok(Page::from_items(items, total, page))
    }

    /// Apply a partial update to a conversation.
    #[instrument(skip(self, changes))]
    pub async fn update_conversation(
        &self,
        id: &str,
        changes: ConversationChanges,
    ) -> Result<ConversationRow> {
        if changes.title.is_none() && changes.workspace_id.is_none() {
            return Err(StoreError::InvalidOperation(
                "conversation update has no fields".into(),
            ));
        }
        let _ = self.get_conversation(id).await?;
        let path = self.ctx.paths.conversation_log(id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::ConversationUpdated {
                    conversation_id: id.to_owned(),
                    title: changes.title,
                    workspace_id: changes.workspace_id,
                },
            )
            .await?;
        self.get_conversation(id).await
    }

    /// Delete a conversation's cache rows. The log keeps the history.
    ///
    /// Deletion is cache-local, so it is not an event: no delete marker is
    /// appended and other devices are unaffected.
    #[instrument(skip(self))]
    pub async fn delete_conversation(&self, id: &str) -> Result<()> {
        let _ = self.get_conversation(id).await?;
        let _guard = self.ctx.write_lock.lock().await;
        let conn = self.ctx.conn()?;
        let _ = ConversationRepo::delete(&conn, id)?;
        Ok(())
    }

    /// Full-text search over conversation titles.
    pub async fn search_conversations(&self, query: &str) -> Result<Vec<ConversationRow>> {
        let conn = self.ctx.conn()?;
        SearchRepo::conversations(&conn, query)
    }

    // ── Messages ────────────────────────────────────────────────────────

    /// Append a message to the main thread.
    #[instrument(skip(self, message))]
    pub async fn add_message(
        &self,
        conversation_id: &str,
        message: NewMessage,
    ) -> Result<MessageRow> {
        let _ = self.get_conversation(conversation_id).await?;
        let id = MessageId::new();
        let path = self.ctx.paths.conversation_log(conversation_id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::Message {
                    message_id: id.as_str().to_owned(),
                    conversation_id: conversation_id.to_owned(),
                    role: message.role,
                    content: message.content,
                    reasoning: message.reasoning,
                    model: message.model,
                },
            )
            .await?;
        self.get_message(id.as_str()).await
    }

    /// Fetch a message or fail with `NotFound`.
    pub async fn get_message(&self, id: &str) -> Result<MessageRow> {
        let conn = self.ctx.conn()?;
        MessageRepo::get(&conn, id)?.ok_or_else(|| StoreError::not_found("message", id))
    }

    /// Apply a partial update to a message.
    #[instrument(skip(self, changes))]
    pub async fn update_message(&self, id: &str, changes: MessageChanges) -> Result<MessageRow> {
        if changes.content.is_none() && changes.reasoning.is_none() {
            return Err(StoreError::InvalidOperation(
                "message update has no fields".into(),
            ));
        }
        let message = self.get_message(id).await?;
        let path = self.ctx.paths.conversation_log(&message.conversation_id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::MessageUpdated {
                    message_id: id.to_owned(),
                    content: changes.content,
                    reasoning: changes.reasoning,
                },
            )
            .await?;
        self.get_message(id).await
    }

    /// A page of main-thread messages in sequence order.
    pub async fn list_messages(
        &self,
        conversation_id: &str,
        page: PageRequest,
    ) -> Result<Page<MessageRow>> {
        let page = page.normalized();
        let conn = self.ctx.conn()?;
        let total = MessageRepo::count(&conn, conversation_id)?;
        let items = MessageRepo::list_page(&conn, conversation_id, page.limit(), page.offset())?;
        Ok(Page::from_items(items, total, page))
    }

    /// Full-text search over message content and reasoning.
    pub async fn search_messages(
        &self,
        query: &str,
        conversation_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<MessageRow>> {
        let conn = self.ctx.conn()?;
        SearchRepo::messages(&conn, query, conversation_id, limit)
    }

    // ── Branches ────────────────────────────────────────────────────────

    /// Fork a branch off the main thread.
    ///
    /// The fork point is referenced by message ID; when given, it must be
    /// a message of this conversation.
    #[instrument(skip(self))]
    pub async fn create_branch(
        &self,
        conversation_id: &str,
        name: Option<&str>,
        parent_message_id: Option<&str>,
    ) -> Result<BranchRow> {
        let _ = self.get_conversation(conversation_id).await?;
        if let Some(parent_id) = parent_message_id {
            let parent = self.get_message(parent_id).await?;
            if parent.conversation_id != conversation_id {
                return Err(StoreError::InvalidOperation(format!(
                    "message {parent_id} belongs to another conversation"
                )));
            }
        }
        let id = BranchId::new();
        let path = self.ctx.paths.conversation_log(conversation_id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::BranchCreated {
                    branch_id: id.as_str().to_owned(),
                    conversation_id: conversation_id.to_owned(),
                    name: name.map(str::to_owned),
                    parent_message_id: parent_message_id.map(str::to_owned),
                },
            )
            .await?;
        self.get_branch(id.as_str()).await
    }

    /// Fetch a branch or fail with `NotFound`.
    pub async fn get_branch(&self, id: &str) -> Result<BranchRow> {
        let conn = self.ctx.conn()?;
        BranchRepo::get(&conn, id)?.ok_or_else(|| StoreError::not_found("branch", id))
    }

    /// Rename a branch.
    #[instrument(skip(self))]
    pub async fn rename_branch(&self, id: &str, name: &str) -> Result<BranchRow> {
        let branch = self.get_branch(id).await?;
        let path = self.ctx.paths.conversation_log(&branch.conversation_id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::BranchUpdated {
                    branch_id: id.to_owned(),
                    name: Some(name.to_owned()),
                },
            )
            .await?;
        self.get_branch(id).await
    }

    /// Branches of a conversation in creation order.
    pub async fn list_branches(&self, conversation_id: &str) -> Result<Vec<BranchRow>> {
        let conn = self.ctx.conn()?;
        BranchRepo::list_for_conversation(&conn, conversation_id)
    }

    /// Append a message to a branch.
    #[instrument(skip(self, message))]
    pub async fn add_branch_message(
        &self,
        branch_id: &str,
        message: NewMessage,
    ) -> Result<BranchMessageRow> {
        let branch = self.get_branch(branch_id).await?;
        let id = BranchMessageId::new();
        let path = self.ctx.paths.conversation_log(&branch.conversation_id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::BranchMessage {
                    branch_message_id: id.as_str().to_owned(),
                    branch_id: branch_id.to_owned(),
                    conversation_id: branch.conversation_id.clone(),
                    role: message.role,
                    content: message.content,
                    reasoning: message.reasoning,
                },
            )
            .await?;
        let conn = self.ctx.conn()?;
        BranchMessageRepo::get(&conn, id.as_str())?
            .ok_or_else(|| StoreError::not_found("branch message", id.as_str()))
    }

    /// Apply a partial update to a branch message.
    #[instrument(skip(self, changes))]
    pub async fn update_branch_message(
        &self,
        id: &str,
        changes: MessageChanges,
    ) -> Result<BranchMessageRow> {
        if changes.content.is_none() && changes.reasoning.is_none() {
            return Err(StoreError::InvalidOperation(
                "branch message update has no fields".into(),
            ));
        }
        let conn = self.ctx.conn()?;
        let existing = BranchMessageRepo::get(&conn, id)?
            .ok_or_else(|| StoreError::not_found("branch message", id))?;
        drop(conn);

        let path = self.ctx.paths.conversation_log(&existing.conversation_id);
        let _ = self
            .ctx
            .write(
                &path,
                EventPayload::BranchMessageUpdated {
                    branch_message_id: id.to_owned(),
                    content: changes.content,
                    reasoning: changes.reasoning,
                },
            )
            .await?;
        let conn = self.ctx.conn()?;
        BranchMessageRepo::get(&conn, id)?.ok_or_else(|| StoreError::not_found("branch message", id))
    }

    /// Every message in a branch, in sequence order.
    pub async fn list_branch_messages(&self, branch_id: &str) -> Result<Vec<BranchMessageRow>> {
        let conn = self.ctx.conn()?;
        BranchMessageRepo::list_for_branch(&conn, branch_id)
    }
}
