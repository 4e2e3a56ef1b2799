//! Fine-tuning dataset export.
//!
//! Writes conversations as JSONL, one training example per line:
//!
//! ```json
//! {"messages":[{"role":"user","content":"..."},{"role":"assistant","content":"..."}]}
//! ```
//!
//! Only main-thread messages are exported; branches are exploratory and
//! stay out of training data.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

use crate::cache::repos::{ConversationRepo, ListConversationsOptions, MessageRepo};
use crate::errors::Result;
use crate::repos::StoreContext;

/// Filters for a fine-tuning export. All filters are conjunctive.
#[derive(Clone, Debug, Default)]
pub struct ExportOptions {
    /// Only these conversations, when set.
    pub conversation_ids: Option<Vec<String>>,
    /// Only conversations associated with this workspace.
    pub workspace_id: Option<String>,
    /// Only conversations created at or after this timestamp (ms).
    pub since: Option<i64>,
    /// Only conversations created at or before this timestamp (ms).
    pub until: Option<i64>,
}

/// What an export produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Training examples written (one per conversation).
    pub conversations: usize,
    /// Messages across all examples.
    pub messages: usize,
}

#[derive(Serialize)]
struct ExportLine<'a> {
    messages: Vec<ExportMessage<'a>>,
}

#[derive(Serialize)]
struct ExportMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Exports cached conversations as fine-tuning JSONL.
#[derive(Clone)]
pub struct FineTuneExporter {
    ctx: Arc<StoreContext>,
}

impl FineTuneExporter {
    pub(crate) fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    /// Write the filtered conversations to `output`.
    ///
    /// Conversations with no main-thread messages are skipped — an empty
    /// `messages` array is useless as a training example.
    #[instrument(skip(self, opts))]
    pub async fn export(&self, output: &Path, opts: &ExportOptions) -> Result<ExportReport> {
        let conn = self.ctx.conn()?;
        let conversations = ConversationRepo::list(
            &conn,
            &ListConversationsOptions {
                workspace_id: opts.workspace_id.as_deref(),
                limit: None,
                offset: None,
            },
        )?;

        let mut report = ExportReport::default();
        let mut buf = String::new();
        for conversation in conversations {
            if let Some(ids) = &opts.conversation_ids
                && !ids.iter().any(|id| id == &conversation.id)
            {
                continue;
            }
            if opts.since.is_some_and(|ts| conversation.created_at < ts)
                || opts.until.is_some_and(|ts| conversation.created_at > ts)
            {
                continue;
            }

            let rows = MessageRepo::list_page(&conn, &conversation.id, i64::MAX, 0)?;
            if rows.is_empty() {
                continue;
            }

            let line = ExportLine {
                messages: rows
                    .iter()
                    .map(|m| ExportMessage {
                        role: &m.role,
                        content: &m.content,
                    })
                    .collect(),
            };
            buf.push_str(&serde_json::to_string(&line)?);
            buf.push('\n');
            report.conversations += 1;
            report.messages += rows.len();
        }
        drop(conn);

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(output).await?;
        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;

        info!(
            conversations = report.conversations,
            messages = report.messages,
            path = %output.display(),
            "fine-tuning export complete"
        );
        Ok(report)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
