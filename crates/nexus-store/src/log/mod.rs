//! Append-only JSONL event logs — the source of truth.
//!
//! One file per owning entity, one JSON event per line, appends only.
//! Files are never rewritten or compacted: a workspace or conversation
//! delete removes cache rows, while its log keeps the full history.
//!
//! Readers are tolerant by construction. A missing file reads as an empty
//! history and a malformed line is skipped with a warning, so one corrupt
//! byte can never take the rest of a log hostage.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::warn;

use nexus_core::ids::DeviceId;

use crate::errors::{Result, StoreError};
use crate::events::{EventPayload, StorageEvent};

/// Writer/reader for the JSONL event logs of one store instance.
///
/// Holds the local device identity so appends can stamp events without
/// threading it through every call site.
#[derive(Clone, Debug)]
pub struct EventLog {
    device_id: DeviceId,
}

impl EventLog {
    /// Create a log handle stamping events as the given device.
    #[must_use]
    pub fn new(device_id: DeviceId) -> Self {
        Self { device_id }
    }

    /// The device identity this log stamps onto new events.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Stamp a payload and append it as one line to `path`.
    ///
    /// Creates the parent directory on first append. Returns the full
    /// event as persisted so callers can apply it to the cache.
    pub async fn append(&self, path: &Path, payload: EventPayload) -> Result<StorageEvent> {
        let event = StorageEvent::stamp(&self.device_id, payload);
        self.append_events(path, std::slice::from_ref(&event))
            .await?;
        Ok(event)
    }

    /// Append already-stamped events as consecutive lines in one write.
    ///
    /// Used by legacy migration, where events carry historical timestamps
    /// and a whole document converts into one batch.
    pub async fn append_events(&self, path: &Path, events: &[StorageEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut buf = String::new();
        for event in events {
            buf.push_str(&serde_json::to_string(event)?);
            buf.push('\n');
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Read every event in a log, in file (append) order.
    ///
    /// A missing file is an empty history. Malformed lines are skipped
    /// with a warning so the remainder of the log still loads.
    pub async fn read_all(&self, path: &Path) -> Result<Vec<StorageEvent>> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<StorageEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    let err = StoreError::MalformedEvent {
                        path: path.display().to_string(),
                        line: idx + 1,
                    };
                    warn!(error = %err, cause = %e, "skipping malformed log line");
                }
            }
        }
        Ok(events)
    }

    /// Read events newer than `since_ts` (strictly greater).
    pub async fn read_since(&self, path: &Path, since_ts: i64) -> Result<Vec<StorageEvent>> {
        let mut events = self.read_all(path).await?;
        events.retain(|e| e.timestamp > since_ts);
        Ok(events)
    }

    /// Read events newer than `since_ts` written by other devices.
    ///
    /// Local writes are already in the cache (the repositories apply them
    /// at write time), so sync only wants foreign ones.
    pub async fn read_foreign_since(
        &self,
        path: &Path,
        since_ts: i64,
    ) -> Result<Vec<StorageEvent>> {
        let mut events = self.read_since(path, since_ts).await?;
        events.retain(|e| e.device_id != self.device_id);
        Ok(events)
    }
}

/// List the `.jsonl` log files directly under a directory.
///
/// A missing directory lists as empty. Order is unspecified; callers that
/// care sort the events they read, not the files.
pub async fn list_log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "jsonl") {
            files.push(path);
        }
    }
    Ok(files)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;

    fn log() -> EventLog {
        EventLog::new(DeviceId::from("dev_local"))
    }

    fn trace_payload(content: &str) -> EventPayload {
        EventPayload::TraceAdded {
            trace_id: "tr_1".into(),
            workspace_id: "ws_1".into(),
            content: content.into(),
            category: None,
        }
    }

    #[tokio::test]
    async fn append_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspaces/ws_1.jsonl");
        let log = log();

        let written = log.append(&path, trace_payload("first")).await.unwrap();
        let events = log.read_all(&path).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], written);
    }

    #[tokio::test]
    async fn appends_preserve_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ws_1.jsonl");
        let log = log();

        log.append(&path, trace_payload("a")).await.unwrap();
        log.append(&path, trace_payload("b")).await.unwrap();
        log.append(&path, trace_payload("c")).await.unwrap();

        let events = log.read_all(&path).await.unwrap();
        let contents: Vec<_> = events
            .iter()
            .map(|e| match &e.payload {
                EventPayload::TraceAdded { content, .. } => content.clone(),
                other => panic!("unexpected payload: {other:?}"),
            })
            .collect();
        assert_eq!(contents, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let events = log()
            .read_all(&dir.path().join("absent.jsonl"))
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ws_1.jsonl");
        let log = log();

        log.append(&path, trace_payload("good")).await.unwrap();
        let mut raw = tokio::fs::read_to_string(&path).await.unwrap();
        raw.push_str("this is not json\n");
        tokio::fs::write(&path, raw).await.unwrap();
        log.append(&path, trace_payload("also good")).await.unwrap();

        let events = log.read_all(&path).await.unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn read_since_is_strictly_greater() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ws_1.jsonl");
        let log = log();

        let old = StorageEvent::stamp_at(log.device_id(), 100, trace_payload("old"));
        let new = StorageEvent::stamp_at(log.device_id(), 200, trace_payload("new"));
        log.append_events(&path, &[old, new]).await.unwrap();

        let events = log.read_since(&path, 100).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, 200);
    }

    #[tokio::test]
    async fn foreign_reads_exclude_local_device() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ws_1.jsonl");
        let log = log();
        let other = DeviceId::from("dev_other");

        let local = StorageEvent::stamp_at(log.device_id(), 10, trace_payload("mine"));
        let foreign = StorageEvent::stamp_at(&other, 20, trace_payload("theirs"));
        log.append_events(&path, &[local, foreign]).await.unwrap();

        let events = log.read_foreign_since(&path, 0).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].device_id, other);
    }

    #[tokio::test]
    async fn lists_only_jsonl_files() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("ws_1.jsonl"), "").await.unwrap();
        tokio::fs::write(dir.path().join("ws_2.jsonl"), "").await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "").await.unwrap();

        let files = list_log_files(dir.path()).await.unwrap();
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn listing_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = list_log_files(&dir.path().join("nope")).await.unwrap();
        assert!(files.is_empty());
    }
}
