//! Stable per-installation device identity.
//!
//! Every event records which device wrote it, so sync can exclude local
//! writes (the writing repository already applied them). The identity is
//! generated once, written to `device-id` under the base directory, and
//! read back on every subsequent open.

use std::path::Path;

use nexus_core::ids::DeviceId;
use tracing::{debug, info};

use crate::errors::Result;

/// Load the persisted device identity, generating and persisting a fresh
/// one on first run.
///
/// An empty or whitespace-only file is treated as absent — a crash during
/// first write must not pin the install to a blank identity.
pub async fn load_or_create(path: &Path) -> Result<DeviceId> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            let trimmed = contents.trim();
            if !trimmed.is_empty() {
                debug!(device_id = %trimmed, "loaded device identity");
                return Ok(DeviceId::from_string(trimmed.to_owned()));
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let device_id = DeviceId::generate();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, device_id.as_str()).await?;
    info!(device_id = %device_id, "generated new device identity");
    Ok(device_id)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
