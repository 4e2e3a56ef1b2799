//! Store configuration.

use std::path::PathBuf;

/// Default directory name under which all store data lives.
pub const DEFAULT_BASE_DIR: &str = ".nexus";

/// Configuration for opening a [`NexusStore`](crate::store::NexusStore).
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Base directory for logs, cache, and status files.
    pub base_dir: PathBuf,
    /// `SQLite` connection pool configuration.
    pub connection: ConnectionConfig,
    /// Events applied per transaction during a full rebuild.
    ///
    /// Kept small (tens, not hundreds) to bound the embedded engine's peak
    /// memory while replaying large logs.
    pub rebuild_batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            connection: ConnectionConfig::default(),
            rebuild_batch_size: 50,
        }
    }
}

impl StoreConfig {
    /// Config rooted at a specific base directory, defaults elsewhere.
    #[must_use]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }
}

/// Configuration for the `SQLite` connection pool.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Maximum pool size (default: 8).
    pub pool_size: u32,
    /// Busy timeout in milliseconds (default: 30000).
    pub busy_timeout_ms: u32,
    /// Cache size in KiB (default: 8192 = 8 MB).
    pub cache_size_kib: i64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_dir() {
        let config = StoreConfig::default();
        assert_eq!(config.base_dir, PathBuf::from(".nexus"));
    }

    #[test]
    fn rebuild_batch_is_small() {
        let config = StoreConfig::default();
        assert!(config.rebuild_batch_size <= 100);
    }

    #[test]
    fn with_base_dir() {
        let config = StoreConfig::with_base_dir("/tmp/data");
        assert_eq!(config.base_dir, PathBuf::from("/tmp/data"));
        assert_eq!(config.rebuild_batch_size, 50);
    }
}
