//! Millisecond-epoch timestamps.
//!
//! Events carry `i64` milliseconds since the Unix epoch — the one clock
//! the whole store orders by. RFC 3339 rendering is display-only and never
//! persisted.

use chrono::{DateTime, Utc};

/// Current time as milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render a millisecond timestamp as RFC 3339 for logs and display.
///
/// Out-of-range values fall back to the epoch rather than panicking —
/// timestamps read from disk are untrusted.
#[must_use]
pub fn ms_to_rfc3339(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp_millis(0).unwrap_or_default())
        .to_rfc3339()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
