//! Branded ID newtypes for type safety.
//!
//! Every entity in the Nexus store has a distinct ID type implemented as a
//! newtype wrapper around `String`. This prevents accidentally passing a
//! conversation ID where a workspace ID is expected.
//!
//! Generated IDs are prefixed UUID v7 (time-ordered), e.g. `ws_0190...` —
//! the prefix makes log lines and cache rows greppable by entity kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (prefixed UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(format!(concat!($prefix, "_{}"), Uuid::now_v7()))
            }

            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Unique identifier for a persisted event.
    EventId, "evt"
}

branded_id! {
    /// Unique identifier for a workspace.
    WorkspaceId, "ws"
}

branded_id! {
    /// Unique identifier for a session within a workspace.
    SessionId, "sess"
}

branded_id! {
    /// Unique identifier for a saved state snapshot.
    StateId, "st"
}

branded_id! {
    /// Unique identifier for a memory trace.
    TraceId, "tr"
}

branded_id! {
    /// Unique identifier for a conversation.
    ConversationId, "conv"
}

branded_id! {
    /// Unique identifier for a message within a conversation.
    MessageId, "msg"
}

branded_id! {
    /// Unique identifier for a branch within a conversation.
    BranchId, "br"
}

branded_id! {
    /// Unique identifier for a message within a branch.
    BranchMessageId, "bm"
}

/// Stable per-installation device identifier.
///
/// Unlike the entity IDs above this is a UUID v4 — there is no ordering
/// requirement across installs, only uniqueness.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Generate a fresh device identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("dev_{}", Uuid::new_v4()))
    }

    /// Create from a previously persisted value.
    #[must_use]
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_has_prefix() {
        let id = EventId::new();
        assert!(id.as_str().starts_with("evt_"));
    }

    #[test]
    fn workspace_id_is_uuid_v7() {
        let id = WorkspaceId::new();
        let raw = id.as_str().strip_prefix("ws_").unwrap();
        let parsed = Uuid::parse_str(raw).expect("should be valid UUID");
        assert_eq!(parsed.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn ids_are_unique() {
        let a = EventId::new();
        let b = EventId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn event_ids_are_time_ordered() {
        // Ordering is only guaranteed across distinct milliseconds.
        let a = EventId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = EventId::new();
        assert!(a.as_str() < b.as_str());
    }

    #[test]
    fn from_string_preserves_value() {
        let id = ConversationId::from_string("conv_custom".to_owned());
        assert_eq!(id.as_str(), "conv_custom");
    }

    #[test]
    fn deref_to_str() {
        let id = MessageId::from("hello");
        let s: &str = &id;
        assert_eq!(s, "hello");
    }

    #[test]
    fn display() {
        let id = BranchId::from("display-me");
        assert_eq!(format!("{id}"), "display-me");
    }

    #[test]
    fn serde_roundtrip() {
        let id = StateId::from("serde-test");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"serde-test\"");
        let back: StateId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn device_id_has_prefix_and_is_unique() {
        let a = DeviceId::generate();
        let b = DeviceId::generate();
        assert!(a.as_str().starts_with("dev_"));
        assert_ne!(a, b);
    }

    #[test]
    fn hash_and_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        let id = EventId::from("same");
        let _ = set.insert(id.clone());
        let _ = set.insert(id);
        assert_eq!(set.len(), 1);
    }
}
