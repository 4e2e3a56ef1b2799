//! # nexus-core
//!
//! Shared leaf types for the Nexus persistence core:
//!
//! - **Branded IDs**: newtype wrappers around prefixed UUID v7 strings
//! - **Time**: millisecond-epoch timestamps (the canonical event clock)
//! - **Pagination**: clamped page requests and paged result envelopes

#![deny(unsafe_code)]

pub mod ids;
pub mod page;
pub mod time;

pub use ids::{
    BranchId, BranchMessageId, ConversationId, DeviceId, EventId, MessageId, SessionId, StateId,
    TraceId, WorkspaceId,
};
pub use page::{Page, PageRequest, MAX_PAGE_SIZE};
pub use time::now_ms;
