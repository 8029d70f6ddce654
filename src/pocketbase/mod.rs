//! Minimal PocketBase client
//!
//! The backend boundary the adapters translate onto: record CRUD, paged
//! full-list fetches, realtime subscriptions over server-sent events, and an
//! auth store holding the session token and account record.

mod auth_store;
mod client;
mod realtime;
mod records;
mod sse;

#[cfg(test)]
pub(crate) use auth_store::test_token;
pub use auth_store::{AuthStore, ChangeListener, ChangeListenerId};
pub use client::{ClientResponseError, PocketBase};
pub use realtime::{RealtimeSubscription, RecordSubscriptionEvent};
pub use records::{ListResult, RecordAuthResponse, RecordService, FULL_LIST_BATCH};

/// A PocketBase record as returned by the API
pub type Record = serde_json::Map<String, serde_json::Value>;
