//! Firestore-shaped data API over PocketBase collections
//!
//! - `firestore.rs` → database handle, `collection` / `doc`
//! - `collection_reference.rs` → `add_doc`, one-shot `get`
//! - `document_reference.rs` → `update_doc` / `delete_doc`
//! - `query.rs` → `query` / `order_by` (accepted, not applied)
//! - `listener.rs` → `on_snapshot`
//! - `snapshot_stream.rs` → the same listener as a `Stream`
//! - `query_snapshot.rs`, `document_snapshot.rs` → read-only results
//! - `field_value.rs`, `timestamp.rs` → record ↔ document data

pub mod collection_reference;
pub mod document_reference;
pub mod document_snapshot;
pub mod field_value;
#[allow(clippy::module_inception)]
pub mod firestore;
pub mod listener;
pub mod query;
pub mod query_snapshot;
pub mod snapshot_stream;
pub mod timestamp;

pub use collection_reference::{add_doc, CollectionReference};
pub use document_reference::{delete_doc, update_doc, DocumentReference};
pub use document_snapshot::QueryDocumentSnapshot;
pub use field_value::{server_timestamp, DocumentData, FieldValue};
pub use firestore::{collection, doc, get_firestore, DocumentParent, Firestore};
pub use listener::{on_snapshot, ListenerRegistration, SnapshotErrorHandler};
pub use query::{order_by, query, Direction, Query, QueryConstraint};
pub use query_snapshot::QuerySnapshot;
pub use snapshot_stream::QuerySnapshotStream;
pub use timestamp::Timestamp;
