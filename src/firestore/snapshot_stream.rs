//! Snapshot listener as an async stream
//!
//! [`QuerySnapshotStream`] owns a [`ListenerRegistration`], so dropping the
//! stream removes the listener.
//!
//! # Example
//! ```no_run
//! use firebase_pocketbase::{initialize_app, AppConfig, Firestore};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Firestore::get_firestore(&initialize_app(AppConfig::new()));
//! let mut stream = db.collection("todos")?.snapshots();
//!
//! while let Some(result) = stream.next().await {
//!     match result {
//!         Ok(snapshot) => println!("{} documents", snapshot.size()),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! // Stream automatically cleaned up on drop
//! # Ok(())
//! # }
//! ```

use super::listener::{spawn_query_listener, ListenerRegistration};
use super::query::Query;
use super::query_snapshot::QuerySnapshot;
use crate::error::FirebaseError;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// A stream of query snapshot updates
///
/// Setup failures arrive as `Err` items. Dropped realtime connections are
/// re-opened underneath, so the stream only ends with the client.
pub struct QuerySnapshotStream {
    receiver: UnboundedReceiverStream<Result<QuerySnapshot, FirebaseError>>,
    _registration: ListenerRegistration,
}

impl QuerySnapshotStream {
    pub(crate) fn listen(query: &Query) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let error_tx = tx.clone();

        let registration = spawn_query_listener(
            query,
            move |snapshot| {
                let _ = tx.send(Ok(snapshot));
            },
            Some(Box::new(move |err| {
                let _ = error_tx.send(Err(err));
            })),
        );

        Self {
            receiver: UnboundedReceiverStream::new(rx),
            _registration: registration,
        }
    }
}

impl Stream for QuerySnapshotStream {
    type Item = Result<QuerySnapshot, FirebaseError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for QuerySnapshotStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySnapshotStream").finish_non_exhaustive()
    }
}
