//! Firestore CollectionReference type

use super::document_reference::DocumentReference;
use super::field_value::to_record;
use super::firestore::Firestore;
use super::listener::{spawn_query_listener, ListenerRegistration, SnapshotErrorHandler};
use super::query_snapshot::QuerySnapshot;
use super::snapshot_stream::QuerySnapshotStream;
use crate::error::{FirebaseError, FirestoreError};
use crate::pocketbase::RecordService;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Reference to a collection
///
/// Holds every path segment it was built from; only the last one, the
/// collection name, reaches PocketBase.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReference {
    firestore: Firestore,
    segments: Vec<String>,
}

impl CollectionReference {
    pub(crate) fn new(firestore: Firestore, segments: Vec<String>) -> Result<Self, FirebaseError> {
        if segments.is_empty() {
            return Err(FirestoreError::InvalidArgument(
                "collection path needs at least one segment".to_string(),
            )
            .into());
        }
        Ok(Self { firestore, segments })
    }

    /// Collection name (last path segment)
    pub fn id(&self) -> &str {
        // `new` guarantees at least one segment
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// All path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Slash-joined path
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// The database handle this reference belongs to
    pub fn firestore(&self) -> &Firestore {
        &self.firestore
    }

    pub(crate) fn records(&self) -> RecordService {
        self.firestore.pocketbase().collection(self.id())
    }

    /// Get a document reference within this collection
    pub fn doc(&self, document_id: impl AsRef<str>) -> Result<DocumentReference, FirebaseError> {
        let id = document_id.as_ref();
        if id.is_empty() {
            return Err(FirestoreError::InvalidArgument("document id cannot be empty".to_string()).into());
        }
        Ok(DocumentReference::new(
            self.firestore.clone(),
            self.id().to_string(),
            id.to_string(),
            format!("{}/{}", self.path(), id),
        ))
    }

    /// Create a record from `data`; the server assigns the id
    pub async fn add<T>(&self, data: &T) -> Result<DocumentReference, FirebaseError>
    where
        T: Serialize + ?Sized,
    {
        let body = to_record(data)?;
        let record = self.records().create(&body).await?;

        let Some(id) = record.get("id").and_then(Value::as_str) else {
            return Err(FirebaseError::internal("created record has no id"));
        };
        debug!(collection = %self.id(), id = %id, "added document");
        self.doc(id)
    }

    /// Fetch every record of the collection once
    pub async fn get(&self) -> Result<QuerySnapshot, FirebaseError> {
        let records = self.records().get_full_list().await?;
        Ok(QuerySnapshot::from_records(records))
    }

    /// Listen to the collection
    ///
    /// See [`on_snapshot`](super::on_snapshot).
    pub fn on_snapshot<F>(
        &self,
        on_next: F,
        on_error: Option<SnapshotErrorHandler>,
    ) -> ListenerRegistration
    where
        F: Fn(QuerySnapshot) + Send + Sync + 'static,
    {
        spawn_query_listener(self, on_next, on_error)
    }

    /// Listen to the collection as a stream
    ///
    /// The first item is the initial fetch, then one item per change. A
    /// failed initial fetch is yielded as an error; later failures are only
    /// logged. Dropping the stream removes the listener.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use firebase_pocketbase::{initialize_app, AppConfig, Firestore};
    /// use futures::StreamExt;
    ///
    /// let db = Firestore::get_firestore(&initialize_app(AppConfig::new()));
    /// let mut stream = db.collection("todos")?.snapshots();
    /// while let Some(snapshot) = stream.next().await {
    ///     println!("{} todos", snapshot?.size());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn snapshots(&self) -> QuerySnapshotStream {
        QuerySnapshotStream::listen(self)
    }
}

/// Add a document to `collection`
pub async fn add_doc<T>(collection: &CollectionReference, data: &T) -> Result<DocumentReference, FirebaseError>
where
    T: Serialize + ?Sized,
{
    collection.add(data).await
}
