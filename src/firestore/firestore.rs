//! Firestore handle
//!
//! The database handle is the app handle under another name: every reference
//! built from it talks to the app's PocketBase client.

use super::collection_reference::CollectionReference;
use super::document_reference::DocumentReference;
use crate::app::App;
use crate::error::{FirebaseError, FirestoreError};
use crate::pocketbase::PocketBase;
use tracing::debug;

/// Firestore database handle
#[derive(Clone)]
pub struct Firestore {
    app: App,
}

impl Firestore {
    /// Get the database handle of `app`
    ///
    /// # Example
    /// ```
    /// use firebase_pocketbase::{initialize_app, AppConfig, Firestore};
    ///
    /// let app = initialize_app(AppConfig::new());
    /// let db = Firestore::get_firestore(&app);
    /// let todos = db.collection("todos").unwrap();
    /// assert_eq!(todos.id(), "todos");
    /// ```
    pub fn get_firestore(app: &App) -> Self {
        Firestore { app: app.clone() }
    }

    /// The app this handle belongs to
    pub fn app(&self) -> &App {
        &self.app
    }

    pub(crate) fn pocketbase(&self) -> &PocketBase {
        self.app.pocketbase()
    }

    /// Reference a collection by slash-separated path
    ///
    /// The last path segment names the PocketBase collection.
    pub fn collection(&self, path: impl AsRef<str>) -> Result<CollectionReference, FirebaseError> {
        CollectionReference::new(self.clone(), split_path([path.as_ref()]))
    }

    /// Reference a document by slash-separated path (at least two segments)
    pub fn doc(&self, path: impl AsRef<str>) -> Result<DocumentReference, FirebaseError> {
        document_from_path(self, split_path([path.as_ref()]))
    }
}

impl PartialEq for Firestore {
    fn eq(&self, other: &Self) -> bool {
        self.app.ptr_eq(&other.app)
    }
}

impl std::fmt::Debug for Firestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firestore")
            .field("base_url", &self.app.base_url())
            .finish()
    }
}

/// Split every segment on `/` and drop empty pieces
pub(crate) fn split_path<'a, I>(segments: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    segments
        .into_iter()
        .flat_map(|segment| segment.split('/'))
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// `.../{collection}/{id}`: collection is the second-to-last segment
fn document_from_path(db: &Firestore, segments: Vec<String>) -> Result<DocumentReference, FirebaseError> {
    let [.., collection, id] = segments.as_slice() else {
        return Err(FirestoreError::InvalidArgument(format!(
            "document path needs at least two segments, got {:?}",
            segments.join("/")
        ))
        .into());
    };
    Ok(DocumentReference::new(
        db.clone(),
        collection.clone(),
        id.clone(),
        segments.join("/"),
    ))
}

/// Anything a document reference can be built from: the database (flat
/// path) or a collection (one id)
pub trait DocumentParent {
    /// Build the document reference named by `path_segments`
    fn child_document(&self, path_segments: &[&str]) -> Result<DocumentReference, FirebaseError>;
}

impl DocumentParent for Firestore {
    fn child_document(&self, path_segments: &[&str]) -> Result<DocumentReference, FirebaseError> {
        document_from_path(self, split_path(path_segments.iter().copied()))
    }
}

impl DocumentParent for CollectionReference {
    fn child_document(&self, path_segments: &[&str]) -> Result<DocumentReference, FirebaseError> {
        let Some(id) = path_segments.first() else {
            return Err(FirestoreError::InvalidArgument("document id is required".to_string()).into());
        };
        self.doc(id)
    }
}

/// Get the database handle of `app`
pub fn get_firestore(app: &App) -> Firestore {
    Firestore::get_firestore(app)
}

/// Reference the collection named by the last of `path_segments`
///
/// Segments may themselves contain `/`.
pub fn collection(db: &Firestore, path_segments: &[&str]) -> Result<CollectionReference, FirebaseError> {
    debug!(path = ?path_segments, "collection");
    CollectionReference::new(db.clone(), split_path(path_segments.iter().copied()))
}

/// Reference a document
///
/// - `doc(&db, &["users", "u1", "todos", "t1"])`: collection `todos`, id `t1`
/// - `doc(&todos, &["t1"])`: collection of `todos`, id `t1`
pub fn doc<P>(parent: &P, path_segments: &[&str]) -> Result<DocumentReference, FirebaseError>
where
    P: DocumentParent + ?Sized,
{
    parent.child_document(path_segments)
}
