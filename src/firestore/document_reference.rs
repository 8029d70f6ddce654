//! Firestore DocumentReference type

use super::field_value::to_record;
use super::firestore::Firestore;
use crate::error::FirebaseError;
use serde::Serialize;
use tracing::debug;

/// Reference to one record of a collection
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReference {
    firestore: Firestore,
    collection_name: String,
    id: String,
    path: String,
}

impl DocumentReference {
    pub(crate) fn new(firestore: Firestore, collection_name: String, id: String, path: String) -> Self {
        Self {
            firestore,
            collection_name,
            id,
            path,
        }
    }

    /// Get document ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the PocketBase collection holding the record
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Slash-joined path this reference was built from
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The database handle this reference belongs to
    pub fn firestore(&self) -> &Firestore {
        &self.firestore
    }

    /// Patch the record with the fields of `data`
    pub async fn update<T>(&self, data: &T) -> Result<(), FirebaseError>
    where
        T: Serialize + ?Sized,
    {
        let body = to_record(data)?;
        self.firestore
            .pocketbase()
            .collection(self.collection_name.as_str())
            .update(&self.id, &body)
            .await?;
        debug!(collection = %self.collection_name, id = %self.id, "updated document");
        Ok(())
    }

    /// Delete the record
    pub async fn delete(&self) -> Result<(), FirebaseError> {
        self.firestore
            .pocketbase()
            .collection(self.collection_name.as_str())
            .delete(&self.id)
            .await?;
        debug!(collection = %self.collection_name, id = %self.id, "deleted document");
        Ok(())
    }
}

/// Patch the document's record with `data`
pub async fn update_doc<T>(reference: &DocumentReference, data: &T) -> Result<(), FirebaseError>
where
    T: Serialize + ?Sized,
{
    reference.update(data).await
}

/// Delete the document's record
pub async fn delete_doc(reference: &DocumentReference) -> Result<(), FirebaseError> {
    reference.delete().await
}
