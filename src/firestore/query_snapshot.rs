//! Query snapshot type

use super::document_snapshot::QueryDocumentSnapshot;
use crate::pocketbase::Record;

/// Point-in-time view of a collection's records
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    docs: Vec<QueryDocumentSnapshot>,
}

impl QuerySnapshot {
    pub(crate) fn from_records(records: Vec<Record>) -> Self {
        Self {
            docs: records.into_iter().map(QueryDocumentSnapshot::new).collect(),
        }
    }

    /// All documents, in server order
    pub fn docs(&self) -> &[QueryDocumentSnapshot] {
        &self.docs
    }

    /// Check if the query result is empty
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Get the number of documents in the snapshot
    pub fn size(&self) -> usize {
        self.docs.len()
    }

    /// Same as [`QuerySnapshot::size`]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Call `f` for every document
    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&QueryDocumentSnapshot),
    {
        self.docs.iter().for_each(f)
    }

    /// Iterate over the documents
    pub fn iter(&self) -> std::slice::Iter<'_, QueryDocumentSnapshot> {
        self.docs.iter()
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = QueryDocumentSnapshot;
    type IntoIter = std::vec::IntoIter<QueryDocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.into_iter()
    }
}

impl<'a> IntoIterator for &'a QuerySnapshot {
    type Item = &'a QueryDocumentSnapshot;
    type IntoIter = std::slice::Iter<'a, QueryDocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}
