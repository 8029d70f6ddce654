//! Queries
//!
//! Constraints are accepted for source compatibility but not translated
//! into PocketBase filters or sort expressions: a query always reads the
//! whole collection, in server order.

use super::collection_reference::CollectionReference;
use tracing::debug;

/// A query is a collection reference; constraints do not narrow it
pub type Query = CollectionReference;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// `asc`
    #[default]
    Ascending,
    /// `desc`
    Descending,
}

impl Direction {
    /// SDK spelling: `asc` / `desc`
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

/// Query constraint
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueryConstraint {
    /// Order by a field
    OrderBy {
        /// Field path
        field: String,
        /// Sort direction
        direction: Direction,
    },
}

/// Build an ordering constraint (ignored by [`query`])
///
/// `None` sorts ascending:
/// ```
/// use firebase_pocketbase::firestore::{order_by, Direction};
///
/// assert_eq!(order_by("text", None), order_by("text", Direction::Ascending));
/// ```
pub fn order_by(field: impl Into<String>, direction: impl Into<Option<Direction>>) -> QueryConstraint {
    let field = field.into();
    let direction = direction.into().unwrap_or_default();
    debug!(field = %field, direction = direction.as_str(), "orderBy constraint is not applied");
    QueryConstraint::OrderBy { field, direction }
}

/// Build a query over `collection`
///
/// Returns the collection itself; `constraints` are ignored.
pub fn query(collection: &CollectionReference, constraints: &[QueryConstraint]) -> Query {
    if !constraints.is_empty() {
        debug!(
            collection = %collection.id(),
            ignored = constraints.len(),
            "query constraints are not applied"
        );
    }
    collection.clone()
}
