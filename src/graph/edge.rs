//! Edge identifier implementation for the graph store.
//!
//! This module provides the [`EdgeId`] type, the edge counterpart to
//! [`NodeId`](crate::graph::NodeId). Because the store is a directed multigraph,
//! several edges may share the same `(from, to)` endpoints; the `EdgeId` is what
//! distinguishes them.

use std::fmt;

/// A strongly-typed identifier for edges within a graph store.
///
/// `EdgeId` wraps a `usize` arena index. Like node identity, edge identity is the
/// index itself, so parallel edges between the same endpoints remain distinct.
/// Edge IDs are assigned sequentially starting from 0 when edges are created.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::{GraphStore, EdgeId};
///
/// let mut store = GraphStore::new();
/// let a = store.create_node();
/// let b = store.create_node();
///
/// // Multi-edges are permitted; each gets its own identity.
/// let e1: EdgeId = store.create_edge(a, b);
/// let e2: EdgeId = store.create_edge(a, b);
/// assert_ne!(e1, e2);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    /// Creates a new `EdgeId` from a raw index value.
    ///
    /// This constructor is primarily intended for internal use and testing.
    /// Normal usage should obtain `EdgeId` values from
    /// [`GraphStore::create_edge`](crate::graph::GraphStore::create_edge).
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        EdgeId(index)
    }

    /// Returns the raw index value of this edge identifier.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<usize> for EdgeId {
    /// Converts a raw `usize` index into an `EdgeId`.
    #[inline]
    fn from(index: usize) -> Self {
        EdgeId(index)
    }
}

impl From<EdgeId> for usize {
    /// Extracts the raw index from an `EdgeId`.
    #[inline]
    fn from(edge: EdgeId) -> Self {
        edge.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_edge_id_new_and_index() {
        let edge = EdgeId::new(7);
        assert_eq!(edge.index(), 7);
    }

    #[test]
    fn test_edge_id_equality_and_hash() {
        let mut set: HashSet<EdgeId> = HashSet::new();
        set.insert(EdgeId::new(0));
        set.insert(EdgeId::new(1));
        set.insert(EdgeId::new(0));

        assert_eq!(set.len(), 2);
        assert_eq!(EdgeId::new(1), EdgeId::new(1));
    }

    #[test]
    fn test_edge_id_ordering() {
        let mut edges = vec![EdgeId::new(3), EdgeId::new(1), EdgeId::new(2)];
        edges.sort();
        assert_eq!(edges, vec![EdgeId::new(1), EdgeId::new(2), EdgeId::new(3)]);
    }

    #[test]
    fn test_edge_id_conversions() {
        let edge: EdgeId = 55usize.into();
        assert_eq!(edge.index(), 55);

        let value: usize = EdgeId::new(9).into();
        assert_eq!(value, 9);
    }

    #[test]
    fn test_edge_id_formatting() {
        let edge = EdgeId::new(3);
        assert_eq!(format!("{edge:?}"), "EdgeId(3)");
        assert_eq!(format!("{edge}"), "e3");
    }
}
