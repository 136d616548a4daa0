//! Node identifier implementation for the graph store.
//!
//! This module provides the [`NodeId`] type, a strongly-typed identifier for nodes
//! within a [`GraphStore`](crate::graph::GraphStore). The newtype wrapper provides
//! type safety and prevents accidental confusion between node indices, edge indices,
//! and other integer values.

use std::fmt;

/// A strongly-typed identifier for nodes within a graph store.
///
/// `NodeId` wraps a `usize` arena index. Node identity is the index itself: two
/// `NodeId`s compare equal exactly when they address the same arena slot, which
/// gives the O(1) reference-style identity comparison the analyses rely on. Node
/// IDs are assigned sequentially starting from 0 when nodes are created.
///
/// # Usage
///
/// Node IDs are created by [`GraphStore::create_node`](crate::graph::GraphStore::create_node)
/// and should not typically be constructed manually. They are used to:
///
/// - Reference nodes when creating edges
/// - Tag nodes and read/write node attributes
/// - Query adjacency relationships
/// - Store analysis results indexed by node
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::{GraphStore, NodeId};
///
/// let mut store = GraphStore::new();
/// let a: NodeId = store.create_node();
/// let b: NodeId = store.create_node();
///
/// assert_ne!(a, b);
///
/// // NodeIds can be used as keys in collections
/// use std::collections::HashMap;
/// let mut idom: HashMap<NodeId, NodeId> = HashMap::new();
/// idom.insert(b, a);
/// ```
///
/// # Thread Safety
///
/// `NodeId` is [`Copy`], [`Send`], and [`Sync`], enabling efficient passing between
/// threads and use in concurrent data structures.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a new `NodeId` from a raw index value.
    ///
    /// This constructor is primarily intended for internal use and testing.
    /// Normal usage should obtain `NodeId` values from
    /// [`GraphStore::create_node`](crate::graph::GraphStore::create_node).
    ///
    /// # Arguments
    ///
    /// * `index` - The raw node index (0-based)
    ///
    /// # Returns
    ///
    /// A new `NodeId` wrapping the provided index.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Returns the raw index value of this node identifier.
    ///
    /// The index is a 0-based position that can be used to index into vectors
    /// or arrays that store per-node data.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<usize> for NodeId {
    /// Converts a raw `usize` index into a `NodeId`.
    ///
    /// This conversion is provided for convenience but should be used carefully
    /// to avoid creating node IDs that don't correspond to actual nodes in a store.
    #[inline]
    fn from(index: usize) -> Self {
        NodeId(index)
    }
}

impl From<NodeId> for usize {
    /// Extracts the raw index from a `NodeId`.
    #[inline]
    fn from(node: NodeId) -> Self {
        node.0
    }
}
