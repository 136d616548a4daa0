//! Node/edge subsets over the graph store.
//!
//! A [`Subgraph`] is the working unit of every analysis: a pair of node and edge
//! sets addressing elements of a [`GraphStore`](crate::graph::GraphStore). It owns
//! no payload, so building, copying, and set-algebra over subgraphs is cheap.
//!
//! Endpoints of a member edge are usually members of the node set too, but this is
//! not enforced; callers may carry edge sets whose endpoints form a superset of the
//! node set and induce the nodes lazily.

use std::collections::BTreeSet;

use crate::graph::{EdgeId, GraphStore, NodeId};

/// A subset of a store's nodes and edges.
///
/// Both sets iterate in ascending identifier order, which makes traversals over a
/// subgraph deterministic regardless of insertion order.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::{GraphStore, Subgraph};
///
/// let mut store = GraphStore::new();
/// let a = store.create_node();
/// let b = store.create_node();
/// let e = store.create_edge(a, b);
///
/// let mut graph = Subgraph::new();
/// graph.insert_node(a);
/// graph.insert_node(b);
/// graph.insert_edge(e);
///
/// assert_eq!(graph.roots(&store), vec![a]);
/// assert_eq!(graph.leaves(&store), vec![b]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subgraph {
    nodes: BTreeSet<NodeId>,
    edges: BTreeSet<EdgeId>,
}

impl Subgraph {
    /// Creates an empty subgraph.
    #[must_use]
    pub fn new() -> Self {
        Subgraph {
            nodes: BTreeSet::new(),
            edges: BTreeSet::new(),
        }
    }

    /// Creates a subgraph from explicit node and edge sets.
    #[must_use]
    pub fn from_parts(nodes: BTreeSet<NodeId>, edges: BTreeSet<EdgeId>) -> Self {
        Subgraph { nodes, edges }
    }

    /// Adds a node to the subgraph. Returns `true` if it was not already present.
    pub fn insert_node(&mut self, node: NodeId) -> bool {
        self.nodes.insert(node)
    }

    /// Adds an edge to the subgraph. Returns `true` if it was not already present.
    pub fn insert_edge(&mut self, edge: EdgeId) -> bool {
        self.edges.insert(edge)
    }

    /// Checks node membership.
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Checks edge membership.
    #[must_use]
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.edges.contains(&edge)
    }

    /// Returns the number of member nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of member edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// `true` if the subgraph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over member nodes in ascending identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Iterates over member edges in ascending identifier order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().copied()
    }

    /// Returns the member nodes carrying the given tag.
    #[must_use]
    pub fn nodes_tagged(&self, store: &GraphStore, tag: &str) -> Vec<NodeId> {
        self.nodes()
            .filter(|&n| store.node_has_tag(n, tag))
            .collect()
    }

    /// Returns the member edges carrying the given tag.
    #[must_use]
    pub fn edges_tagged(&self, store: &GraphStore, tag: &str) -> Vec<EdgeId> {
        self.edges()
            .filter(|&e| store.edge_has_tag(e, tag))
            .collect()
    }

    /// Returns the member nodes with no incoming member edge from another node.
    ///
    /// Self-loops do not disqualify a node.
    #[must_use]
    pub fn roots(&self, store: &GraphStore) -> Vec<NodeId> {
        self.nodes()
            .filter(|&n| {
                !self
                    .edges
                    .iter()
                    .any(|&e| store.edge_target(e) == n && store.edge_source(e) != n)
            })
            .collect()
    }

    /// Returns the member nodes with no outgoing member edge to another node.
    ///
    /// Self-loops do not disqualify a node.
    #[must_use]
    pub fn leaves(&self, store: &GraphStore) -> Vec<NodeId> {
        self.nodes()
            .filter(|&n| {
                !self
                    .edges
                    .iter()
                    .any(|&e| store.edge_source(e) == n && store.edge_target(e) != n)
            })
            .collect()
    }

    /// Returns the member edges leaving `node`, in ascending identifier order.
    #[must_use]
    pub fn outgoing_edges(&self, store: &GraphStore, node: NodeId) -> Vec<EdgeId> {
        self.edges()
            .filter(|&e| store.edge_source(e) == node)
            .collect()
    }

    /// Returns the member edges entering `node`, in ascending identifier order.
    #[must_use]
    pub fn incoming_edges(&self, store: &GraphStore, node: NodeId) -> Vec<EdgeId> {
        self.edges()
            .filter(|&e| store.edge_target(e) == node)
            .collect()
    }

    /// Returns the distinct targets of member edges leaving `node`.
    #[must_use]
    pub fn successors(&self, store: &GraphStore, node: NodeId) -> Vec<NodeId> {
        let mut seen = BTreeSet::new();
        self.outgoing_edges(store, node)
            .into_iter()
            .map(|e| store.edge_target(e))
            .filter(|&n| seen.insert(n))
            .collect()
    }

    /// Returns the distinct sources of member edges entering `node`.
    #[must_use]
    pub fn predecessors(&self, store: &GraphStore, node: NodeId) -> Vec<NodeId> {
        let mut seen = BTreeSet::new();
        self.incoming_edges(store, node)
            .into_iter()
            .map(|e| store.edge_source(e))
            .filter(|&n| seen.insert(n))
            .collect()
    }

    /// Returns a copy of this subgraph with the given edges removed.
    ///
    /// The node set is unchanged; removing edges can only add roots and leaves.
    #[must_use]
    pub fn without_edges(&self, removed: &BTreeSet<EdgeId>) -> Subgraph {
        Subgraph {
            nodes: self.nodes.clone(),
            edges: self.edges.difference(removed).copied().collect(),
        }
    }

    /// Returns the union of two subgraphs.
    #[must_use]
    pub fn union(&self, other: &Subgraph) -> Subgraph {
        Subgraph {
            nodes: self.nodes.union(&other.nodes).copied().collect(),
            edges: self.edges.union(&other.edges).copied().collect(),
        }
    }
}
