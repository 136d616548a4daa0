//! Arena-backed storage for the tagged directed multigraph.
//!
//! The [`GraphStore`] plays the role of the surrounding program-graph platform:
//! it owns every node and edge, their tag sets, and their key/value attributes.
//! Analyses address elements exclusively through [`NodeId`]/[`EdgeId`] indices,
//! which keeps identity comparison O(1) and sidesteps pointer-graph ownership.
//!
//! Two properties matter to the algorithm layer:
//!
//! - The store is a **multigraph**: parallel edges and self-loops are legal, and
//!   nothing ever merges them.
//! - Result insertion is **idempotent** via [`GraphStore::find_or_create_tagged_edge`]:
//!   re-running an analysis finds the edges it wrote last time instead of
//!   duplicating them.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::graph::{tags, EdgeId, NodeId, Subgraph};

/// Per-node payload: tag set, attributes, adjacency, and owning function.
#[derive(Debug, Clone, Default)]
struct NodeData {
    tags: HashSet<String>,
    attrs: HashMap<String, String>,
    out_edges: Vec<EdgeId>,
    in_edges: Vec<EdgeId>,
    owner: Option<NodeId>,
}

/// Per-edge payload: endpoints, tag set, and attributes.
#[derive(Debug, Clone)]
struct EdgeData {
    from: NodeId,
    to: NodeId,
    tags: HashSet<String>,
    attrs: HashMap<String, String>,
}

/// A directed multigraph with string tags and key/value attributes on every element.
///
/// Nodes and edges live in arenas and are addressed by [`NodeId`] and [`EdgeId`].
/// Creation is append-only; elements are never removed, so every identifier handed
/// out stays valid for the lifetime of the store.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::{graph::tags, GraphStore};
///
/// let mut store = GraphStore::new();
/// let entry = store.create_node();
/// let exit = store.create_node();
/// let edge = store.create_edge(entry, exit);
///
/// store.tag_node(entry, tags::CONTROL_FLOW_ROOT);
/// store.tag_edge(edge, tags::CONTROL_FLOW_EDGE);
///
/// assert!(store.node_has_tag(entry, tags::CONTROL_FLOW_ROOT));
/// assert_eq!(store.edge_endpoints(edge), (entry, exit));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<NodeData>,
    edges: Vec<EdgeData>,
}

impl GraphStore {
    /// Creates an empty graph store.
    #[must_use]
    pub fn new() -> Self {
        GraphStore {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Returns the number of nodes in the store.
    #[must_use]
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges in the store.
    #[must_use]
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Creates a new node with no tags, attributes, or owner.
    ///
    /// # Returns
    ///
    /// The identifier of the freshly created node.
    pub fn create_node(&mut self) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData::default());
        id
    }

    /// Creates a new directed edge from `from` to `to`.
    ///
    /// Parallel edges and self-loops are permitted; every call creates a distinct
    /// edge identity.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint is not a node of this store.
    pub fn create_edge(&mut self, from: NodeId, to: NodeId) -> EdgeId {
        assert!(from.index() < self.nodes.len(), "invalid source node");
        assert!(to.index() < self.nodes.len(), "invalid target node");

        let id = EdgeId::new(self.edges.len());
        self.edges.push(EdgeData {
            from,
            to,
            tags: HashSet::new(),
            attrs: HashMap::new(),
        });
        self.nodes[from.index()].out_edges.push(id);
        self.nodes[to.index()].in_edges.push(id);
        id
    }

    /// Adds a tag to a node. Adding a tag twice is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the node is not part of this store.
    pub fn tag_node(&mut self, node: NodeId, tag: &str) {
        self.nodes[node.index()].tags.insert(tag.to_string());
    }

    /// Checks whether a node carries the given tag.
    ///
    /// # Panics
    ///
    /// Panics if the node is not part of this store.
    #[must_use]
    pub fn node_has_tag(&self, node: NodeId, tag: &str) -> bool {
        self.nodes[node.index()].tags.contains(tag)
    }

    /// Adds a tag to an edge. Adding a tag twice is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the edge is not part of this store.
    pub fn tag_edge(&mut self, edge: EdgeId, tag: &str) {
        self.edges[edge.index()].tags.insert(tag.to_string());
    }

    /// Checks whether an edge carries the given tag.
    ///
    /// # Panics
    ///
    /// Panics if the edge is not part of this store.
    #[must_use]
    pub fn edge_has_tag(&self, edge: EdgeId, tag: &str) -> bool {
        self.edges[edge.index()].tags.contains(tag)
    }

    /// Sets a key/value attribute on a node, replacing any previous value.
    ///
    /// # Panics
    ///
    /// Panics if the node is not part of this store.
    pub fn set_node_attr(&mut self, node: NodeId, key: &str, value: &str) {
        self.nodes[node.index()]
            .attrs
            .insert(key.to_string(), value.to_string());
    }

    /// Reads a node attribute, or `None` if the key is absent.
    ///
    /// # Panics
    ///
    /// Panics if the node is not part of this store.
    #[must_use]
    pub fn node_attr(&self, node: NodeId, key: &str) -> Option<&str> {
        self.nodes[node.index()].attrs.get(key).map(String::as_str)
    }

    /// Sets a key/value attribute on an edge, replacing any previous value.
    ///
    /// # Panics
    ///
    /// Panics if the edge is not part of this store.
    pub fn set_edge_attr(&mut self, edge: EdgeId, key: &str, value: &str) {
        self.edges[edge.index()]
            .attrs
            .insert(key.to_string(), value.to_string());
    }

    /// Reads an edge attribute, or `None` if the key is absent.
    ///
    /// # Panics
    ///
    /// Panics if the edge is not part of this store.
    #[must_use]
    pub fn edge_attr(&self, edge: EdgeId, key: &str) -> Option<&str> {
        self.edges[edge.index()].attrs.get(key).map(String::as_str)
    }

    /// Returns the source node of an edge.
    ///
    /// # Panics
    ///
    /// Panics if the edge is not part of this store.
    #[must_use]
    #[inline]
    pub fn edge_source(&self, edge: EdgeId) -> NodeId {
        self.edges[edge.index()].from
    }

    /// Returns the target node of an edge.
    ///
    /// # Panics
    ///
    /// Panics if the edge is not part of this store.
    #[must_use]
    #[inline]
    pub fn edge_target(&self, edge: EdgeId) -> NodeId {
        self.edges[edge.index()].to
    }

    /// Returns the `(source, target)` pair of an edge.
    ///
    /// # Panics
    ///
    /// Panics if the edge is not part of this store.
    #[must_use]
    #[inline]
    pub fn edge_endpoints(&self, edge: EdgeId) -> (NodeId, NodeId) {
        let data = &self.edges[edge.index()];
        (data.from, data.to)
    }

    /// Iterates over all node identifiers in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// Iterates over all edge identifiers in creation order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// Returns all nodes carrying the given tag, in creation order.
    #[must_use]
    pub fn nodes_tagged(&self, tag: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, data)| data.tags.contains(tag))
            .map(|(i, _)| NodeId::new(i))
            .collect()
    }

    /// Returns all edges carrying the given tag, in creation order.
    #[must_use]
    pub fn edges_tagged(&self, tag: &str) -> Vec<EdgeId> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, data)| data.tags.contains(tag))
            .map(|(i, _)| EdgeId::new(i))
            .collect()
    }

    /// Returns the edges leaving a node, in creation order.
    ///
    /// # Panics
    ///
    /// Panics if the node is not part of this store.
    #[must_use]
    pub fn outgoing_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.nodes[node.index()].out_edges
    }

    /// Returns the edges entering a node, in creation order.
    ///
    /// # Panics
    ///
    /// Panics if the node is not part of this store.
    #[must_use]
    pub fn incoming_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.nodes[node.index()].in_edges
    }

    /// Iterates over the targets of a node's outgoing edges.
    ///
    /// Parallel edges yield their target once per edge.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node.index()]
            .out_edges
            .iter()
            .map(|e| self.edges[e.index()].to)
    }

    /// Iterates over the sources of a node's incoming edges.
    ///
    /// Parallel edges yield their source once per edge.
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node.index()]
            .in_edges
            .iter()
            .map(|e| self.edges[e.index()].from)
    }

    /// Records the function node that owns `node`.
    ///
    /// # Panics
    ///
    /// Panics if either node is not part of this store.
    pub fn set_owner(&mut self, node: NodeId, function: NodeId) {
        assert!(function.index() < self.nodes.len(), "invalid owner node");
        self.nodes[node.index()].owner = Some(function);
    }

    /// Returns the function node that owns `node`, if recorded.
    ///
    /// # Panics
    ///
    /// Panics if the node is not part of this store.
    #[must_use]
    pub fn owner(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].owner
    }

    /// Collects the owning functions of a node set.
    ///
    /// Nodes without a recorded owner contribute nothing. The result is sorted
    /// by node identity.
    pub fn containing_functions(&self, nodes: impl IntoIterator<Item = NodeId>) -> BTreeSet<NodeId> {
        nodes
            .into_iter()
            .filter_map(|n| self.nodes[n.index()].owner)
            .collect()
    }

    /// Builds the control-flow graph of a function as a [`Subgraph`].
    ///
    /// The node set is every [`tags::CONTROL_FLOW_NODE`] owned by `function`; the
    /// edge set is every [`tags::CONTROL_FLOW_EDGE`] whose endpoints both lie in
    /// that node set. Synthesized master entry/exit nodes are not control-flow
    /// nodes and therefore never appear in the result.
    ///
    /// # Arguments
    ///
    /// * `function` - A node tagged [`tags::FUNCTION`]
    #[must_use]
    pub fn function_cfg(&self, function: NodeId) -> Subgraph {
        let mut graph = Subgraph::new();
        for node in self.nodes() {
            if self.nodes[node.index()].owner == Some(function)
                && self.node_has_tag(node, tags::CONTROL_FLOW_NODE)
            {
                graph.insert_node(node);
            }
        }
        for edge in self.edges() {
            if self.edge_has_tag(edge, tags::CONTROL_FLOW_EDGE) {
                let (from, to) = self.edge_endpoints(edge);
                if graph.contains_node(from) && graph.contains_node(to) {
                    graph.insert_edge(edge);
                }
            }
        }
        graph
    }

    /// Finds a node carrying `tag` whose owner is `owner`.
    ///
    /// Used to locate previously synthesized per-function nodes (master entry and
    /// exit) so that repeated construction reuses them. Returns the first match
    /// in creation order.
    #[must_use]
    pub fn node_tagged_owned_by(&self, tag: &str, owner: NodeId) -> Option<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .find(|(_, data)| data.owner == Some(owner) && data.tags.contains(tag))
            .map(|(i, _)| NodeId::new(i))
    }

    /// Finds an edge carrying `tag` between the given endpoints.
    ///
    /// Returns the first match in creation order among `from`'s outgoing edges.
    ///
    /// # Panics
    ///
    /// Panics if `from` is not a node of this store.
    #[must_use]
    pub fn find_tagged_edge(&self, tag: &str, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.nodes[from.index()]
            .out_edges
            .iter()
            .copied()
            .find(|e| {
                let data = &self.edges[e.index()];
                data.to == to && data.tags.contains(tag)
            })
    }

    /// Returns an edge carrying `tag` between the given endpoints, creating and
    /// tagging one if none exists.
    ///
    /// This is the idempotence primitive for result insertion: an analysis that
    /// writes its output through this method can be re-invoked on an unmutated
    /// graph without duplicating edges.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint is not a node of this store.
    pub fn find_or_create_tagged_edge(&mut self, tag: &str, from: NodeId, to: NodeId) -> EdgeId {
        if let Some(existing) = self.find_tagged_edge(tag, from, to) {
            return existing;
        }
        let edge = self.create_edge(from, to);
        self.tag_edge(edge, tag);
        edge
    }
}
