//! Normalization of a CFG to a single entry and a single exit.
//!
//! Dominance and loop classification require a graph with exactly one entry and
//! one exit. Real CFGs frequently have several exit statements (multiple returns,
//! throws) and occasionally several roots, so this module wraps an arbitrary
//! function graph into a [`UniqueEntryExitGraph`]:
//!
//! - A unique natural root/exit is used directly.
//! - Zero or multiple roots/exits are replaced by a synthesized super node
//!   (named `⊤` for the entry, `⊥` for the exit) connected to all natural
//!   roots/exits via [`tags::ENTRY_EXIT_EDGE`] marker edges.
//!
//! Synthesis is idempotent: super nodes are keyed by the owning function and
//! marker edges are created through the store's find-or-create primitive, so
//! wrapping the same function twice reuses the earlier elements.
//!
//! Interprocedural graphs produced by [`Icfg`](crate::analysis::Icfg) span
//! several functions and are wrapped through
//! [`UniqueEntryExitGraph::interprocedural`], which keys the super nodes by the
//! graph's root function.
//!
//! Dependent algorithms observe adjacency only through this wrapper, which
//! guarantees they see the normalized structure rather than the raw store.

use std::collections::HashMap;

use crate::{
    graph::{tags, EdgeId, GraphStore, NodeId, Subgraph},
    Result,
};

/// A CFG view with exactly one entry node and exactly one exit node.
///
/// Construction validates the input and performs any necessary super-node
/// synthesis against the store; afterwards the wrapper is self-contained and
/// answers all adjacency queries from its own precomputed edge set.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::{GraphStore, UniqueEntryExitGraph};
///
/// # fn demo(store: &mut GraphStore, function: flowscope::NodeId) -> flowscope::Result<()> {
/// let cfg = store.function_cfg(function);
/// let wrapped = UniqueEntryExitGraph::new(store, &cfg, false)?;
///
/// for succ in wrapped.successors(wrapped.entry()) {
///     println!("entry -> {succ}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UniqueEntryExitGraph {
    /// The function the wrapped graph is keyed by
    function: NodeId,
    /// The unique entry node (natural or synthesized)
    entry: NodeId,
    /// The unique exit node (natural or synthesized)
    exit: NodeId,
    /// Whether `entry` was synthesized rather than a natural root
    synthesized_entry: bool,
    /// Whether `exit` was synthesized rather than a natural exit
    synthesized_exit: bool,
    /// The wrapped node and edge sets
    graph: Subgraph,
    /// Outgoing adjacency over the wrapped edge set
    out_edges: HashMap<NodeId, Vec<(EdgeId, NodeId)>>,
    /// Incoming adjacency over the wrapped edge set
    in_edges: HashMap<NodeId, Vec<(EdgeId, NodeId)>>,
}

impl UniqueEntryExitGraph {
    /// Wraps a function CFG, deriving the natural roots and exits from the
    /// [`tags::CONTROL_FLOW_ROOT`] and [`tags::CONTROL_FLOW_EXIT`] tags.
    ///
    /// # Arguments
    ///
    /// * `store` - The graph store; mutated if super nodes or marker edges must
    ///   be synthesized
    /// * `graph` - The CFG to wrap
    /// * `relax` - Permit empty root/exit sets (the super nodes are then
    ///   disconnected on that side)
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if the
    /// graph is empty, is not wholly owned by a single function, or has no
    /// roots/exits while `relax` is unset.
    pub fn new(store: &mut GraphStore, graph: &Subgraph, relax: bool) -> Result<Self> {
        let roots = graph.nodes_tagged(store, tags::CONTROL_FLOW_ROOT);
        let exits = graph.nodes_tagged(store, tags::CONTROL_FLOW_EXIT);
        Self::with_roots(store, graph, &roots, &exits, relax)
    }

    /// Wraps a function CFG with caller-supplied root and exit candidates.
    ///
    /// Candidates outside the graph's node set are ignored.
    ///
    /// # Errors
    ///
    /// Same conditions as [`UniqueEntryExitGraph::new`].
    pub fn with_roots(
        store: &mut GraphStore,
        graph: &Subgraph,
        roots: &[NodeId],
        exits: &[NodeId],
        relax: bool,
    ) -> Result<Self> {
        if graph.is_empty() {
            return Err(crate::Error::InvalidArgument(
                "cannot wrap an empty graph".to_string(),
            ));
        }

        let functions = store.containing_functions(graph.nodes());
        if functions.len() != 1 {
            return Err(crate::Error::InvalidArgument(format!(
                "graph must be owned by exactly one function, found {}",
                functions.len()
            )));
        }
        let function = *functions
            .iter()
            .next()
            .ok_or_else(|| crate::Error::InvalidArgument("graph has no owner".to_string()))?;

        Self::build(store, graph, roots, exits, relax, function)
    }

    /// Wraps an interprocedural CFG spanning several functions.
    ///
    /// A synthesized ICFG is entered and left through its root function, so the
    /// natural roots and exits are the [`tags::CONTROL_FLOW_ROOT`] and
    /// [`tags::CONTROL_FLOW_EXIT`] nodes owned by `function`; spliced callee
    /// roots and exits do not count. Master nodes are keyed by `function`, so
    /// re-wrapping the same ICFG, or the root function's plain CFG, reuses
    /// them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if the
    /// graph is empty, if `function` owns none of its nodes, or if the derived
    /// root/exit sets are empty while `relax` is unset.
    pub fn interprocedural(
        store: &mut GraphStore,
        graph: &Subgraph,
        function: NodeId,
        relax: bool,
    ) -> Result<Self> {
        if graph.is_empty() {
            return Err(crate::Error::InvalidArgument(
                "cannot wrap an empty graph".to_string(),
            ));
        }
        if !store
            .containing_functions(graph.nodes())
            .contains(&function)
        {
            return Err(crate::Error::InvalidArgument(format!(
                "function {function} owns no node of the graph"
            )));
        }

        let roots: Vec<NodeId> = graph
            .nodes_tagged(store, tags::CONTROL_FLOW_ROOT)
            .into_iter()
            .filter(|&n| store.owner(n) == Some(function))
            .collect();
        let exits: Vec<NodeId> = graph
            .nodes_tagged(store, tags::CONTROL_FLOW_EXIT)
            .into_iter()
            .filter(|&n| store.owner(n) == Some(function))
            .collect();

        Self::build(store, graph, &roots, &exits, relax, function)
    }

    /// Shared construction once the keying function is known.
    fn build(
        store: &mut GraphStore,
        graph: &Subgraph,
        roots: &[NodeId],
        exits: &[NodeId],
        relax: bool,
        function: NodeId,
    ) -> Result<Self> {
        let roots: Vec<NodeId> = roots
            .iter()
            .copied()
            .filter(|&n| graph.contains_node(n))
            .collect();
        let exits: Vec<NodeId> = exits
            .iter()
            .copied()
            .filter(|&n| graph.contains_node(n))
            .collect();

        if roots.is_empty() && !relax {
            return Err(crate::Error::InvalidArgument(
                "graph has no control flow roots".to_string(),
            ));
        }
        if exits.is_empty() && !relax {
            return Err(crate::Error::InvalidArgument(
                "graph has no control flow exits".to_string(),
            ));
        }

        let mut wrapped = graph.clone();

        let (entry, synthesized_entry) = if roots.len() == 1 {
            (roots[0], false)
        } else {
            let master = Self::master_node(
                store,
                function,
                tags::MASTER_ENTRY,
                tags::MASTER_ENTRY_NAME,
            );
            wrapped.insert_node(master);
            for root in &roots {
                let edge = store.find_or_create_tagged_edge(tags::ENTRY_EXIT_EDGE, master, *root);
                wrapped.insert_edge(edge);
            }
            (master, true)
        };

        let (exit, synthesized_exit) = if exits.len() == 1 {
            (exits[0], false)
        } else {
            let master =
                Self::master_node(store, function, tags::MASTER_EXIT, tags::MASTER_EXIT_NAME);
            wrapped.insert_node(master);
            for exit_node in &exits {
                let edge =
                    store.find_or_create_tagged_edge(tags::ENTRY_EXIT_EDGE, *exit_node, master);
                wrapped.insert_edge(edge);
            }
            (master, true)
        };

        let mut out_edges: HashMap<NodeId, Vec<(EdgeId, NodeId)>> = HashMap::new();
        let mut in_edges: HashMap<NodeId, Vec<(EdgeId, NodeId)>> = HashMap::new();
        for node in wrapped.nodes() {
            out_edges.entry(node).or_default();
            in_edges.entry(node).or_default();
        }
        for edge in wrapped.edges() {
            let (from, to) = store.edge_endpoints(edge);
            out_edges.entry(from).or_default().push((edge, to));
            in_edges.entry(to).or_default().push((edge, from));
        }

        Ok(UniqueEntryExitGraph {
            function,
            entry,
            exit,
            synthesized_entry,
            synthesized_exit,
            graph: wrapped,
            out_edges,
            in_edges,
        })
    }

    /// Finds or creates the per-function super node carrying `tag`.
    fn master_node(store: &mut GraphStore, function: NodeId, tag: &str, name: &str) -> NodeId {
        if let Some(existing) = store.node_tagged_owned_by(tag, function) {
            return existing;
        }
        let master = store.create_node();
        store.tag_node(master, tag);
        store.set_node_attr(master, tags::NAME, name);
        store.set_owner(master, function);
        master
    }

    /// Returns the function the wrapped graph is keyed by: the owning function
    /// of a plain CFG, or the root function of an interprocedural graph.
    #[must_use]
    #[inline]
    pub fn function(&self) -> NodeId {
        self.function
    }

    /// Returns the unique entry node.
    #[must_use]
    #[inline]
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// Returns the unique exit node.
    #[must_use]
    #[inline]
    pub fn exit(&self) -> NodeId {
        self.exit
    }

    /// `true` if the entry node was synthesized rather than a natural root.
    #[must_use]
    #[inline]
    pub fn synthesized_entry(&self) -> bool {
        self.synthesized_entry
    }

    /// `true` if the exit node was synthesized rather than a natural exit.
    #[must_use]
    #[inline]
    pub fn synthesized_exit(&self) -> bool {
        self.synthesized_exit
    }

    /// Returns the wrapped node and edge sets.
    #[must_use]
    pub fn graph(&self) -> &Subgraph {
        &self.graph
    }

    /// Iterates over the wrapped node set in ascending identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.nodes()
    }

    /// Returns the number of wrapped nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Checks membership in the wrapped node set.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.graph.contains_node(node)
    }

    /// Returns the outgoing `(edge, target)` pairs of a member node, answered
    /// from the wrapped edge set only.
    #[must_use]
    pub fn out_edges(&self, node: NodeId) -> &[(EdgeId, NodeId)] {
        self.out_edges.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Returns the incoming `(edge, source)` pairs of a member node, answered
    /// from the wrapped edge set only.
    #[must_use]
    pub fn in_edges(&self, node: NodeId) -> &[(EdgeId, NodeId)] {
        self.in_edges.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Returns the distinct successors of a member node.
    #[must_use]
    pub fn successors(&self, node: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        for &(_, to) in self.out_edges(node) {
            if !result.contains(&to) {
                result.push(to);
            }
        }
        result
    }

    /// Returns the distinct predecessors of a member node.
    #[must_use]
    pub fn predecessors(&self, node: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        for &(_, from) in self.in_edges(node) {
            if !result.contains(&from) {
                result.push(from);
            }
        }
        result
    }
}
