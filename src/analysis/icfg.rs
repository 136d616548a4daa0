//! Interprocedural control-flow graph synthesis.
//!
//! Rewrites a root function's CFG by splicing callee CFGs in at call sites:
//! the call site is connected to the callee's root, and the callee's leaves are
//! connected back to the call site's original successors. The direct edges the
//! splice bypasses are dropped from the result. Splicing recurses one level at
//! a time, so a spliced callee containing further call sites is expanded by a
//! nested synthesis of the same machinery.
//!
//! Each expanded call site is assigned a fresh correlation id; its call-out
//! edge and all of its return edges share a `CallID_<n>` tag so later analyses
//! can pair "calling out" with "returning from" for the same invocation.
//!
//! Recursive targets are never inlined: a strong-connectivity check over the
//! call graph excludes any call site whose target sits on a call cycle or can
//! call its way back to the function being synthesized. Such sites degrade
//! gracefully to their intraprocedural edges.
//!
//! All synthesis state, including the call-id counter, lives in a per-run
//! [`SynthesisContext`]; nothing is shared across top-level invocations except
//! the edges persisted in the store, which are found and reused rather than
//! duplicated on re-synthesis.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::{
    analysis::SccAnalysis,
    graph::{tags, EdgeId, GraphStore, NodeId, Subgraph},
    Result,
};

/// Expansion progress of a node during one function's synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Unvisited,
    Queued,
    Expanded,
}

/// Mutable state threaded through one top-level synthesis run.
///
/// Construct one per invocation; reusing a context across unrelated runs would
/// leak call-id assignments and expansion caches between them.
#[derive(Debug, Default)]
pub struct SynthesisContext {
    /// Monotonic per-call-site correlation counter
    next_call_id: u64,
    /// Functions currently being synthesized further up the stack
    in_progress: HashSet<NodeId>,
    /// Functions already fully expanded in this run
    expanded: HashMap<NodeId, Icfg>,
}

impl SynthesisContext {
    /// Creates a fresh context with the call-id counter at zero.
    #[must_use]
    pub fn new() -> Self {
        SynthesisContext::default()
    }

    fn next_call_id(&mut self) -> u64 {
        let id = self.next_call_id;
        self.next_call_id += 1;
        id
    }
}

/// A synthesized interprocedural CFG.
///
/// Holds the node and edge sets of the result plus the ordered list of
/// `(predecessor, successor)` pairs that were stitched during synthesis, in
/// splicing order.
///
/// # Examples
///
/// ```rust,ignore
/// use std::collections::BTreeSet;
/// use flowscope::{GraphStore, Icfg, NodeId};
///
/// # fn demo(store: &mut GraphStore, main: NodeId, expandables: &BTreeSet<NodeId>) -> flowscope::Result<()> {
/// let icfg = Icfg::synthesize(store, main, expandables)?;
/// println!("{} nodes, {} edges", icfg.graph().node_count(), icfg.graph().edge_count());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Icfg {
    graph: Subgraph,
    stitched: Vec<(NodeId, NodeId)>,
}

impl Icfg {
    /// Synthesizes the ICFG of `function`, inlining call sites whose single
    /// resolvable target is in `expandables`.
    ///
    /// A fresh [`SynthesisContext`] is created for the run. Re-invoking on an
    /// unmutated store yields an identical result and creates no new edges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if the
    /// function has an empty CFG or no unique control-flow root.
    pub fn synthesize(
        store: &mut GraphStore,
        function: NodeId,
        expandables: &BTreeSet<NodeId>,
    ) -> Result<Icfg> {
        let mut context = SynthesisContext::new();
        Self::synthesize_with(store, function, expandables, &mut context)
    }

    /// Synthesizes the ICFG of `function` inside an existing context.
    ///
    /// Used for nested expansion; top-level callers normally use
    /// [`Icfg::synthesize`].
    ///
    /// Expansion is gated on predecessors: a node is processed only after every
    /// one of its non-back-edge predecessors has been. A node with a
    /// predecessor that is unreachable from the root therefore never becomes
    /// ready; it still appears in the result as an edge target, but its own
    /// outgoing structure is dropped along with the unreachable region.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Icfg::synthesize`].
    pub fn synthesize_with(
        store: &mut GraphStore,
        function: NodeId,
        expandables: &BTreeSet<NodeId>,
        context: &mut SynthesisContext,
    ) -> Result<Icfg> {
        if let Some(cached) = context.expanded.get(&function) {
            return Ok(cached.clone());
        }

        let cfg = store.function_cfg(function);
        if cfg.is_empty() {
            return Err(crate::Error::InvalidArgument(format!(
                "function {function} has an empty control flow graph"
            )));
        }
        let back_edges: BTreeSet<EdgeId> = cfg
            .edges_tagged(store, tags::LOOP_BACK_EDGE)
            .into_iter()
            .collect();
        let dag = cfg.without_edges(&back_edges);

        let roots = dag.nodes_tagged(store, tags::CONTROL_FLOW_ROOT);
        if roots.len() != 1 {
            return Err(crate::Error::InvalidArgument(format!(
                "function {function} must have exactly one control flow root, found {}",
                roots.len()
            )));
        }
        let root = roots[0];

        let excluded = excluded_targets(store, function, expandables);
        context.in_progress.insert(function);

        let mut result = Subgraph::new();
        let mut stitched: Vec<(NodeId, NodeId)> = Vec::new();
        let mut state: HashMap<NodeId, NodeState> = HashMap::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();

        state.insert(root, NodeState::Queued);
        queue.push_back(root);

        while let Some(current) = queue.pop_front() {
            let successors = dag.successors(store, current);

            let expansion = expandable_target(
                store,
                current,
                expandables,
                &excluded,
                &context.in_progress,
            );
            match expansion {
                Some(target) => {
                    let callee = Self::synthesize_with(store, target, expandables, context)?;
                    let callee_cfg = store.function_cfg(target);
                    let callee_root = callee_cfg
                        .nodes_tagged(store, tags::CONTROL_FLOW_ROOT)
                        .into_iter()
                        .next()
                        .ok_or_else(|| {
                            crate::Error::InvalidArgument(format!(
                                "expanded function {target} lost its control flow root"
                            ))
                        })?;
                    let callee_leaves = callee_cfg.leaves(store);

                    result = result.union(callee.graph());
                    stitched.extend(callee.stitched_pairs().iter().copied());

                    let call_id = context.next_call_id();
                    stitch(store, &mut result, &mut stitched, current, callee_root, call_id);
                    for &leaf in &callee_leaves {
                        for &succ in &successors {
                            stitch(store, &mut result, &mut stitched, leaf, succ, call_id);
                        }
                    }
                }
                None => {
                    // Ordinary node (or unexpandable call site): keep its
                    // intraprocedural edges.
                    result.insert_node(current);
                    for edge in dag.outgoing_edges(store, current) {
                        let target = store.edge_target(edge);
                        result.insert_node(target);
                        result.insert_edge(edge);
                        stitched.push((current, target));
                    }
                }
            }

            state.insert(current, NodeState::Expanded);

            for &succ in &successors {
                if state.get(&succ).copied().unwrap_or(NodeState::Unvisited)
                    != NodeState::Unvisited
                {
                    continue;
                }
                let ready = dag
                    .predecessors(store, succ)
                    .iter()
                    .all(|p| state.get(p) == Some(&NodeState::Expanded));
                if ready {
                    state.insert(succ, NodeState::Queued);
                    queue.push_back(succ);
                }
            }
        }

        // Back edges bypass splicing entirely and return verbatim.
        for &edge in &back_edges {
            let (from, to) = store.edge_endpoints(edge);
            result.insert_node(from);
            result.insert_node(to);
            result.insert_edge(edge);
        }

        context.in_progress.remove(&function);
        let icfg = Icfg {
            graph: result,
            stitched,
        };
        context.expanded.insert(function, icfg.clone());
        Ok(icfg)
    }

    /// Returns the synthesized node and edge sets.
    #[must_use]
    pub fn graph(&self) -> &Subgraph {
        &self.graph
    }

    /// Returns the stitched `(predecessor, successor)` pairs in splicing order.
    #[must_use]
    pub fn stitched_pairs(&self) -> &[(NodeId, NodeId)] {
        &self.stitched
    }
}

/// Connects `from` to `to` in the result, reusing an existing edge when possible.
///
/// Preference order: an original control-flow edge between the pair, then an
/// interprocedural edge from an earlier synthesis. Only a freshly created edge
/// receives the correlation tags; found edges already carry theirs.
fn stitch(
    store: &mut GraphStore,
    result: &mut Subgraph,
    stitched: &mut Vec<(NodeId, NodeId)>,
    from: NodeId,
    to: NodeId,
    call_id: u64,
) {
    let edge = if let Some(existing) = store.find_tagged_edge(tags::CONTROL_FLOW_EDGE, from, to) {
        existing
    } else if let Some(existing) = store.find_tagged_edge(tags::ICFG_EDGE, from, to) {
        existing
    } else {
        let edge = store.create_edge(from, to);
        store.tag_edge(edge, tags::ICFG_EDGE);
        store.tag_edge(edge, tags::CALL_ID);
        store.tag_edge(edge, &tags::call_id_tag(call_id));
        log::info!("icfg edge added: {from} -> {to}");
        edge
    };
    result.insert_node(from);
    result.insert_node(to);
    result.insert_edge(edge);
    stitched.push((from, to));
}

/// Decides whether `node` is a call site that should be expanded.
///
/// Requires the call-site tag, exactly one resolvable target, membership of the
/// target in the expandable set, a non-recursive target, and a callee that is
/// not already being synthesized further up the stack.
fn expandable_target(
    store: &GraphStore,
    node: NodeId,
    expandables: &BTreeSet<NodeId>,
    excluded: &HashSet<NodeId>,
    in_progress: &HashSet<NodeId>,
) -> Option<NodeId> {
    if !store.node_has_tag(node, tags::CALL_SITE) {
        return None;
    }
    let targets = call_targets(store, node);
    if targets.len() != 1 {
        return None;
    }
    let target = targets[0];
    if !expandables.contains(&target)
        || excluded.contains(&target)
        || in_progress.contains(&target)
    {
        return None;
    }
    // A degenerate callee cannot be spliced.
    let callee_cfg = store.function_cfg(target);
    if callee_cfg.is_empty()
        || callee_cfg
            .nodes_tagged(store, tags::CONTROL_FLOW_ROOT)
            .len()
            != 1
    {
        return None;
    }
    Some(target)
}

/// Returns the distinct functions a call site resolves to.
fn call_targets(store: &GraphStore, site: NodeId) -> Vec<NodeId> {
    let mut targets = Vec::new();
    for &edge in store.outgoing_edges(site) {
        if store.edge_has_tag(edge, tags::INVOKED_FUNCTION) {
            let target = store.edge_target(edge);
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }
    targets
}

/// Computes the functions that must not be inlined while synthesizing `function`.
///
/// A target is excluded if it sits on a call-graph cycle among the expandable
/// functions, or if it can reach `function` again through call edges (which
/// includes `function` itself).
fn excluded_targets(
    store: &GraphStore,
    function: NodeId,
    expandables: &BTreeSet<NodeId>,
) -> HashSet<NodeId> {
    let mut members: BTreeSet<NodeId> = expandables.clone();
    members.insert(function);

    let mut call_graph = Subgraph::new();
    for &node in &members {
        call_graph.insert_node(node);
    }
    for edge in store.edges_tagged(tags::CALL) {
        let (from, to) = store.edge_endpoints(edge);
        if members.contains(&from) && members.contains(&to) {
            call_graph.insert_edge(edge);
        }
    }

    let mut excluded: HashSet<NodeId> = HashSet::new();

    let sccs = SccAnalysis::new(store, &call_graph);
    for &node in &members {
        if sccs.is_in_cycle(node) {
            excluded.insert(node);
        }
    }

    // Reverse reachability: everything that can call its way back to `function`.
    let mut stack = vec![function];
    let mut reaches: HashSet<NodeId> = HashSet::new();
    reaches.insert(function);
    while let Some(node) = stack.pop() {
        for pred in call_graph.predecessors(store, node) {
            if reaches.insert(pred) {
                stack.push(pred);
            }
        }
    }
    excluded.extend(reaches);

    excluded
}
