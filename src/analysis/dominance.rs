//! Dominance relations over a unique-entry/exit CFG.
//!
//! A node `d` **dominates** a node `n` if every path from the entry to `n` passes
//! through `d`; the **immediate dominator** is the closest strict dominator. The
//! **dominance frontier** of `n` is the set of nodes where `n`'s dominance ends,
//! the classic placement set for φ-functions. Post-dominance and the
//! post-dominance frontier are the same notions on the reversed graph, anchored
//! at the unique exit.
//!
//! # Algorithm
//!
//! Immediate dominators are computed by the iterative fixed point of Cooper,
//! Harvey and Kennedy: nodes are numbered in reverse postorder from the entry and
//! repeatedly re-intersected against their processed predecessors until nothing
//! changes. Worst case O(N·E), near-linear on CFG-shaped graphs. Frontiers use
//! the Cytron et al. join-point walk.
//!
//! One engine serves both directions; post-dominance simply runs it with the
//! adjacency swapped and the exit as the root.
//!
//! Results are written back to the store as tagged edges over the original node
//! identities via [`DominanceAnalysis::apply`]; synthesized master entry/exit
//! nodes never appear in applied results.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
    analysis::UniqueEntryExitGraph,
    graph::{tags, GraphStore, NodeId},
    Result,
};

/// The four dominance relations of one wrapped CFG.
///
/// Immediate (post-)dominators are defined for every node reachable from the
/// entry (resp. exit); nodes unreachable in the relevant direction are absent
/// from the corresponding maps and report `None`/empty.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::{DominanceAnalysis, GraphStore, UniqueEntryExitGraph};
///
/// # fn demo(store: &mut GraphStore, wrapped: &UniqueEntryExitGraph) -> flowscope::Result<()> {
/// let dominance = DominanceAnalysis::compute(wrapped)?;
/// assert!(dominance.dominates(wrapped.entry(), wrapped.exit()));
/// dominance.apply(store);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DominanceAnalysis {
    entry: NodeId,
    exit: NodeId,
    /// node → immediate dominator; the entry maps to itself
    idom: HashMap<NodeId, NodeId>,
    /// node → immediate post-dominator; the exit maps to itself
    ipdom: HashMap<NodeId, NodeId>,
    frontier: HashMap<NodeId, BTreeSet<NodeId>>,
    post_frontier: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl DominanceAnalysis {
    /// Computes all four relations for a wrapped CFG.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Computation`](crate::Error::Computation) if an idom
    /// chain is found to be inconsistent during the intersection walk. This
    /// indicates a corrupted input graph.
    pub fn compute(graph: &UniqueEntryExitGraph) -> Result<Self> {
        let idom = immediate_dominators(
            graph.entry(),
            |n| graph.successors(n),
            |n| graph.predecessors(n),
        )?;
        let ipdom = immediate_dominators(
            graph.exit(),
            |n| graph.predecessors(n),
            |n| graph.successors(n),
        )?;

        let frontier = dominance_frontiers(&idom, graph.entry(), |n| graph.predecessors(n));
        let post_frontier = dominance_frontiers(&ipdom, graph.exit(), |n| graph.successors(n));

        Ok(DominanceAnalysis {
            entry: graph.entry(),
            exit: graph.exit(),
            idom,
            ipdom,
            frontier,
            post_frontier,
        })
    }

    /// Returns the immediate dominator of a node.
    ///
    /// `None` for the entry node and for nodes unreachable from the entry.
    #[must_use]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        if node == self.entry {
            None
        } else {
            self.idom.get(&node).copied()
        }
    }

    /// Returns the immediate post-dominator of a node.
    ///
    /// `None` for the exit node and for nodes that cannot reach the exit.
    #[must_use]
    pub fn immediate_post_dominator(&self, node: NodeId) -> Option<NodeId> {
        if node == self.exit {
            None
        } else {
            self.ipdom.get(&node).copied()
        }
    }

    /// Checks if node `a` dominates node `b`.
    ///
    /// A node reachable from the entry dominates itself. Nodes the entry cannot
    /// reach sit outside the dominator tree and dominate nothing, themselves
    /// included.
    #[must_use]
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        chain_contains(&self.idom, self.entry, a, b)
    }

    /// Checks if node `a` post-dominates node `b`.
    ///
    /// A node that can reach the exit post-dominates itself. Nodes that cannot
    /// reach the exit sit outside the post-dominator tree and post-dominate
    /// nothing, themselves included.
    #[must_use]
    pub fn post_dominates(&self, a: NodeId, b: NodeId) -> bool {
        chain_contains(&self.ipdom, self.exit, a, b)
    }

    /// Checks if node `a` strictly dominates node `b`.
    #[must_use]
    pub fn strictly_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Returns the dominance frontier of a node. Empty if the node has none.
    #[must_use]
    pub fn frontier(&self, node: NodeId) -> BTreeSet<NodeId> {
        self.frontier.get(&node).cloned().unwrap_or_default()
    }

    /// Returns the post-dominance frontier of a node. Empty if the node has none.
    #[must_use]
    pub fn post_frontier(&self, node: NodeId) -> BTreeSet<NodeId> {
        self.post_frontier.get(&node).cloned().unwrap_or_default()
    }

    /// Returns all dominators of a node, from the node itself up to the entry.
    #[must_use]
    pub fn dominators(&self, node: NodeId) -> Vec<NodeId> {
        let mut result = vec![node];
        let mut current = node;
        while current != self.entry {
            match self.idom.get(&current) {
                Some(&d) => {
                    result.push(d);
                    current = d;
                }
                None => break,
            }
        }
        result
    }

    /// Writes the four relations into the store as tagged edges.
    ///
    /// Dominator-tree edges run dominator → dominated and carry [`tags::IDOM`]
    /// plus the legacy [`tags::IFDOM`] alias; post-dominator edges carry
    /// [`tags::IPDOM`]; frontier edges run node → frontier member and carry
    /// [`tags::DOM_FRONTIER`] / [`tags::PDOM_FRONTIER`]. Edges touching a
    /// synthesized master node are skipped so results stay expressed over the
    /// original CFG. Insertion is find-or-create, so re-applying on an unmutated
    /// store is a no-op.
    pub fn apply(&self, store: &mut GraphStore) {
        for (&node, &dom) in &self.idom {
            if node == self.entry || is_master(store, node) || is_master(store, dom) {
                continue;
            }
            let edge = store.find_or_create_tagged_edge(tags::IDOM, dom, node);
            store.tag_edge(edge, tags::IFDOM);
        }
        for (&node, &dom) in &self.ipdom {
            if node == self.exit || is_master(store, node) || is_master(store, dom) {
                continue;
            }
            store.find_or_create_tagged_edge(tags::IPDOM, dom, node);
        }
        for (&node, members) in &self.frontier {
            if is_master(store, node) {
                continue;
            }
            for &member in members {
                if !is_master(store, member) {
                    store.find_or_create_tagged_edge(tags::DOM_FRONTIER, node, member);
                }
            }
        }
        for (&node, members) in &self.post_frontier {
            if is_master(store, node) {
                continue;
            }
            for &member in members {
                if !is_master(store, member) {
                    store.find_or_create_tagged_edge(tags::PDOM_FRONTIER, node, member);
                }
            }
        }
    }
}

/// `true` for synthesized unique-entry/exit super nodes.
fn is_master(store: &GraphStore, node: NodeId) -> bool {
    store.node_has_tag(node, tags::MASTER_ENTRY) || store.node_has_tag(node, tags::MASTER_EXIT)
}

/// Walks the dominator chain of `b` checking for `a`.
fn chain_contains(idom: &HashMap<NodeId, NodeId>, root: NodeId, a: NodeId, b: NodeId) -> bool {
    if a == b {
        return idom.contains_key(&b) || b == root;
    }
    let mut current = b;
    while current != root {
        match idom.get(&current) {
            Some(&d) => {
                if d == a {
                    return true;
                }
                current = d;
            }
            None => return false,
        }
    }
    false
}

/// Iterative reverse-postorder fixed point for immediate dominators.
///
/// Direction-agnostic: forward dominance passes the real adjacency, post-dominance
/// passes it swapped with the exit as `root`. The returned map covers every node
/// reachable from `root` and maps the root to itself.
fn immediate_dominators<S, P>(
    root: NodeId,
    successors: S,
    predecessors: P,
) -> Result<HashMap<NodeId, NodeId>>
where
    S: Fn(NodeId) -> Vec<NodeId>,
    P: Fn(NodeId) -> Vec<NodeId>,
{
    let order = postorder(root, &successors);
    let number: HashMap<NodeId, usize> = order
        .iter()
        .enumerate()
        .map(|(i, &n)| (n, i))
        .collect();

    let mut idom: HashMap<NodeId, NodeId> = HashMap::new();
    idom.insert(root, root);

    let mut changed = true;
    while changed {
        changed = false;
        // Reverse postorder, root excluded.
        for &node in order.iter().rev() {
            if node == root {
                continue;
            }

            let mut new_idom: Option<NodeId> = None;
            for pred in predecessors(node) {
                if !idom.contains_key(&pred) {
                    continue;
                }
                new_idom = Some(match new_idom {
                    None => pred,
                    Some(current) => intersect(&idom, &number, pred, current)?,
                });
            }

            if let Some(new_idom) = new_idom {
                if idom.get(&node) != Some(&new_idom) {
                    idom.insert(node, new_idom);
                    changed = true;
                }
            }
        }
    }

    Ok(idom)
}

/// Nearest common ancestor of two nodes in the partially built dominator tree,
/// compared by postorder number.
fn intersect(
    idom: &HashMap<NodeId, NodeId>,
    number: &HashMap<NodeId, usize>,
    a: NodeId,
    b: NodeId,
) -> Result<NodeId> {
    let mut finger_a = a;
    let mut finger_b = b;
    while finger_a != finger_b {
        while number[&finger_a] < number[&finger_b] {
            finger_a = *idom
                .get(&finger_a)
                .ok_or_else(|| computation_error!("broken idom chain at {}", finger_a))?;
        }
        while number[&finger_b] < number[&finger_a] {
            finger_b = *idom
                .get(&finger_b)
                .ok_or_else(|| computation_error!("broken idom chain at {}", finger_b))?;
        }
    }
    Ok(finger_a)
}

/// Postorder numbering from `root`, explicit stack.
fn postorder<S>(root: NodeId, successors: &S) -> Vec<NodeId>
where
    S: Fn(NodeId) -> Vec<NodeId>,
{
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> = Vec::new();

    visited.insert(root);
    stack.push((root, successors(root), 0));

    while let Some((node, succs, cursor)) = stack.last_mut() {
        if *cursor < succs.len() {
            let next = succs[*cursor];
            *cursor += 1;
            if visited.insert(next) {
                stack.push((next, successors(next), 0));
            }
        } else {
            order.push(*node);
            stack.pop();
        }
    }

    order
}

/// Cytron et al. frontier computation over a finished idom map.
fn dominance_frontiers<P>(
    idom: &HashMap<NodeId, NodeId>,
    root: NodeId,
    predecessors: P,
) -> HashMap<NodeId, BTreeSet<NodeId>>
where
    P: Fn(NodeId) -> Vec<NodeId>,
{
    let mut frontiers: HashMap<NodeId, BTreeSet<NodeId>> = HashMap::new();

    for &node in idom.keys() {
        if node == root {
            continue;
        }
        let preds = predecessors(node);
        if preds.len() < 2 {
            continue;
        }
        let node_idom = idom[&node];

        for pred in preds {
            if !idom.contains_key(&pred) {
                // Unreachable predecessor.
                continue;
            }
            let mut runner = pred;
            while runner != node_idom {
                frontiers.entry(runner).or_default().insert(node);
                if runner == root {
                    break;
                }
                runner = idom[&runner];
            }
        }
    }

    frontiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Subgraph;

    /// Builds a single-function CFG from an edge list over `n` nodes.
    fn build_cfg(
        store: &mut GraphStore,
        n: usize,
        edges: &[(usize, usize)],
        root: usize,
        exits: &[usize],
    ) -> (Subgraph, Vec<NodeId>) {
        let function = store.create_node();
        store.tag_node(function, tags::FUNCTION);

        let mut graph = Subgraph::new();
        let mut nodes = Vec::new();
        for _ in 0..n {
            let node = store.create_node();
            store.tag_node(node, tags::CONTROL_FLOW_NODE);
            store.set_owner(node, function);
            graph.insert_node(node);
            nodes.push(node);
        }
        store.tag_node(nodes[root], tags::CONTROL_FLOW_ROOT);
        for &e in exits {
            store.tag_node(nodes[e], tags::CONTROL_FLOW_EXIT);
        }
        for &(from, to) in edges {
            let edge = store.create_edge(nodes[from], nodes[to]);
            store.tag_edge(edge, tags::CONTROL_FLOW_EDGE);
            graph.insert_edge(edge);
        }
        (graph, nodes)
    }

    fn analyze(
        store: &mut GraphStore,
        n: usize,
        edges: &[(usize, usize)],
        root: usize,
        exits: &[usize],
    ) -> (DominanceAnalysis, Vec<NodeId>) {
        let (graph, nodes) = build_cfg(store, n, edges, root, exits);
        let wrapped = UniqueEntryExitGraph::new(store, &graph, false).unwrap();
        let dominance = DominanceAnalysis::compute(&wrapped).unwrap();
        (dominance, nodes)
    }

    #[test]
    fn test_linear_chain() {
        // 0 -> 1 -> 2 -> 3
        let mut store = GraphStore::new();
        let (dom, n) = analyze(&mut store, 4, &[(0, 1), (1, 2), (2, 3)], 0, &[3]);

        assert_eq!(dom.immediate_dominator(n[0]), None);
        assert_eq!(dom.immediate_dominator(n[1]), Some(n[0]));
        assert_eq!(dom.immediate_dominator(n[2]), Some(n[1]));
        assert_eq!(dom.immediate_dominator(n[3]), Some(n[2]));

        assert!(dom.dominates(n[0], n[3]));
        assert!(dom.dominates(n[1], n[2]));
        assert!(!dom.dominates(n[3], n[2]));
        assert_eq!(dom.dominators(n[3]), vec![n[3], n[2], n[1], n[0]]);

        // Post-dominance mirrors the chain.
        assert_eq!(dom.immediate_post_dominator(n[0]), Some(n[1]));
        assert!(dom.post_dominates(n[3], n[0]));
    }

    #[test]
    fn test_diamond() {
        //      0
        //     / \
        //    1   2
        //     \ /
        //      3
        let mut store = GraphStore::new();
        let (dom, n) = analyze(&mut store, 4, &[(0, 1), (0, 2), (1, 3), (2, 3)], 0, &[3]);

        assert_eq!(dom.immediate_dominator(n[1]), Some(n[0]));
        assert_eq!(dom.immediate_dominator(n[2]), Some(n[0]));
        assert_eq!(dom.immediate_dominator(n[3]), Some(n[0]));
        assert!(!dom.strictly_dominates(n[1], n[3]));
        assert!(!dom.strictly_dominates(n[2], n[3]));

        // The join point ends the branches' dominance.
        assert_eq!(dom.frontier(n[1]), BTreeSet::from([n[3]]));
        assert_eq!(dom.frontier(n[2]), BTreeSet::from([n[3]]));
        assert!(dom.frontier(n[0]).is_empty());
        assert!(dom.frontier(n[3]).is_empty());

        // Dual: the fork ends the branches' post-dominance.
        assert_eq!(dom.immediate_post_dominator(n[1]), Some(n[3]));
        assert_eq!(dom.post_frontier(n[1]), BTreeSet::from([n[0]]));
        assert_eq!(dom.post_frontier(n[2]), BTreeSet::from([n[0]]));
    }

    #[test]
    fn test_if_then_else_chain() {
        // 0 -> 1; 1 -> 2 (then), 1 -> 3 (else); 2,3 -> 4; 4 -> 5
        let mut store = GraphStore::new();
        let (dom, n) = analyze(
            &mut store,
            6,
            &[(0, 1), (1, 2), (1, 3), (2, 4), (3, 4), (4, 5)],
            0,
            &[5],
        );

        assert_eq!(dom.immediate_dominator(n[2]), Some(n[1]));
        assert_eq!(dom.immediate_dominator(n[3]), Some(n[1]));
        assert_eq!(dom.immediate_dominator(n[4]), Some(n[1]));
        assert_eq!(dom.immediate_dominator(n[5]), Some(n[4]));
        assert!(dom.dominates(n[1], n[5]));
    }

    #[test]
    fn test_loop() {
        // 0 -> 1 -> 2 -> 1 (back), 2 -> 3
        let mut store = GraphStore::new();
        let (dom, n) = analyze(&mut store, 4, &[(0, 1), (1, 2), (2, 1), (2, 3)], 0, &[3]);

        assert_eq!(dom.immediate_dominator(n[2]), Some(n[1]));
        assert!(!dom.strictly_dominates(n[2], n[1]));
        // A loop header sits in its own body's frontier.
        assert!(dom.frontier(n[2]).contains(&n[1]));
        assert!(dom.frontier(n[1]).contains(&n[1]));
    }

    #[test]
    fn test_nested_if_frontiers() {
        //       0
        //       |
        //       1
        //      / \
        //     2   3
        //    / \   \
        //   4   5   6
        //    \ /   /
        //     7   /
        //      \ /
        //       8
        let mut store = GraphStore::new();
        let (dom, n) = analyze(
            &mut store,
            9,
            &[
                (0, 1),
                (1, 2),
                (1, 3),
                (2, 4),
                (2, 5),
                (3, 6),
                (4, 7),
                (5, 7),
                (6, 8),
                (7, 8),
            ],
            0,
            &[8],
        );

        assert!(dom.frontier(n[4]).contains(&n[7]));
        assert!(dom.frontier(n[5]).contains(&n[7]));
        assert!(dom.frontier(n[7]).contains(&n[8]));
        assert!(dom.frontier(n[6]).contains(&n[8]));
        assert!(!dom.frontier(n[1]).contains(&n[8]));
    }

    #[test]
    fn test_idom_chain_reaches_entry() {
        // Every node's dominator chain must terminate at the entry without cycling.
        let mut store = GraphStore::new();
        let (dom, n) = analyze(
            &mut store,
            6,
            &[(0, 1), (1, 2), (2, 3), (3, 1), (2, 4), (4, 5), (1, 5)],
            0,
            &[5],
        );

        for &node in &n {
            let chain = dom.dominators(node);
            assert_eq!(*chain.last().unwrap(), n[0], "chain of {node} must end at entry");
            let unique: BTreeSet<NodeId> = chain.iter().copied().collect();
            assert_eq!(unique.len(), chain.len(), "chain of {node} must be acyclic");
        }
    }

    #[test]
    fn test_multiple_exits_post_dominance() {
        // 0 -> 1; 1 -> 2 (exit); 1 -> 3 (exit)
        let mut store = GraphStore::new();
        let (graph, n) = build_cfg(&mut store, 4, &[(0, 1), (1, 2), (1, 3)], 0, &[2, 3]);
        let wrapped = UniqueEntryExitGraph::new(&mut store, &graph, false).unwrap();
        let dom = DominanceAnalysis::compute(&wrapped).unwrap();

        // Both exits post-dominate only themselves among CFG nodes; the branch
        // node is post-dominated by the synthesized master exit.
        assert_eq!(dom.immediate_post_dominator(n[1]), Some(wrapped.exit()));
        assert!(dom.post_dominates(wrapped.exit(), n[0]));
        assert!(!dom.post_dominates(n[2], n[1]));
    }

    #[test]
    fn test_apply_writes_tagged_edges() {
        let mut store = GraphStore::new();
        let (graph, n) = build_cfg(&mut store, 4, &[(0, 1), (0, 2), (1, 3), (2, 3)], 0, &[3]);
        let wrapped = UniqueEntryExitGraph::new(&mut store, &graph, false).unwrap();
        let dom = DominanceAnalysis::compute(&wrapped).unwrap();
        dom.apply(&mut store);

        let idom_edge = store.find_tagged_edge(tags::IDOM, n[0], n[3]).unwrap();
        assert!(store.edge_has_tag(idom_edge, tags::IFDOM));
        assert!(store.find_tagged_edge(tags::DOM_FRONTIER, n[1], n[3]).is_some());
        assert!(store.find_tagged_edge(tags::IPDOM, n[3], n[1]).is_some());
        assert!(store.find_tagged_edge(tags::PDOM_FRONTIER, n[1], n[0]).is_some());

        // Re-applying on the unmutated store must not duplicate anything.
        let edge_count = store.edge_count();
        dom.apply(&mut store);
        assert_eq!(store.edge_count(), edge_count);
    }

    #[test]
    fn test_apply_excludes_master_nodes() {
        let mut store = GraphStore::new();
        // Two exits force a synthesized master exit.
        let (graph, _) = build_cfg(&mut store, 4, &[(0, 1), (1, 2), (1, 3)], 0, &[2, 3]);
        let wrapped = UniqueEntryExitGraph::new(&mut store, &graph, false).unwrap();
        let master = wrapped.exit();
        let dom = DominanceAnalysis::compute(&wrapped).unwrap();
        dom.apply(&mut store);

        assert!(store.incoming_edges(master).iter().all(|&e| {
            !store.edge_has_tag(e, tags::IPDOM) && !store.edge_has_tag(e, tags::PDOM_FRONTIER)
        }));
        assert!(store.outgoing_edges(master).iter().all(|&e| {
            !store.edge_has_tag(e, tags::IPDOM) && !store.edge_has_tag(e, tags::PDOM_FRONTIER)
        }));
    }

    #[test]
    fn test_unreachable_node_has_no_dominator() {
        // Node 3 is disconnected from the entry.
        let mut store = GraphStore::new();
        let (graph, n) = build_cfg(&mut store, 4, &[(0, 1), (1, 2), (3, 2)], 0, &[2]);
        let wrapped = UniqueEntryExitGraph::new(&mut store, &graph, false).unwrap();
        let dom = DominanceAnalysis::compute(&wrapped).unwrap();

        assert_eq!(dom.immediate_dominator(n[3]), None);
        assert!(!dom.dominates(n[0], n[3]));
        // The reachable part is unaffected by the unreachable predecessor.
        assert_eq!(dom.immediate_dominator(n[2]), Some(n[1]));
    }

    #[test]
    fn test_self_dominance_requires_reachability() {
        // Node 3 is unreachable from the entry but reaches the exit.
        let mut store = GraphStore::new();
        let (graph, n) = build_cfg(&mut store, 4, &[(0, 1), (1, 2), (3, 2)], 0, &[2]);
        let wrapped = UniqueEntryExitGraph::new(&mut store, &graph, false).unwrap();
        let dom = DominanceAnalysis::compute(&wrapped).unwrap();

        assert!(dom.dominates(n[1], n[1]));
        assert!(!dom.dominates(n[3], n[3]));
        // The dual holds in the post-dominance direction.
        assert!(dom.post_dominates(n[3], n[3]));
    }
}
