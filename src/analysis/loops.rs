//! Loop identification and classification.
//!
//! Implements the single-pass DFS loop identification of Wei et al.,
//! "A New Algorithm for Identifying Loops in Decompilation" (SAS 2007), which
//! handles both natural and irreducible loops without converting the graph to
//! natural-loop form first.
//!
//! One depth-first walk from the entry discovers, per node, the innermost
//! enclosing loop header, and collects the back edges, the reentry nodes/edges
//! (side entrances into a loop that bypass its header), and the headers of
//! irreducible regions.
//!
//! The walk is an explicit stack of frames with a program counter rather than
//! native recursion; CFG depth regularly exceeds what the call stack tolerates
//! on large generated functions.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
    analysis::UniqueEntryExitGraph,
    graph::{tags, EdgeId, GraphStore, NodeId},
};

/// Resume points of a suspended DFS frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    /// First activation: mark the node traversed and start its edge sweep
    Enter,
    /// Continue sweeping the node's outgoing edges
    EachEdge,
    /// A child frame finished; propagate its innermost header, then sweep on
    Pop,
}

/// One suspended activation of the loop DFS.
#[derive(Debug)]
struct Frame {
    state: FrameState,
    /// The node this frame traverses
    node: NodeId,
    /// Target of the edge whose child frame just returned
    child: Option<NodeId>,
    /// This node's position on the depth-first search path
    position: usize,
    /// Outgoing `(edge, target)` pairs of `node`
    edges: Vec<(EdgeId, NodeId)>,
    /// Sweep progress within `edges`
    cursor: usize,
}

/// Loop structure of one wrapped CFG.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::{GraphStore, LoopClassification, UniqueEntryExitGraph};
///
/// # fn demo(store: &mut GraphStore, wrapped: &UniqueEntryExitGraph) {
/// let loops = LoopClassification::identify(wrapped);
/// for edge in loops.back_edges() {
///     println!("back edge: {edge}");
/// }
/// loops.apply(store);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LoopClassification {
    /// node → innermost enclosing loop header
    headers: HashMap<NodeId, NodeId>,
    back_edges: BTreeSet<EdgeId>,
    reentry_nodes: BTreeSet<NodeId>,
    reentry_edges: BTreeSet<EdgeId>,
    irreducible: BTreeSet<NodeId>,
}

impl LoopClassification {
    /// Identifies all loops reachable from the wrapped graph's entry.
    #[must_use]
    pub fn identify(graph: &UniqueEntryExitGraph) -> Self {
        let mut walker = LoopDfs::new(graph);
        walker.run(graph.entry());
        LoopClassification {
            headers: walker.headers,
            back_edges: walker.back_edges,
            reentry_nodes: walker.reentry_nodes,
            reentry_edges: walker.reentry_edges,
            irreducible: walker.irreducible,
        }
    }

    /// Returns the innermost loop header enclosing `node`, if any.
    ///
    /// A header's own entry points at the next enclosing header; the outermost
    /// header of a nest has no entry.
    #[must_use]
    pub fn innermost_header(&self, node: NodeId) -> Option<NodeId> {
        self.headers.get(&node).copied()
    }

    /// Returns all identified loop headers.
    #[must_use]
    pub fn headers(&self) -> BTreeSet<NodeId> {
        self.headers.values().copied().collect()
    }

    /// `true` if `node` is the header of some identified loop.
    #[must_use]
    pub fn is_header(&self, node: NodeId) -> bool {
        self.headers.values().any(|&h| h == node)
    }

    /// Returns the identified loop back edges.
    #[must_use]
    pub fn back_edges(&self) -> &BTreeSet<EdgeId> {
        &self.back_edges
    }

    /// Returns the nodes through which a loop is entered without passing its header.
    #[must_use]
    pub fn reentry_nodes(&self) -> &BTreeSet<NodeId> {
        &self.reentry_nodes
    }

    /// Returns the edges through which a loop is entered without passing its header.
    #[must_use]
    pub fn reentry_edges(&self) -> &BTreeSet<EdgeId> {
        &self.reentry_edges
    }

    /// Returns the headers of irreducible loops.
    #[must_use]
    pub fn irreducible_headers(&self) -> &BTreeSet<NodeId> {
        &self.irreducible
    }

    /// Returns the number of loop headers enclosing `node`.
    ///
    /// Zero for nodes outside any loop and for the outermost header of a nest.
    #[must_use]
    pub fn nesting_depth(&self, node: NodeId) -> usize {
        let mut depth = 0;
        let mut seen = HashSet::new();
        let mut current = node;
        while let Some(&header) = self.headers.get(&current) {
            if !seen.insert(header) {
                break;
            }
            depth += 1;
            current = header;
        }
        depth
    }

    /// Writes the classification into the store as tags and attributes.
    ///
    /// Back edges receive [`tags::LOOP_BACK_EDGE`], headers
    /// [`tags::LOOP_HEADER`], irreducible headers [`tags::IRREDUCIBLE_LOOP`],
    /// and reentry nodes/edges their respective tags. Every loop member gets a
    /// [`tags::LOOP_HEADER_ID`] attribute naming its innermost header. Tagging
    /// existing elements is naturally idempotent.
    pub fn apply(&self, store: &mut GraphStore) {
        for &edge in &self.back_edges {
            store.tag_edge(edge, tags::LOOP_BACK_EDGE);
        }
        for header in self.headers() {
            store.tag_node(header, tags::LOOP_HEADER);
        }
        for &node in &self.irreducible {
            store.tag_node(node, tags::IRREDUCIBLE_LOOP);
        }
        for &node in &self.reentry_nodes {
            store.tag_node(node, tags::LOOP_REENTRY_NODE);
        }
        for &edge in &self.reentry_edges {
            store.tag_edge(edge, tags::LOOP_REENTRY_EDGE);
        }
        for (&node, &header) in &self.headers {
            store.set_node_attr(node, tags::LOOP_HEADER_ID, &header.index().to_string());
        }
    }
}

/// Working state of the Wei et al. walk.
struct LoopDfs<'a> {
    graph: &'a UniqueEntryExitGraph,
    traversed: HashSet<NodeId>,
    /// Depth-first search path position; 0 when off the current path
    dfsp: HashMap<NodeId, usize>,
    headers: HashMap<NodeId, NodeId>,
    back_edges: BTreeSet<EdgeId>,
    reentry_nodes: BTreeSet<NodeId>,
    reentry_edges: BTreeSet<EdgeId>,
    irreducible: BTreeSet<NodeId>,
    stack: Vec<Frame>,
}

impl<'a> LoopDfs<'a> {
    fn new(graph: &'a UniqueEntryExitGraph) -> Self {
        LoopDfs {
            graph,
            traversed: HashSet::new(),
            dfsp: HashMap::new(),
            headers: HashMap::new(),
            back_edges: BTreeSet::new(),
            reentry_nodes: BTreeSet::new(),
            reentry_edges: BTreeSet::new(),
            irreducible: BTreeSet::new(),
            stack: Vec::new(),
        }
    }

    fn position(&self, node: NodeId) -> usize {
        self.dfsp.get(&node).copied().unwrap_or(0)
    }

    fn run(&mut self, root: NodeId) {
        self.stack.push(Frame {
            state: FrameState::Enter,
            node: root,
            child: None,
            position: 1,
            edges: self.graph.out_edges(root).to_vec(),
            cursor: 0,
        });

        'stack: while let Some(top) = self.stack.len().checked_sub(1) {
            match self.stack[top].state {
                FrameState::Pop => {
                    let node = self.stack[top].node;
                    let child = self.stack[top].child;
                    if let Some(child) = child {
                        let header = self.headers.get(&child).copied();
                        self.tag_lhead(node, header);
                    }
                    self.stack[top].state = FrameState::EachEdge;
                    continue 'stack;
                }
                FrameState::Enter => {
                    let node = self.stack[top].node;
                    let position = self.stack[top].position;
                    self.traversed.insert(node);
                    self.dfsp.insert(node, position);
                    self.stack[top].state = FrameState::EachEdge;
                }
                FrameState::EachEdge => {}
            }

            while self.stack[top].cursor < self.stack[top].edges.len() {
                let (edge, target) = self.stack[top].edges[self.stack[top].cursor];
                self.stack[top].cursor += 1;
                let node = self.stack[top].node;
                let position = self.stack[top].position;

                if !self.traversed.contains(&target) {
                    // Paper case A: unvisited, descend
                    self.stack[top].state = FrameState::Pop;
                    self.stack[top].child = Some(target);
                    let edges = self.graph.out_edges(target).to_vec();
                    self.stack.push(Frame {
                        state: FrameState::Enter,
                        node: target,
                        child: None,
                        position: position + 1,
                        edges,
                        cursor: 0,
                    });
                    continue 'stack;
                } else if self.position(target) > 0 {
                    // Paper case B: target is on the current path, so it heads a loop
                    self.back_edges.insert(edge);
                    self.tag_lhead(node, Some(target));
                } else {
                    let Some(mut header) = self.headers.get(&target).copied() else {
                        // Paper case C: finished region without a loop, nothing to do
                        continue;
                    };

                    if self.position(header) > 0 {
                        // Paper case D: target's loop is still open
                        self.tag_lhead(node, Some(header));
                    } else {
                        // Paper case E: entering a closed loop sideways
                        self.reentry_nodes.insert(target);
                        self.reentry_edges.insert(edge);
                        self.irreducible.insert(header);

                        while let Some(&outer) = self.headers.get(&header) {
                            header = outer;
                            if self.position(header) > 0 {
                                self.tag_lhead(node, Some(header));
                                break;
                            }
                            self.irreducible.insert(header);
                        }
                    }
                }
            }

            let node = self.stack[top].node;
            self.dfsp.insert(node, 0);
            self.stack.pop();
        }
    }

    /// Union-by-path-position merge of `node`'s header chain with candidate `header`.
    ///
    /// The header closer to the DFS root absorbs the other, so every node's entry
    /// keeps pointing at its innermost enclosing loop.
    fn tag_lhead(&mut self, node: NodeId, header: Option<NodeId>) {
        let Some(header) = header else { return };
        if header == node {
            return;
        }

        let mut cur1 = node;
        let mut cur2 = header;
        while let Some(&ih) = self.headers.get(&cur1) {
            if ih == cur2 {
                return;
            }
            if self.position(ih) < self.position(cur2) {
                self.headers.insert(cur1, cur2);
                cur1 = cur2;
                cur2 = ih;
            } else {
                cur1 = ih;
            }
        }
        self.headers.insert(cur1, cur2);
    }
}
