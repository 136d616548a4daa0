//! Whole-program analysis driver.
//!
//! Runs the unique-entry/exit wrapping, dominance computation, and loop
//! classification over every function in a store, persisting each result
//! through the tagged-edge idempotence primitives. Degenerate functions are
//! skipped with a log line rather than failing the batch, and a shared
//! [`CancellationToken`] lets a caller stop the sweep between functions.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    analysis::{DominanceAnalysis, LoopClassification, UniqueEntryExitGraph},
    graph::{tags, GraphStore, NodeId},
    Result,
};

/// A cooperative cancellation flag shared between a batch run and its caller.
///
/// Cloning the token shares the underlying flag; cancelling any clone cancels
/// them all. The driver polls the token between functions, so a function
/// already being analyzed runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        CancellationToken::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Checks whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// The result of one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    analyzed: Vec<NodeId>,
    skipped: Vec<NodeId>,
    cancelled: bool,
}

impl BatchOutcome {
    /// Returns the functions that were analyzed successfully.
    #[must_use]
    pub fn analyzed(&self) -> &[NodeId] {
        &self.analyzed
    }

    /// Returns the functions that were skipped as degenerate or failing.
    #[must_use]
    pub fn skipped(&self) -> &[NodeId] {
        &self.skipped
    }

    /// `true` if the run stopped early due to cancellation.
    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Converts a cancelled outcome into an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`](crate::Error::Cancelled) if the run was
    /// stopped before visiting every function.
    pub fn require_complete(self) -> Result<BatchOutcome> {
        if self.cancelled {
            return Err(crate::Error::Cancelled);
        }
        Ok(self)
    }
}

/// Analyzes every function in the store.
///
/// For each node tagged as a function: wraps its CFG with a unique entry and
/// exit, computes and persists dominance and post-dominance with their
/// frontiers, and identifies and persists loop structure. Functions with an
/// empty CFG or no control-flow root are logged and skipped; a failure in one
/// function is logged and does not stop the others.
///
/// Re-running over an unmutated store adds no graph elements.
pub fn analyze_all(store: &mut GraphStore, token: &CancellationToken) -> BatchOutcome {
    let functions = store.nodes_tagged(tags::FUNCTION);
    let mut outcome = BatchOutcome::default();

    for function in functions {
        if token.is_cancelled() {
            log::info!("analysis cancelled before function {function}");
            outcome.cancelled = true;
            break;
        }

        let cfg = store.function_cfg(function);
        if cfg.is_empty() {
            log::warn!("function {function} has no control flow graph, skipping");
            outcome.skipped.push(function);
            continue;
        }
        if cfg.nodes_tagged(store, tags::CONTROL_FLOW_ROOT).is_empty() {
            log::warn!("function {function} has no control flow root, skipping");
            outcome.skipped.push(function);
            continue;
        }
        if cfg.nodes_tagged(store, tags::CONTROL_FLOW_EXIT).is_empty() {
            log::warn!("function {function} has no control flow exit, skipping");
            outcome.skipped.push(function);
            continue;
        }

        match analyze_function(store, function) {
            Ok(()) => outcome.analyzed.push(function),
            Err(err) => {
                log::error!("analysis of function {function} failed: {err}");
                outcome.skipped.push(function);
            }
        }
    }

    outcome
}

fn analyze_function(store: &mut GraphStore, function: NodeId) -> Result<()> {
    let cfg = store.function_cfg(function);
    let wrapped = UniqueEntryExitGraph::new(store, &cfg, false)?;

    let dominance = DominanceAnalysis::compute(&wrapped)?;
    dominance.apply(store);

    let loops = LoopClassification::identify(&wrapped);
    loops.apply(store);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a function with a simple loop: 0 -> 1 -> 2, 2 -> 1, 2 -> 3.
    fn looped_function(store: &mut GraphStore) -> (NodeId, Vec<NodeId>) {
        let function = store.create_node();
        store.tag_node(function, tags::FUNCTION);

        let mut nodes = Vec::new();
        for _ in 0..4 {
            let node = store.create_node();
            store.tag_node(node, tags::CONTROL_FLOW_NODE);
            store.set_owner(node, function);
            nodes.push(node);
        }
        store.tag_node(nodes[0], tags::CONTROL_FLOW_ROOT);
        store.tag_node(nodes[3], tags::CONTROL_FLOW_EXIT);
        for (from, to) in [(0, 1), (1, 2), (2, 1), (2, 3)] {
            let edge = store.create_edge(nodes[from], nodes[to]);
            store.tag_edge(edge, tags::CONTROL_FLOW_EDGE);
        }
        (function, nodes)
    }

    #[test]
    fn test_batch_tags_dominance_and_loops() {
        let mut store = GraphStore::new();
        let (function, nodes) = looped_function(&mut store);

        let outcome = analyze_all(&mut store, &CancellationToken::new());
        assert_eq!(outcome.analyzed(), &[function]);
        assert!(outcome.skipped().is_empty());
        assert!(!outcome.was_cancelled());

        assert!(store
            .find_tagged_edge(tags::IDOM, nodes[0], nodes[1])
            .is_some());
        assert!(store.node_has_tag(nodes[1], tags::LOOP_HEADER));
        assert!(store
            .edges_tagged(tags::LOOP_BACK_EDGE)
            .iter()
            .any(|&e| store.edge_endpoints(e) == (nodes[2], nodes[1])));
    }

    #[test]
    fn test_degenerate_functions_are_skipped() {
        let mut store = GraphStore::new();
        let empty = store.create_node();
        store.tag_node(empty, tags::FUNCTION);

        // A function whose nodes carry no root tag.
        let rootless = store.create_node();
        store.tag_node(rootless, tags::FUNCTION);
        let a = store.create_node();
        store.tag_node(a, tags::CONTROL_FLOW_NODE);
        store.set_owner(a, rootless);

        let (function, _) = looped_function(&mut store);

        let outcome = analyze_all(&mut store, &CancellationToken::new());
        assert_eq!(outcome.analyzed(), &[function]);
        assert_eq!(outcome.skipped(), &[empty, rootless]);
    }

    #[test]
    fn test_rerun_adds_nothing() {
        let mut store = GraphStore::new();
        looped_function(&mut store);

        analyze_all(&mut store, &CancellationToken::new());
        let nodes = store.node_count();
        let edges = store.edge_count();

        analyze_all(&mut store, &CancellationToken::new());
        assert_eq!(store.node_count(), nodes);
        assert_eq!(store.edge_count(), edges);
    }

    #[test]
    fn test_cancellation_stops_the_sweep() {
        let mut store = GraphStore::new();
        looped_function(&mut store);
        looped_function(&mut store);

        let token = CancellationToken::new();
        token.cancel();
        let outcome = analyze_all(&mut store, &token);
        assert!(outcome.was_cancelled());
        assert!(outcome.analyzed().is_empty());
        assert!(matches!(
            outcome.require_complete(),
            Err(crate::Error::Cancelled)
        ));
    }

    #[test]
    fn test_token_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
