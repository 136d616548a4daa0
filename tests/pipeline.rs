//! End-to-end pipeline over a small multi-function program.
//!
//! Builds a store with three functions, runs the batch driver, then
//! synthesizes an interprocedural CFG on top of the persisted results.

use std::collections::BTreeSet;

use flowscope::{
    analyze_all, graph::tags, CancellationToken, GraphStore, Icfg, NodeId, UniqueEntryExitGraph,
};

/// Builds a function CFG and returns its function node and statement nodes.
fn build_function(
    store: &mut GraphStore,
    n: usize,
    edges: &[(usize, usize)],
    root: usize,
    exits: &[usize],
) -> (NodeId, Vec<NodeId>) {
    let function = store.create_node();
    store.tag_node(function, tags::FUNCTION);

    let mut nodes = Vec::new();
    for _ in 0..n {
        let node = store.create_node();
        store.tag_node(node, tags::CONTROL_FLOW_NODE);
        store.set_owner(node, function);
        nodes.push(node);
    }
    store.tag_node(nodes[root], tags::CONTROL_FLOW_ROOT);
    for &e in exits {
        store.tag_node(nodes[e], tags::CONTROL_FLOW_EXIT);
    }
    for &(from, to) in edges {
        let edge = store.create_edge(nodes[from], nodes[to]);
        store.tag_edge(edge, tags::CONTROL_FLOW_EDGE);
    }
    (function, nodes)
}

fn link_call(store: &mut GraphStore, caller: NodeId, site: NodeId, callee: NodeId) {
    store.tag_node(site, tags::CALL_SITE);
    let resolution = store.create_edge(site, callee);
    store.tag_edge(resolution, tags::INVOKED_FUNCTION);
    store.find_or_create_tagged_edge(tags::CALL, caller, callee);
}

/// main: 0 -> 1 (call site) -> 2; helper: diamond with a loop; leaf: straight line.
fn build_program(store: &mut GraphStore) -> (NodeId, Vec<NodeId>, NodeId, Vec<NodeId>, NodeId) {
    let (main, main_nodes) = build_function(store, 3, &[(0, 1), (1, 2)], 0, &[2]);

    // helper: 0 -> 1, 1 -> 2, 2 -> 1 (loop), 2 -> 3, 1 -> 4, 3 -> 5, 4 -> 5
    let (helper, helper_nodes) = build_function(
        store,
        6,
        &[(0, 1), (1, 2), (2, 1), (2, 3), (1, 4), (3, 5), (4, 5)],
        0,
        &[5],
    );

    let (leaf, leaf_nodes) = build_function(store, 2, &[(0, 1)], 0, &[1]);

    link_call(store, main, main_nodes[1], helper);
    link_call(store, helper, helper_nodes[4], leaf);

    (main, main_nodes, helper, helper_nodes, leaf)
}

#[test]
fn batch_then_icfg() {
    let mut store = GraphStore::new();
    let (main, main_nodes, helper, helper_nodes, leaf) = build_program(&mut store);

    let outcome = analyze_all(&mut store, &CancellationToken::new());
    assert_eq!(outcome.analyzed().len(), 3);
    assert!(outcome.skipped().is_empty());

    // Dominance persisted: the helper's branch node dominates everything below it.
    assert!(store
        .find_tagged_edge(tags::IDOM, helper_nodes[1], helper_nodes[2])
        .is_some());
    assert!(store
        .find_tagged_edge(tags::IDOM, helper_nodes[1], helper_nodes[4])
        .is_some());
    // The alias tag rides on the same edge.
    let idom = store
        .find_tagged_edge(tags::IDOM, helper_nodes[1], helper_nodes[2])
        .unwrap();
    assert!(store.edge_has_tag(idom, tags::IFDOM));

    // Loop structure persisted: 1 heads the 1 <-> 2 loop.
    assert!(store.node_has_tag(helper_nodes[1], tags::LOOP_HEADER));
    assert!(store
        .edges_tagged(tags::LOOP_BACK_EDGE)
        .iter()
        .any(|&e| store.edge_endpoints(e) == (helper_nodes[2], helper_nodes[1])));

    // ICFG on top of the loop tags: both callees spliced in transitively.
    let expandables = BTreeSet::from([helper, leaf]);
    let icfg = Icfg::synthesize(&mut store, main, &expandables).expect("synthesis failed");

    assert!(icfg.graph().contains_node(helper_nodes[0]));
    assert!(icfg
        .stitched_pairs()
        .contains(&(main_nodes[1], helper_nodes[0])));
    // The helper's loop back edge survives into the interprocedural result.
    assert!(icfg
        .graph()
        .edges()
        .any(|e| store.edge_endpoints(e) == (helper_nodes[2], helper_nodes[1])));
}

#[test]
fn whole_pipeline_is_idempotent() {
    let mut store = GraphStore::new();
    let (main, _, helper, _, leaf) = build_program(&mut store);

    analyze_all(&mut store, &CancellationToken::new());
    let expandables = BTreeSet::from([helper, leaf]);
    let first = Icfg::synthesize(&mut store, main, &expandables).expect("synthesis failed");

    let nodes = store.node_count();
    let edges = store.edge_count();

    analyze_all(&mut store, &CancellationToken::new());
    let second = Icfg::synthesize(&mut store, main, &expandables).expect("synthesis failed");

    assert_eq!(store.node_count(), nodes);
    assert_eq!(store.edge_count(), edges);
    assert_eq!(first.graph(), second.graph());
}

#[test]
fn multi_exit_function_gets_one_master_exit() {
    let mut store = GraphStore::new();
    // 0 -> 1, 0 -> 2, both 1 and 2 are exits.
    let (function, _) = build_function(&mut store, 3, &[(0, 1), (0, 2)], 0, &[1, 2]);

    let cfg = store.function_cfg(function);
    let wrapped = UniqueEntryExitGraph::new(&mut store, &cfg, false).expect("wrap failed");
    assert!(wrapped.synthesized_exit());
    assert!(!wrapped.synthesized_entry());
    assert!(store.node_has_tag(wrapped.exit(), tags::MASTER_EXIT));
    assert_eq!(store.owner(wrapped.exit()), Some(function));

    // Re-wrapping reuses the same master node.
    let cfg = store.function_cfg(function);
    let again = UniqueEntryExitGraph::new(&mut store, &cfg, false).expect("wrap failed");
    assert_eq!(again.exit(), wrapped.exit());
}
