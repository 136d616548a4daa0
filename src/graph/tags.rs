//! Tag and attribute vocabulary shared with the surrounding graph store.
//!
//! The analyses neither own nor interpret program semantics; they consume a small
//! set of tags the collaborator guarantees on CFG and call-graph elements, and
//! write their results back as tagged edges. This module is the single place
//! where those names are defined.
//!
//! | Direction | Tag | Applied to |
//! |-----------|-----|------------|
//! | consumed | [`FUNCTION`] | function nodes |
//! | consumed | [`CONTROL_FLOW_NODE`] | CFG statement nodes |
//! | consumed | [`CONTROL_FLOW_ROOT`] | CFG entry statements |
//! | consumed | [`CONTROL_FLOW_EXIT`] | CFG exit statements |
//! | consumed | [`CONTROL_FLOW_EDGE`] | intraprocedural CFG edges |
//! | consumed | [`CALL_SITE`] | call-site statement nodes |
//! | consumed | [`INVOKED_FUNCTION`] | call-site → target function edges |
//! | consumed | [`CALL`] | function → function call edges |
//! | produced | [`IDOM`] / [`IFDOM`] | dominator-tree edges |
//! | produced | [`IPDOM`] | post-dominator-tree edges |
//! | produced | [`DOM_FRONTIER`] / [`PDOM_FRONTIER`] | frontier edges |
//! | produced | [`LOOP_BACK_EDGE`] | CFG back edges |
//! | produced | [`LOOP_HEADER`] / [`IRREDUCIBLE_LOOP`] | loop header nodes |
//! | produced | [`LOOP_REENTRY_NODE`] / [`LOOP_REENTRY_EDGE`] | irreducible reentries |
//! | produced | [`MASTER_ENTRY`] / [`MASTER_EXIT`] | synthesized super nodes |
//! | produced | [`ENTRY_EXIT_EDGE`] | super node marker edges |
//! | produced | [`ICFG_EDGE`], [`CALL_ID`] | interprocedural stitching edges |

/// Nodes representing functions; owners of CFG nodes.
pub const FUNCTION: &str = "function";

/// Statement nodes that belong to some function's control-flow graph.
pub const CONTROL_FLOW_NODE: &str = "control-flow-node";

/// CFG nodes at which control enters the function.
pub const CONTROL_FLOW_ROOT: &str = "control-flow-root";

/// CFG nodes at which control leaves the function.
pub const CONTROL_FLOW_EXIT: &str = "control-flow-exit";

/// Intraprocedural control-flow edges between CFG nodes.
pub const CONTROL_FLOW_EDGE: &str = "control-flow-edge";

/// CFG nodes that invoke another function.
pub const CALL_SITE: &str = "call-site";

/// Resolution edges from a call site to the function it invokes.
pub const INVOKED_FUNCTION: &str = "invoked-function";

/// Summary call edges between function nodes, used for recursion detection.
pub const CALL: &str = "call";

/// Immediate-dominator tree edges, written dominator → dominated.
pub const IDOM: &str = "idom";

/// Alias applied alongside [`IDOM`]; retained for consumers of the older
/// forward-dominance naming.
pub const IFDOM: &str = "ifdom";

/// Immediate-post-dominator tree edges, written post-dominator → dominated.
pub const IPDOM: &str = "ipdom";

/// Dominance-frontier edges, written node → frontier member.
pub const DOM_FRONTIER: &str = "dom-frontier";

/// Post-dominance-frontier edges, written node → frontier member.
pub const PDOM_FRONTIER: &str = "pdom-frontier";

/// CFG edges identified as loop back edges.
pub const LOOP_BACK_EDGE: &str = "loop-back-edge";

/// CFG nodes identified as loop headers.
pub const LOOP_HEADER: &str = "loop-header";

/// Loop headers whose loop can be entered without passing through them.
pub const IRREDUCIBLE_LOOP: &str = "irreducible-loop";

/// Nodes through which an irreducible loop is entered sideways.
pub const LOOP_REENTRY_NODE: &str = "loop-reentry-node";

/// Edges through which an irreducible loop is entered sideways.
pub const LOOP_REENTRY_EDGE: &str = "loop-reentry-edge";

/// Synthesized unique-entry super node, one per function.
pub const MASTER_ENTRY: &str = "master-entry";

/// Synthesized unique-exit super node, one per function.
pub const MASTER_EXIT: &str = "master-exit";

/// Marker edges connecting super nodes to the natural roots/exits.
pub const ENTRY_EXIT_EDGE: &str = "unique-entry-exit-edge";

/// Edges created by interprocedural CFG synthesis.
pub const ICFG_EDGE: &str = "interprocedural-control-flow-edge";

/// Applied to every call/return stitching edge of any call site.
pub const CALL_ID: &str = "CallID";

/// Attribute key for human-readable node names.
pub const NAME: &str = "name";

/// Attribute key recording a CFG node's innermost loop header.
pub const LOOP_HEADER_ID: &str = "loop-header-id";

/// Display name given to synthesized unique-entry nodes.
pub const MASTER_ENTRY_NAME: &str = "\u{22a4}";

/// Display name given to synthesized unique-exit nodes.
pub const MASTER_EXIT_NAME: &str = "\u{22a5}";

/// Builds the per-call-site correlation tag shared by one call site's
/// call-out edge and all of its return edges.
///
/// # Arguments
///
/// * `call_id` - The call-site counter value assigned during synthesis
#[must_use]
pub fn call_id_tag(call_id: u64) -> String {
    format!("{CALL_ID}_{call_id}")
}
