//! Tagged directed multigraph storage.
//!
//! This module provides the graph substrate the analyses run against. It mirrors
//! the shape of the external program-graph platform the library is embedded in:
//! opaque node and edge identities, string tag sets, key/value attributes, and
//! multigraph semantics.
//!
//! # Components
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`NodeId`] / [`EdgeId`] | Strongly-typed arena indices |
//! | [`GraphStore`] | Arena owning all nodes, edges, tags, and attributes |
//! | [`Subgraph`] | A (node set, edge set) view over the store |
//! | [`tags`] | The tag/attribute vocabulary shared with the collaborator |
//!
//! # Example
//!
//! ```rust,ignore
//! use flowscope::{graph::tags, GraphStore, Subgraph};
//!
//! let mut store = GraphStore::new();
//! let function = store.create_node();
//! store.tag_node(function, tags::FUNCTION);
//!
//! let stmt = store.create_node();
//! store.tag_node(stmt, tags::CONTROL_FLOW_NODE);
//! store.tag_node(stmt, tags::CONTROL_FLOW_ROOT);
//! store.set_owner(stmt, function);
//!
//! let cfg: Subgraph = store.function_cfg(function);
//! assert_eq!(cfg.node_count(), 1);
//! ```

mod edge;
mod node;
mod store;
mod subgraph;
pub mod tags;

pub use edge::EdgeId;
pub use node::NodeId;
pub use store::GraphStore;
pub use subgraph::Subgraph;
