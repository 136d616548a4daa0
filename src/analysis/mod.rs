//! Control-flow analyses over the tagged graph store.
//!
//! Every analysis follows the same contract: it reads program structure from
//! tags in a [`GraphStore`](crate::graph::GraphStore), computes in memory, and
//! persists its result as tags and edges through find-or-create primitives so
//! that re-running it on an unmutated store is a no-op.
//!
//! # Components
//!
//! - [`UniqueEntryExitGraph`] - Wraps a function CFG so it has exactly one
//!   entry and one exit, synthesizing master nodes when needed
//! - [`DominanceAnalysis`] - Immediate dominators, immediate post-dominators,
//!   and both dominance frontiers over a wrapped CFG
//! - [`LoopClassification`] - Loop headers, back edges, and irreducible-loop
//!   reentry structure
//! - [`SccAnalysis`] - Strongly connected components of an arbitrary subgraph,
//!   with recursion detection and a condensation-order iterator
//! - [`Icfg`] - Interprocedural CFG synthesis by call-site splicing
//! - [`analyze_all`] - Batch driver running the intraprocedural analyses over
//!   every function in a store

mod batch;
mod dominance;
mod entry_exit;
mod icfg;
mod loops;
mod scc;

pub use batch::{analyze_all, BatchOutcome, CancellationToken};
pub use dominance::DominanceAnalysis;
pub use entry_exit::UniqueEntryExitGraph;
pub use icfg::{Icfg, SynthesisContext};
pub use loops::LoopClassification;
pub use scc::{DagIterator, SccAnalysis};
