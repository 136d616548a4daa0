// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # flowscope
//!
//! Control-flow analysis over a tagged property graph: unique-entry/exit CFG
//! wrapping, dominator and post-dominator trees with dominance frontiers, loop
//! identification and classification, strongly connected components, and
//! interprocedural CFG synthesis.
//!
//! ## Data model
//!
//! All analyses operate on a [`GraphStore`], a directed multigraph whose nodes
//! and edges carry string tags and string attributes. Program structure is
//! expressed entirely through tags (see [`graph::tags`]): a function is a node
//! tagged as such, its CFG statements are nodes owned by it, and analyses both
//! read their inputs and persist their results as tags and edges in the store.
//! Result edges are written through find-or-create primitives, so every
//! analysis can be re-run over an unmutated store without duplicating
//! anything.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowscope::{analyze_all, CancellationToken, GraphStore};
//!
//! let mut store = GraphStore::new();
//! // ... populate functions, CFG nodes, and CFG edges ...
//!
//! let outcome = analyze_all(&mut store, &CancellationToken::new());
//! println!("analyzed {} functions", outcome.analyzed().len());
//! ```
//!
//! ## Architecture
//!
//! - [`graph`] - The tagged multigraph store, subgraph views, and the tag
//!   vocabulary
//! - [`analysis`] - The analyses: entry/exit wrapping, dominance, loops,
//!   strongly connected components, interprocedural synthesis, and the batch
//!   driver
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`](Result):
//!
//! ```rust,ignore
//! use flowscope::{Error, GraphStore, UniqueEntryExitGraph};
//!
//! # fn demo(store: &mut GraphStore, cfg: &flowscope::Subgraph) {
//! match UniqueEntryExitGraph::new(store, cfg, false) {
//!     Ok(wrapped) => println!("entry is {}", wrapped.entry()),
//!     Err(Error::InvalidArgument(message)) => println!("bad input: {message}"),
//!     Err(e) => println!("error: {e}"),
//! }
//! # }
//! ```

#[macro_use]
pub(crate) mod error;

pub mod analysis;
pub mod graph;

/// `flowscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`]. Used consistently throughout the crate for all fallible
/// operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `flowscope` Error type
///
/// The main error type for all operations in this crate. Covers invalid
/// analysis inputs, internal computation failures, and cancellation.
pub use error::Error;

pub use analysis::{
    analyze_all, BatchOutcome, CancellationToken, DominanceAnalysis, Icfg, LoopClassification,
    SccAnalysis, SynthesisContext, UniqueEntryExitGraph,
};
pub use graph::{EdgeId, GraphStore, NodeId, Subgraph};
