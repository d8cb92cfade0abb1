/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! graphtrace: interactive graph building plus sandboxed execution of
//! algorithm code against the live graph.
//!
//! The moving parts:
//! - [`graph`]: the authoritative model (vertices, edges, traversal
//!   state, active-edge counters)
//! - [`script`]: the capability surface algorithm code runs against
//! - [`runtime`]: run lifecycle, worker thread, run log, history
//! - [`persistence`]: the JSON graph-file format
//! - [`settings`]: user settings
//! - [`algo`]: built-in demonstration algorithms

pub mod algo;
pub mod error;
pub mod graph;
pub mod persistence;
pub mod runtime;
pub mod script;
pub mod settings;

pub use error::{GraphError, PersistenceError, RunError, ScriptError};
pub use graph::{Edge, EdgeId, ElementState, Graph, StateChange, Vertex, VertexId};
pub use runtime::{ExecutionController, RunEvent, RunReport, RunState};
pub use script::{EdgeHandle, HostProxy, Script, VertexHandle};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
