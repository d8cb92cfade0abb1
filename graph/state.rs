/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Traversal state carried by every graph element.
//!
//! The four states encode *meaning* for visualization and algorithm
//! signaling, not an ordering: any state is reachable from any other.
//! The only bookkeeping tied to transitions is the per-vertex
//! active-edge counter, maintained by [`Graph::set_edge_state`].
//!
//! [`Graph::set_edge_state`]: super::Graph::set_edge_state

use super::{EdgeId, VertexId};

/// Traversal state of a vertex or edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ElementState {
    /// Untouched by the current run.
    #[default]
    None,

    /// Currently being examined by the algorithm.
    Testing,

    /// Part of the algorithm's answer (e.g. the found path).
    Active,

    /// Ruled out by the algorithm.
    Invalid,
}

/// Identity of an element whose state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef {
    Vertex(VertexId),
    Edge(EdgeId),
}

/// A single state transition, as observed by the render hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub element: ElementRef,
    pub state: ElementState,
}

/// Injected rendering callback.
///
/// When animation is enabled the run host invokes this synchronously
/// for every transition, so the observed order is exactly the worker's
/// call order. When animation is disabled, transitions batch silently
/// and the UI redraws once at end-of-run.
pub type RenderHook = Box<dyn Fn(StateChange) + Send + Sync>;
