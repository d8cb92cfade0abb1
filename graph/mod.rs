/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Graph data structures for interactive editing and scripted traversal.
//!
//! Core structures:
//! - `Graph`: main container backed by petgraph::StableGraph, plus the
//!   ordered sequences and id indexes positional access needs
//! - `Vertex`: named, positioned element with per-run traversal state
//!   and an incrementally maintained active-edge counter
//! - `Edge`: weighted connection between two live vertices
//!
//! Identity is a pair of monotonic counters owned by the graph
//! instance; ids are never reused within a session and reset only on
//! an explicit new graph. Structural mutation (add/remove) is gated on
//! the `editable` flag, which the execution controller clears while an
//! algorithm run is in progress.

use euclid::default::Point2D;
use petgraph::Undirected;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use std::collections::HashMap;
use std::fmt;

use crate::error::GraphError;

pub mod state;
pub use state::{ElementRef, ElementState, RenderHook, StateChange};

/// Stable vertex handle (petgraph NodeIndex — survives other deletions)
pub type NodeKey = NodeIndex;

/// Stable edge handle (petgraph EdgeIndex)
pub type EdgeKey = EdgeIndex;

/// Session-unique vertex identity, assigned monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u64);

/// Session-unique edge identity, assigned monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u64);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A vertex in the graph.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Stable vertex identity.
    pub id: VertexId,

    /// User-visible name (may be empty).
    pub name: String,

    /// Position in canvas space; mutable during editing only.
    pub position: Point2D<f32>,

    /// Traversal state for the current run.
    state: ElementState,

    /// Count of incident edges currently in ACTIVE state. Maintained
    /// incrementally on every edge transition touching this vertex.
    active_edges: usize,

    /// Incident edges in connection order (insertion order, not
    /// canonical).
    incident: Vec<EdgeKey>,

    /// Adjacent-vertex-id → connecting edge. Last-writer-wins under
    /// parallel edges; used for interactive duplicate prevention, not
    /// by algorithms.
    neighbor: HashMap<VertexId, EdgeKey>,
}

impl Vertex {
    pub fn state(&self) -> ElementState {
        self.state
    }

    /// Number of incident edges currently ACTIVE.
    pub fn active_edge_count(&self) -> usize {
        self.active_edges
    }

    /// Number of incident edges.
    pub fn edge_count(&self) -> usize {
        self.incident.len()
    }

    fn note_edge_transition(&mut self, old: ElementState, new: ElementState) {
        if old != ElementState::Active && new == ElementState::Active {
            self.active_edges += 1;
        }
        if old == ElementState::Active && new != ElementState::Active {
            self.active_edges -= 1;
        }
    }
}

/// An edge between two live vertices.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Stable edge identity.
    pub id: EdgeId,

    /// First endpoint. The (a, b) order carries direction when the
    /// graph renders unidirectionally; traversal ignores it.
    pub a: VertexId,

    /// Second endpoint.
    pub b: VertexId,

    /// Connection weight.
    pub weight: f64,

    /// Traversal state for the current run.
    state: ElementState,
}

impl Edge {
    pub fn state(&self) -> ElementState {
        self.state
    }

    /// The endpoint opposite `v`, or `None` if `v` is not an endpoint.
    pub fn adjacent(&self, v: VertexId) -> Option<VertexId> {
        if self.a == v {
            Some(self.b)
        } else if self.b == v {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Main graph container.
pub struct Graph {
    /// The underlying petgraph stable graph.
    inner: StableGraph<Vertex, Edge, Undirected>,

    /// Vertices in insertion order (positional access).
    vertex_order: Vec<NodeKey>,

    /// Edges in insertion order.
    edge_order: Vec<EdgeKey>,

    id_to_vertex: HashMap<VertexId, NodeKey>,
    id_to_edge: HashMap<EdgeId, EdgeKey>,

    /// Next id to assign; monotonic, never reused within a session.
    next_vertex_id: u64,
    next_edge_id: u64,

    /// Rendering-only flag: when false, edges draw with a direction
    /// arrow. Traversal treats every edge as bidirectional regardless.
    bidirectional: bool,

    /// Structural mutation gate; cleared while a run is in progress.
    editable: bool,
}

impl Graph {
    /// Create a new empty graph with fresh id counters.
    pub fn new() -> Self {
        Self {
            inner: StableGraph::default(),
            vertex_order: Vec::new(),
            edge_order: Vec::new(),
            id_to_vertex: HashMap::new(),
            id_to_edge: HashMap::new(),
            next_vertex_id: 1,
            next_edge_id: 1,
            bidirectional: true,
            editable: true,
        }
    }

    /// Reset to an empty graph: clears all elements and restarts the
    /// id counters.
    pub fn clear(&mut self) -> Result<(), GraphError> {
        self.ensure_editable()?;
        *self = Graph {
            bidirectional: self.bidirectional,
            ..Graph::new()
        };
        Ok(())
    }

    pub fn bidirectional(&self) -> bool {
        self.bidirectional
    }

    pub fn set_bidirectional(&mut self, bidirectional: bool) {
        self.bidirectional = bidirectional;
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Flip the structural-mutation gate. Called by the execution
    /// controller around runs; algorithm code never sees the model
    /// directly and cannot reach this.
    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    fn ensure_editable(&self) -> Result<(), GraphError> {
        if self.editable {
            Ok(())
        } else {
            Err(GraphError::NotEditable)
        }
    }

    // --- vertices ---

    /// Add a vertex with an auto-assigned id.
    pub fn add_vertex(
        &mut self,
        name: impl Into<String>,
        position: Point2D<f32>,
    ) -> Result<VertexId, GraphError> {
        self.ensure_editable()?;
        let id = VertexId(self.next_vertex_id);
        self.insert_vertex(id, name.into(), position);
        Ok(id)
    }

    /// Add a vertex with an explicit id (graph-file load). The id must
    /// not collide with a live vertex; the counter advances past it.
    pub fn add_vertex_with_id(
        &mut self,
        id: VertexId,
        name: impl Into<String>,
        position: Point2D<f32>,
    ) -> Result<VertexId, GraphError> {
        self.ensure_editable()?;
        if self.id_to_vertex.contains_key(&id) {
            return Err(GraphError::DuplicateId(id.0));
        }
        self.insert_vertex(id, name.into(), position);
        Ok(id)
    }

    fn insert_vertex(&mut self, id: VertexId, name: String, position: Point2D<f32>) {
        if id.0 >= self.next_vertex_id {
            self.next_vertex_id = id.0 + 1;
        }
        let key = self.inner.add_node(Vertex {
            id,
            name,
            position,
            state: ElementState::None,
            active_edges: 0,
            incident: Vec::new(),
            neighbor: HashMap::new(),
        });
        self.vertex_order.push(key);
        self.id_to_vertex.insert(id, key);
    }

    /// Remove a vertex, cascading through every incident edge first so
    /// no edge ever references a dead vertex.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<(), GraphError> {
        self.ensure_editable()?;
        let key = *self
            .id_to_vertex
            .get(&id)
            .ok_or(GraphError::VertexNotFound(id))?;

        // Snapshot first: removing edges mutates the incident list we
        // would otherwise be iterating.
        let incident: Vec<EdgeId> = self.inner[key]
            .incident
            .iter()
            .filter_map(|ek| self.inner.edge_weight(*ek).map(|e| e.id))
            .collect();
        for edge_id in incident {
            self.remove_edge(edge_id)?;
        }

        self.inner.remove_node(key);
        self.vertex_order.retain(|k| *k != key);
        self.id_to_vertex.remove(&id);
        Ok(())
    }

    /// 0-based positional access into the vertex sequence.
    pub fn vertex_at(&self, index: usize) -> Option<&Vertex> {
        let key = *self.vertex_order.get(index)?;
        self.inner.node_weight(key)
    }

    /// Id lookup; absent after deletion.
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        let key = *self.id_to_vertex.get(&id)?;
        self.inner.node_weight(key)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_order.len()
    }

    /// Iterate vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertex_order
            .iter()
            .filter_map(|k| self.inner.node_weight(*k))
    }

    /// Rename a vertex (editing-only).
    pub fn set_vertex_name(
        &mut self,
        id: VertexId,
        name: impl Into<String>,
    ) -> Result<(), GraphError> {
        self.ensure_editable()?;
        let key = *self
            .id_to_vertex
            .get(&id)
            .ok_or(GraphError::VertexNotFound(id))?;
        self.inner[key].name = name.into();
        Ok(())
    }

    /// Move a vertex (editing-only).
    pub fn set_vertex_position(
        &mut self,
        id: VertexId,
        position: Point2D<f32>,
    ) -> Result<(), GraphError> {
        self.ensure_editable()?;
        let key = *self
            .id_to_vertex
            .get(&id)
            .ok_or(GraphError::VertexNotFound(id))?;
        self.inner[key].position = position;
        Ok(())
    }

    // --- edges ---

    /// Connect two distinct live vertices with an auto-assigned id.
    /// Parallel edges between the same pair are allowed; the model does
    /// not deduplicate (see [`Graph::neighbor_edge`] for the
    /// interactive duplicate check).
    pub fn add_edge(
        &mut self,
        a: VertexId,
        b: VertexId,
        weight: f64,
    ) -> Result<EdgeId, GraphError> {
        self.ensure_editable()?;
        let id = EdgeId(self.next_edge_id);
        self.insert_edge(id, a, b, weight)
    }

    /// Connect with an explicit id (graph-file load).
    pub fn add_edge_with_id(
        &mut self,
        id: EdgeId,
        a: VertexId,
        b: VertexId,
        weight: f64,
    ) -> Result<EdgeId, GraphError> {
        self.ensure_editable()?;
        if self.id_to_edge.contains_key(&id) {
            return Err(GraphError::DuplicateId(id.0));
        }
        self.insert_edge(id, a, b, weight)
    }

    fn insert_edge(
        &mut self,
        id: EdgeId,
        a: VertexId,
        b: VertexId,
        weight: f64,
    ) -> Result<EdgeId, GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        let ka = *self
            .id_to_vertex
            .get(&a)
            .ok_or(GraphError::VertexNotFound(a))?;
        let kb = *self
            .id_to_vertex
            .get(&b)
            .ok_or(GraphError::VertexNotFound(b))?;

        if id.0 >= self.next_edge_id {
            self.next_edge_id = id.0 + 1;
        }
        let ek = self.inner.add_edge(
            ka,
            kb,
            Edge {
                id,
                a,
                b,
                weight,
                state: ElementState::None,
            },
        );
        self.edge_order.push(ek);
        self.id_to_edge.insert(id, ek);

        self.inner[ka].incident.push(ek);
        self.inner[ka].neighbor.insert(b, ek);
        self.inner[kb].incident.push(ek);
        self.inner[kb].neighbor.insert(a, ek);
        Ok(id)
    }

    /// Remove an edge, detaching it from both endpoints' incident
    /// sequences and neighbor maps.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<(), GraphError> {
        self.ensure_editable()?;
        let ek = *self
            .id_to_edge
            .get(&id)
            .ok_or(GraphError::EdgeNotFound(id))?;

        // Go through the normal transition rule first so the
        // active-edge counters stay consistent even when an ACTIVE
        // edge is deleted.
        self.transition_edge(ek, ElementState::None);

        let (a, b) = {
            let edge = &self.inner[ek];
            (edge.a, edge.b)
        };
        self.detach_endpoint(a, b, ek);
        self.detach_endpoint(b, a, ek);

        self.inner.remove_edge(ek);
        self.edge_order.retain(|k| *k != ek);
        self.id_to_edge.remove(&id);
        Ok(())
    }

    fn detach_endpoint(&mut self, v: VertexId, other: VertexId, ek: EdgeKey) {
        let Some(key) = self.id_to_vertex.get(&v).copied() else {
            return;
        };
        self.inner[key].incident.retain(|k| *k != ek);
        if self.inner[key].neighbor.get(&other) == Some(&ek) {
            self.inner[key].neighbor.remove(&other);
            // Re-point to a surviving parallel edge, if any, so the
            // neighbor map stays in sync with the incident sequence.
            let parallel = self.inner[key].incident.iter().copied().find(|k| {
                self.inner
                    .edge_weight(*k)
                    .is_some_and(|e| e.adjacent(v) == Some(other))
            });
            if let Some(parallel) = parallel {
                self.inner[key].neighbor.insert(other, parallel);
            }
        }
    }

    /// 0-based positional access into the edge sequence.
    pub fn edge_at(&self, index: usize) -> Option<&Edge> {
        let key = *self.edge_order.get(index)?;
        self.inner.edge_weight(key)
    }

    /// Id lookup; absent after deletion.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        let key = *self.id_to_edge.get(&id)?;
        self.inner.edge_weight(key)
    }

    pub fn edge_count(&self) -> usize {
        self.edge_order.len()
    }

    /// Iterate edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edge_order
            .iter()
            .filter_map(|k| self.inner.edge_weight(*k))
    }

    /// Update an edge's weight. Not gated on `editable`: weight is a
    /// value mutation algorithms may perform mid-run.
    pub fn set_edge_weight(&mut self, id: EdgeId, weight: f64) -> Result<(), GraphError> {
        let key = *self
            .id_to_edge
            .get(&id)
            .ok_or(GraphError::EdgeNotFound(id))?;
        self.inner[key].weight = weight;
        Ok(())
    }

    // --- adjacency queries ---

    /// The edge at `index` (0-based) in `v`'s incident sequence.
    pub fn edge_of(&self, v: VertexId, index: usize) -> Option<&Edge> {
        let key = *self.id_to_vertex.get(&v)?;
        let ek = *self.inner.node_weight(key)?.incident.get(index)?;
        self.inner.edge_weight(ek)
    }

    /// The vertex on the far side of `e` from `v`.
    pub fn adjacent(&self, v: VertexId, e: EdgeId) -> Option<&Vertex> {
        let other = self.edge(e)?.adjacent(v)?;
        self.vertex(other)
    }

    /// Symmetric lookup for an existing connection between two
    /// vertices. Under parallel edges this returns the most recently
    /// recorded one; algorithms needing the multigraph iterate the
    /// incident sequence instead.
    pub fn neighbor_edge(&self, v: VertexId, other: VertexId) -> Option<&Edge> {
        let key = *self.id_to_vertex.get(&v)?;
        let ek = *self.inner.node_weight(key)?.neighbor.get(&other)?;
        self.inner.edge_weight(ek)
    }

    /// Whether any edge connects `v` and `other`.
    pub fn is_connected(&self, v: VertexId, other: VertexId) -> bool {
        let Some(key) = self.id_to_vertex.get(&v) else {
            return false;
        };
        let Some(vertex) = self.inner.node_weight(*key) else {
            return false;
        };
        vertex.incident.iter().any(|ek| {
            self.inner
                .edge_weight(*ek)
                .is_some_and(|e| e.adjacent(v) == Some(other))
        })
    }

    // --- traversal state ---

    /// Set a vertex's state. No counter side effect.
    pub fn set_vertex_state(&mut self, id: VertexId, state: ElementState) -> Option<StateChange> {
        let key = *self.id_to_vertex.get(&id)?;
        self.inner.node_weight_mut(key)?.state = state;
        Some(StateChange {
            element: ElementRef::Vertex(id),
            state,
        })
    }

    /// Set an edge's state, updating both endpoints' active-edge
    /// counters before recording the new state.
    pub fn set_edge_state(&mut self, id: EdgeId, state: ElementState) -> Option<StateChange> {
        let ek = *self.id_to_edge.get(&id)?;
        self.transition_edge(ek, state);
        Some(StateChange {
            element: ElementRef::Edge(id),
            state,
        })
    }

    fn transition_edge(&mut self, ek: EdgeKey, state: ElementState) {
        let Some((ka, kb)) = self.inner.edge_endpoints(ek) else {
            return;
        };
        let old = self.inner[ek].state;
        self.inner[ka].note_edge_transition(old, state);
        self.inner[kb].note_edge_transition(old, state);
        self.inner[ek].state = state;
    }

    /// Reset every element to NONE (start-of-run / clear button). Edge
    /// resets go through the normal transition rule, so the counters
    /// land on zero without a rescan.
    pub fn clear_states(&mut self) {
        let edges: Vec<EdgeKey> = self.edge_order.clone();
        for ek in edges {
            self.transition_edge(ek, ElementState::None);
        }
        let vertices: Vec<NodeKey> = self.vertex_order.clone();
        for key in vertices {
            if let Some(vertex) = self.inner.node_weight_mut(key) {
                vertex.state = ElementState::None;
            }
        }
    }

    /// Verification-only: recount `v`'s ACTIVE incident edges by full
    /// scan. The live counter is maintained incrementally; this exists
    /// so tests can check the two agree.
    pub fn recount_active_edges(&self, v: VertexId) -> Option<usize> {
        let key = *self.id_to_vertex.get(&v)?;
        let vertex = self.inner.node_weight(key)?;
        Some(
            vertex
                .incident
                .iter()
                .filter(|ek| {
                    self.inner
                        .edge_weight(**ek)
                        .is_some_and(|e| e.state == ElementState::Active)
                })
                .count(),
        )
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
