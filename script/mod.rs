/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The capability surface handed to algorithm code.
//!
//! Algorithms implement [`Script`] and receive a [`HostProxy`], never
//! the model itself. The proxy exposes reads, state/weight writes,
//! pacing and logging; structural mutation does not cross it. All
//! positional access on this surface is 1-based (vertex 1 is the
//! first), matching how users number vertices; the model underneath
//! stays 0-based.
//!
//! Handles are value-like: a [`VertexHandle`] is an id plus a shared
//! reference to the run host, re-created on every navigation step and
//! compared by id. A handle outliving its element never dangles, it
//! just reads as INVALID/empty and its writes no-op.

pub mod vars;

use std::sync::Arc;

use crate::error::ScriptError;
use crate::graph::{EdgeId, ElementState, VertexId};
use crate::runtime::RunHost;

/// An executable algorithm.
pub trait Script: Send {
    /// Name used in logs and the history file.
    fn name(&self) -> &str;

    /// Run against the proxy. An `Err` fails the run; the host logs it
    /// and survives.
    fn run(&mut self, app: &HostProxy) -> Result<(), ScriptError>;
}

/// The host capability object.
pub struct HostProxy {
    host: Arc<RunHost>,
}

impl HostProxy {
    pub fn new(host: Arc<RunHost>) -> Self {
        Self { host }
    }

    pub fn vertex_count(&self) -> usize {
        self.host.with_graph(|g| g.vertex_count())
    }

    pub fn edge_count(&self) -> usize {
        self.host.with_graph(|g| g.edge_count())
    }

    /// The `n`-th vertex, 1-based. 0 and past-the-end are absent.
    pub fn vertex(&self, n: usize) -> Option<VertexHandle> {
        let id = self
            .host
            .with_graph(|g| g.vertex_at(n.checked_sub(1)?).map(|v| v.id))?;
        Some(VertexHandle {
            host: Arc::clone(&self.host),
            id,
        })
    }

    pub fn vertex_by_id(&self, id: u64) -> Option<VertexHandle> {
        let id = VertexId(id);
        self.host.with_graph(|g| g.vertex(id).map(|v| v.id))?;
        Some(VertexHandle {
            host: Arc::clone(&self.host),
            id,
        })
    }

    /// The `n`-th edge, 1-based.
    pub fn edge(&self, n: usize) -> Option<EdgeHandle> {
        let id = self
            .host
            .with_graph(|g| g.edge_at(n.checked_sub(1)?).map(|e| e.id))?;
        Some(EdgeHandle {
            host: Arc::clone(&self.host),
            id,
        })
    }

    pub fn edge_by_id(&self, id: u64) -> Option<EdgeHandle> {
        let id = EdgeId(id);
        self.host.with_graph(|g| g.edge(id).map(|e| e.id))?;
        Some(EdgeHandle {
            host: Arc::clone(&self.host),
            id,
        })
    }

    /// Append a script line to the run log. The first character is the
    /// line's classification symbol.
    pub fn log(&self, text: impl Into<String>) {
        self.host.log_line(text, false);
    }

    /// Pacing point: bounded sleep derived from the speed setting.
    /// Call once per algorithm move; also a natural place to poll
    /// [`HostProxy::is_stopped`].
    pub fn step(&self) {
        self.host.step();
    }

    /// Non-blocking poll of the cooperative stop flag.
    pub fn is_stopped(&self) -> bool {
        self.host.is_stopped()
    }

    pub fn set_solved(&self, solved: bool) {
        self.host.set_solved(solved);
    }

    pub fn set_execution_time(&self, secs: f64) {
        self.host.set_execution_time(secs);
    }

    /// Append a point to the open region annotation.
    pub fn area_add(&self, x: f32, y: f32) {
        self.host.area_add(x, y);
    }

    /// Close the open region annotation.
    pub fn area_close(&self) {
        self.host.area_close();
    }

    /// Read a script property (`<script>.json` side-channel). Absent
    /// keys are `None`.
    pub fn get_var(&self, name: &str) -> Option<serde_json::Value> {
        self.host.get_var(name)
    }
}

/// Value-like reference to a vertex.
#[derive(Clone)]
pub struct VertexHandle {
    host: Arc<RunHost>,
    id: VertexId,
}

impl PartialEq for VertexHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for VertexHandle {}

impl std::fmt::Debug for VertexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("VertexHandle").field(&self.id.0).finish()
    }
}

impl VertexHandle {
    pub fn id(&self) -> u64 {
        self.id.0
    }

    pub fn name(&self) -> String {
        self.host
            .with_graph(|g| g.vertex(self.id).map(|v| v.name.clone()))
            .unwrap_or_default()
    }

    pub fn x(&self) -> f32 {
        self.coords().0
    }

    pub fn y(&self) -> f32 {
        self.coords().1
    }

    pub fn coords(&self) -> (f32, f32) {
        self.host
            .with_graph(|g| g.vertex(self.id).map(|v| (v.position.x, v.position.y)))
            .unwrap_or((0.0, 0.0))
    }

    /// Current traversal state. A stale handle reads INVALID.
    pub fn state(&self) -> ElementState {
        self.host
            .with_graph(|g| g.vertex(self.id).map(|v| v.state()))
            .unwrap_or(ElementState::Invalid)
    }

    pub fn set_state(&self, state: ElementState) {
        self.host.set_vertex_state(self.id, state);
    }

    pub fn edge_count(&self) -> usize {
        self.host
            .with_graph(|g| g.vertex(self.id).map(|v| v.edge_count()))
            .unwrap_or(0)
    }

    /// Count of incident ACTIVE edges (the incrementally maintained
    /// counter, not a scan).
    pub fn active_edge_count(&self) -> usize {
        self.host
            .with_graph(|g| g.vertex(self.id).map(|v| v.active_edge_count()))
            .unwrap_or(0)
    }

    /// The `n`-th incident edge in connection order, 1-based.
    pub fn edge_at(&self, n: usize) -> Option<EdgeHandle> {
        let id = self
            .host
            .with_graph(|g| g.edge_of(self.id, n.checked_sub(1)?).map(|e| e.id))?;
        Some(EdgeHandle {
            host: Arc::clone(&self.host),
            id,
        })
    }

    /// The vertex on the far side of `edge`.
    pub fn adjacent(&self, edge: &EdgeHandle) -> Option<VertexHandle> {
        let id = self
            .host
            .with_graph(|g| g.adjacent(self.id, edge.id).map(|v| v.id))?;
        Some(VertexHandle {
            host: Arc::clone(&self.host),
            id,
        })
    }

    /// An edge connecting this vertex to `other`, if any.
    pub fn edge_to(&self, other: &VertexHandle) -> Option<EdgeHandle> {
        let id = self
            .host
            .with_graph(|g| g.neighbor_edge(self.id, other.id).map(|e| e.id))?;
        Some(EdgeHandle {
            host: Arc::clone(&self.host),
            id,
        })
    }

    pub fn is_connected(&self, other: &VertexHandle) -> bool {
        self.host.with_graph(|g| g.is_connected(self.id, other.id))
    }
}

/// Value-like reference to an edge.
#[derive(Clone)]
pub struct EdgeHandle {
    host: Arc<RunHost>,
    id: EdgeId,
}

impl PartialEq for EdgeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EdgeHandle {}

impl std::fmt::Debug for EdgeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EdgeHandle").field(&self.id.0).finish()
    }
}

impl EdgeHandle {
    pub fn id(&self) -> u64 {
        self.id.0
    }

    pub fn weight(&self) -> f64 {
        self.host
            .with_graph(|g| g.edge(self.id).map(|e| e.weight))
            .unwrap_or(0.0)
    }

    pub fn set_weight(&self, weight: f64) {
        self.host.set_edge_weight(self.id, weight);
    }

    /// Current traversal state. A stale handle reads INVALID.
    pub fn state(&self) -> ElementState {
        self.host
            .with_graph(|g| g.edge(self.id).map(|e| e.state()))
            .unwrap_or(ElementState::Invalid)
    }

    pub fn set_state(&self, state: ElementState) {
        self.host.set_edge_state(self.id, state);
    }

    /// First endpoint.
    pub fn a(&self) -> Option<VertexHandle> {
        let id = self.host.with_graph(|g| g.edge(self.id).map(|e| e.a))?;
        Some(VertexHandle {
            host: Arc::clone(&self.host),
            id,
        })
    }

    /// Second endpoint.
    pub fn b(&self) -> Option<VertexHandle> {
        let id = self.host.with_graph(|g| g.edge(self.id).map(|e| e.b))?;
        Some(VertexHandle {
            host: Arc::clone(&self.host),
            id,
        })
    }

    /// The endpoint opposite `vertex`.
    pub fn adjacent(&self, vertex: &VertexHandle) -> Option<VertexHandle> {
        let id = self
            .host
            .with_graph(|g| g.edge(self.id)?.adjacent(vertex.id))?;
        Some(VertexHandle {
            host: Arc::clone(&self.host),
            id,
        })
    }
}
