/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Error taxonomy shared across the crate.
//!
//! Model and persistence boundaries return typed errors; the proxy
//! boundary returns absent sentinels (`Option`) instead, so algorithm
//! code never needs error handling for ordinary dead ends.

use thiserror::Error;

use crate::graph::{EdgeId, VertexId};

/// Errors raised at the graph-model boundary.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// An explicit id was supplied that is already held by a live element.
    #[error("id {0} is already in use")]
    DuplicateId(u64),

    /// An operation referenced a vertex that is not in the model.
    #[error("vertex {0} not found")]
    VertexNotFound(VertexId),

    /// An operation referenced an edge that is not in the model.
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    /// Structural mutation attempted while a run holds the model.
    #[error("graph is not editable while a run is in progress")]
    NotEditable,

    /// Edges must connect two distinct vertices.
    #[error("edge endpoints must be distinct (got {0} twice)")]
    SelfLoop(VertexId),
}

/// Errors raised when a run request cannot be honored.
#[derive(Debug, Error, PartialEq)]
pub enum RunError {
    /// A run is already in progress; concurrent runs are forbidden.
    #[error("a run is already in progress")]
    AlreadyRunning,

    /// There is no graph to run against.
    #[error("a non-empty graph is required to run an algorithm")]
    NothingToRun,
}

/// An error raised by algorithm code during a run.
///
/// Contained at the execution-controller boundary: the message becomes
/// a system log line and the run transitions to `Failed`. The host
/// never propagates it further.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct ScriptError(pub String);

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors raised while loading or saving files (graph, settings, log).
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    /// An edge in a graph file referenced a vertex id that the file
    /// does not define. Reported to the caller; the in-memory model is
    /// left unchanged.
    #[error("edge {edge} references unknown vertex id {vertex}")]
    UnknownVertex { edge: u64, vertex: u64 },

    /// The model rejected the loaded data (e.g. load during a run).
    #[error(transparent)]
    Model(#[from] GraphError),
}
