/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Graph file persistence (serde_json).
//!
//! The on-disk shape is a flat document:
//!
//! ```json
//! {
//!   "bidirectional": true,
//!   "vertex": [{"id": 1, "name": "a", "x": 0.0, "y": 0.0}],
//!   "edge": [{"id": 1, "a": 1, "b": 2, "weight": 1.0}]
//! }
//! ```
//!
//! Loading validates every edge endpoint against the file's own vertex
//! table before touching the model, so a malformed file leaves the
//! in-memory graph unchanged. File ids that collide with live elements
//! are renumbered on load (fresh id, endpoints remapped), which makes
//! loading the same file twice additive rather than an error.

use euclid::default::Point2D;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::PersistenceError;
use crate::graph::{EdgeId, Graph, VertexId};

fn default_bidirectional() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

/// Top-level graph document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphFile {
    #[serde(default = "default_bidirectional")]
    pub bidirectional: bool,

    #[serde(default)]
    pub vertex: Vec<FileVertex>,

    #[serde(default)]
    pub edge: Vec<FileEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileVertex {
    pub id: u64,

    #[serde(default)]
    pub name: String,

    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEdge {
    pub id: u64,

    /// First endpoint's vertex id (file-scoped).
    pub a: u64,

    /// Second endpoint's vertex id (file-scoped).
    pub b: u64,

    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// Capture the graph into its file shape.
pub fn to_file(graph: &Graph) -> GraphFile {
    GraphFile {
        bidirectional: graph.bidirectional(),
        vertex: graph
            .vertices()
            .map(|v| FileVertex {
                id: v.id.0,
                name: v.name.clone(),
                x: v.position.x,
                y: v.position.y,
            })
            .collect(),
        edge: graph
            .edges()
            .map(|e| FileEdge {
                id: e.id.0,
                a: e.a.0,
                b: e.b.0,
                weight: e.weight,
            })
            .collect(),
    }
}

/// Apply a graph document on top of the current graph contents.
///
/// Validates first, mutates second: on any error the graph is exactly
/// as it was. Colliding ids are renumbered through `file_id → actual`
/// maps so edges always land on the vertices their file defined.
pub fn apply(graph: &mut Graph, file: &GraphFile) -> Result<(), PersistenceError> {
    let file_vertex_ids: std::collections::HashSet<u64> =
        file.vertex.iter().map(|v| v.id).collect();
    for edge in &file.edge {
        if edge.a == edge.b {
            return Err(crate::error::GraphError::SelfLoop(VertexId(edge.a)).into());
        }
        for endpoint in [edge.a, edge.b] {
            if !file_vertex_ids.contains(&endpoint) {
                return Err(PersistenceError::UnknownVertex {
                    edge: edge.id,
                    vertex: endpoint,
                });
            }
        }
    }
    if !graph.is_editable() {
        return Err(crate::error::GraphError::NotEditable.into());
    }

    graph.set_bidirectional(file.bidirectional);

    let mut vertex_ids: HashMap<u64, VertexId> = HashMap::new();
    for v in &file.vertex {
        let position = Point2D::new(v.x, v.y);
        let actual = match graph.add_vertex_with_id(VertexId(v.id), v.name.clone(), position) {
            Ok(id) => id,
            Err(crate::error::GraphError::DuplicateId(_)) => {
                let fresh = graph.add_vertex(v.name.clone(), position)?;
                debug!("vertex id {} already live, renumbered to {fresh}", v.id);
                fresh
            }
            Err(other) => return Err(other.into()),
        };
        vertex_ids.insert(v.id, actual);
    }

    for e in &file.edge {
        // Endpoint presence was validated up front.
        let (Some(&a), Some(&b)) = (vertex_ids.get(&e.a), vertex_ids.get(&e.b)) else {
            return Err(PersistenceError::UnknownVertex {
                edge: e.id,
                vertex: e.a,
            });
        };
        match graph.add_edge_with_id(EdgeId(e.id), a, b, e.weight) {
            Ok(_) => {}
            Err(crate::error::GraphError::DuplicateId(_)) => {
                let fresh = graph.add_edge(a, b, e.weight)?;
                debug!("edge id {} already live, renumbered to {fresh}", e.id);
            }
            Err(other) => return Err(other.into()),
        }
    }
    Ok(())
}

/// Load a graph file from disk into the graph.
pub fn load_into(graph: &mut Graph, path: &Path) -> Result<(), PersistenceError> {
    let text = fs::read_to_string(path)?;
    let file: GraphFile = serde_json::from_str(&text)?;
    apply(graph, &file)?;
    debug!(
        "loaded {}: {} vertices, {} edges",
        path.display(),
        file.vertex.len(),
        file.edge.len()
    );
    Ok(())
}

/// Save the graph to disk in the document shape.
pub fn save(graph: &Graph, path: &Path) -> Result<(), PersistenceError> {
    let file = to_file(graph);
    let text = serde_json::to_string_pretty(&file)?;
    if let Err(err) = fs::write(path, &text) {
        warn!("failed to save graph to {}: {err}", path.display());
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ElementState;

    fn sample_file() -> GraphFile {
        serde_json::from_str(
            r#"{
                "bidirectional": false,
                "vertex": [
                    {"id": 1, "name": "start", "x": 0.0, "y": 0.0},
                    {"id": 2, "name": "end", "x": 10.0, "y": 5.0}
                ],
                "edge": [
                    {"id": 1, "a": 1, "b": 2, "weight": 2.5}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_apply_builds_model() {
        let mut graph = Graph::new();
        apply(&mut graph, &sample_file()).unwrap();

        assert!(!graph.bidirectional());
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.edge_count(), 1);

        let start = graph.vertex(VertexId(1)).unwrap();
        assert_eq!(start.name, "start");
        assert_eq!(start.position, Point2D::new(0.0, 0.0));

        let edge = graph.edge(EdgeId(1)).unwrap();
        assert_eq!(edge.a, VertexId(1));
        assert_eq!(edge.b, VertexId(2));
        assert_eq!(edge.weight, 2.5);
        assert_eq!(edge.state(), ElementState::None);
    }

    #[test]
    fn test_defaults_for_omitted_fields() {
        let file: GraphFile = serde_json::from_str(
            r#"{
                "vertex": [
                    {"id": 1, "x": 0.0, "y": 0.0},
                    {"id": 2, "x": 1.0, "y": 1.0}
                ],
                "edge": [{"id": 1, "a": 1, "b": 2}]
            }"#,
        )
        .unwrap();
        assert!(file.bidirectional);
        assert_eq!(file.vertex[0].name, "");
        assert_eq!(file.edge[0].weight, 1.0);
    }

    #[test]
    fn test_unknown_endpoint_leaves_model_unchanged() {
        let mut file = sample_file();
        file.edge.push(FileEdge {
            id: 2,
            a: 1,
            b: 42,
            weight: 1.0,
        });

        let mut graph = Graph::new();
        let result = apply(&mut graph, &file);
        assert!(matches!(
            result,
            Err(PersistenceError::UnknownVertex { edge: 2, vertex: 42 })
        ));
        assert_eq!(graph.vertex_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_self_loop_edge_leaves_model_unchanged() {
        let mut file = sample_file();
        file.edge.push(FileEdge {
            id: 2,
            a: 2,
            b: 2,
            weight: 1.0,
        });

        let mut graph = Graph::new();
        let result = apply(&mut graph, &file);
        assert!(matches!(
            result,
            Err(PersistenceError::Model(crate::error::GraphError::SelfLoop(
                VertexId(2)
            )))
        ));
        assert_eq!(graph.vertex_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_loading_twice_renumbers_instead_of_failing() {
        let mut graph = Graph::new();
        apply(&mut graph, &sample_file()).unwrap();
        apply(&mut graph, &sample_file()).unwrap();

        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 2);
        // The renumbered copy's edge connects the renumbered vertices,
        // not the originals.
        let copy_edge = graph.edge_at(1).unwrap();
        assert_ne!(copy_edge.a, VertexId(1));
        assert_ne!(copy_edge.b, VertexId(2));
        assert!(graph.is_connected(copy_edge.a, copy_edge.b));
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let mut graph = Graph::new();
        apply(&mut graph, &sample_file()).unwrap();

        let saved = to_file(&graph);
        let mut reloaded = Graph::new();
        apply(&mut reloaded, &saved).unwrap();

        assert_eq!(reloaded.bidirectional(), graph.bidirectional());
        assert_eq!(reloaded.vertex_count(), graph.vertex_count());
        assert_eq!(reloaded.edge_count(), graph.edge_count());
        let original: Vec<_> = graph.vertices().map(|v| (v.id, v.name.clone())).collect();
        let round: Vec<_> = reloaded.vertices().map(|v| (v.id, v.name.clone())).collect();
        assert_eq!(original, round);
    }

    #[test]
    fn test_file_io_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");

        let mut graph = Graph::new();
        apply(&mut graph, &sample_file()).unwrap();
        save(&graph, &path).unwrap();

        let mut reloaded = Graph::new();
        load_into(&mut reloaded, &path).unwrap();
        assert_eq!(reloaded.vertex_count(), 2);
        assert_eq!(reloaded.edge_count(), 1);
        assert_eq!(reloaded.edge(EdgeId(1)).unwrap().weight, 2.5);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut graph = Graph::new();
        assert!(matches!(
            load_into(&mut graph, &path),
            Err(PersistenceError::Json(_))
        ));
        assert_eq!(graph.vertex_count(), 0);
    }
}
