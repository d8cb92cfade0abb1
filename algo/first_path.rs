//! Greedy first-path finder.

use std::collections::HashSet;

use crate::error::ScriptError;
use crate::graph::ElementState;
use crate::script::{HostProxy, Script, VertexHandle};

use super::{path_line, resolve_destination, resolve_origin};

/// Follows incident edges in connection order from `begin`, keeping
/// its own visited set and activating the first path that reaches
/// `end`. Unlike [`Dfs`](super::Dfs) it leaves abandoned branches
/// untouched, so after the run only the answer is highlighted.
#[derive(Debug, Default)]
pub struct FirstPath {
    pub origin: Option<u64>,
    pub destination: Option<u64>,
}

impl Script for FirstPath {
    fn name(&self) -> &str {
        "path"
    }

    fn run(&mut self, app: &HostProxy) -> Result<(), ScriptError> {
        let origin = resolve_origin(app, self.origin)?;
        let destination = resolve_destination(app, self.destination)?;

        let mut visited = HashSet::new();
        let mut path = Vec::new();
        let found = descend(app, &origin, &destination, &mut visited, &mut path);
        if !found {
            if !app.is_stopped() {
                app.log("#every branch exhausted");
                app.log(format!(
                    "$no path from {} to {}",
                    origin.id(),
                    destination.id()
                ));
            }
            return Ok(());
        }

        path.reverse();
        app.log(path_line("first path", &path));
        app.set_solved(true);
        Ok(())
    }
}

fn descend(
    app: &HostProxy,
    vertex: &VertexHandle,
    destination: &VertexHandle,
    visited: &mut HashSet<u64>,
    path: &mut Vec<u64>,
) -> bool {
    if app.is_stopped() || !visited.insert(vertex.id()) {
        return false;
    }
    if vertex == destination {
        vertex.set_state(ElementState::Active);
        path.push(vertex.id());
        return true;
    }

    for n in 1..=vertex.edge_count() {
        let Some(edge) = vertex.edge_at(n) else {
            continue;
        };
        let Some(next) = vertex.adjacent(&edge) else {
            continue;
        };
        if visited.contains(&next.id()) {
            continue;
        }
        app.log(format!("#trying {} -> {}", vertex.id(), next.id()));
        app.step();
        if descend(app, &next, destination, visited, path) {
            edge.set_state(ElementState::Active);
            vertex.set_state(ElementState::Active);
            path.push(vertex.id());
            return true;
        }
    }
    false
}
