//! Depth-first search between two vertices.

use crate::error::ScriptError;
use crate::graph::ElementState;
use crate::script::{HostProxy, Script, VertexHandle};

use super::{path_line, resolve_destination, resolve_origin};

/// Recursive DFS from `begin` to `end`. Uses the element states
/// themselves as the visited set: only NONE vertices are entered, dead
/// branches are left INVALID, and the found path activates while the
/// recursion unwinds.
#[derive(Debug, Default)]
pub struct Dfs {
    pub origin: Option<u64>,
    pub destination: Option<u64>,
}

impl Script for Dfs {
    fn name(&self) -> &str {
        "dfs"
    }

    fn run(&mut self, app: &HostProxy) -> Result<(), ScriptError> {
        let origin = resolve_origin(app, self.origin)?;
        let destination = resolve_destination(app, self.destination)?;

        let mut path = Vec::new();
        let found = visit(app, &origin, &destination, &mut path);
        if !found {
            if !app.is_stopped() {
                app.log(format!(
                    "$no path from {} to {}",
                    origin.id(),
                    destination.id()
                ));
            }
            return Ok(());
        }

        path.reverse();
        app.log(path_line("PATH:", &path));
        app.set_solved(true);
        Ok(())
    }
}

fn visit(
    app: &HostProxy,
    vertex: &VertexHandle,
    destination: &VertexHandle,
    path: &mut Vec<u64>,
) -> bool {
    if app.is_stopped() {
        return false;
    }
    vertex.set_state(ElementState::Testing);
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
        if next.state() != ElementState::None {
            continue;
        }
        edge.set_state(ElementState::Testing);
        app.log(format!("#descending {} -> {}", vertex.id(), next.id()));
        app.step();

        if visit(app, &next, destination, path) {
            edge.set_state(ElementState::Active);
            vertex.set_state(ElementState::Active);
            path.push(vertex.id());
            return true;
        }
        edge.set_state(ElementState::Invalid);
    }

    vertex.set_state(ElementState::Invalid);
    false
}
