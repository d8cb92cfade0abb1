//! Breadth-first search between two vertices.

use std::collections::HashSet;

use crate::error::ScriptError;
use crate::graph::ElementState;
use crate::script::{EdgeHandle, HostProxy, Script, VertexHandle};

use super::{path_line, resolve_destination, resolve_origin};

/// BFS from `begin` to `end` (script vars, with positional defaults).
/// Marks the frontier TESTING as it expands and walks the discovered
/// path back as ACTIVE.
#[derive(Debug, Default)]
pub struct Bfs {
    /// Override for the `begin` var.
    pub origin: Option<u64>,
    /// Override for the `end` var.
    pub destination: Option<u64>,
}

/// One discovered vertex plus the edge that reached it.
struct Discovered {
    vertex: VertexHandle,
    reached_by: Option<(usize, EdgeHandle)>,
}

impl Script for Bfs {
    fn name(&self) -> &str {
        "bfs"
    }

    fn run(&mut self, app: &HostProxy) -> Result<(), ScriptError> {
        let origin = resolve_origin(app, self.origin)?;
        let destination = resolve_destination(app, self.destination)?;

        origin.set_state(ElementState::Testing);
        let mut visited: HashSet<u64> = HashSet::new();
        visited.insert(origin.id());

        // Parent pointers live in the arena; index 0 is the origin.
        let mut arena = vec![Discovered {
            vertex: origin.clone(),
            reached_by: None,
        }];
        let mut found = if origin == destination { Some(0) } else { None };

        let mut head = 0;
        while head < arena.len() && found.is_none() {
            if app.is_stopped() {
                return Ok(());
            }
            let current = arena[head].vertex.clone();
            for n in 1..=current.edge_count() {
                let Some(edge) = current.edge_at(n) else {
                    continue;
                };
                let Some(next) = current.adjacent(&edge) else {
                    continue;
                };
                if !visited.insert(next.id()) {
                    continue;
                }
                edge.set_state(ElementState::Testing);
                next.set_state(ElementState::Testing);
                app.log(format!("#testing {} -> {}", current.id(), next.id()));
                app.step();

                let reached_destination = next == destination;
                arena.push(Discovered {
                    vertex: next,
                    reached_by: Some((head, edge)),
                });
                if reached_destination {
                    found = Some(arena.len() - 1);
                    break;
                }
            }
            head += 1;
        }

        let Some(mut index) = found else {
            app.log(format!(
                "$no path from {} to {}",
                origin.id(),
                destination.id()
            ));
            return Ok(());
        };

        // Walk the parent chain back, activating as we go.
        let mut path = Vec::new();
        loop {
            let entry = &arena[index];
            entry.vertex.set_state(ElementState::Active);
            path.push(entry.vertex.id());
            let Some((parent, edge)) = &entry.reached_by else {
                break;
            };
            edge.set_state(ElementState::Active);
            index = *parent;
            app.step();
        }
        path.reverse();

        app.log(path_line("path", &path));
        app.set_solved(true);
        Ok(())
    }
}
