//! Vertex inspection: highlights one vertex and its neighborhood and
//! logs what it finds.

use crate::error::ScriptError;
use crate::graph::ElementState;
use crate::script::{HostProxy, Script};

/// Marks the chosen vertex (the `id` script var, defaulting to the
/// first vertex) ACTIVE and its neighborhood TESTING, logging a `$`
/// line per fact. Purely informational; never sets `solved`.
#[derive(Debug, Default)]
pub struct VertexInfo {
    pub vertex: Option<u64>,
}

impl Script for VertexInfo {
    fn name(&self) -> &str {
        "info"
    }

    fn run(&mut self, app: &HostProxy) -> Result<(), ScriptError> {
        let explicit = self
            .vertex
            .or_else(|| app.get_var("id").and_then(|v| v.as_u64()));
        let vertex = match explicit {
            Some(id) => app
                .vertex_by_id(id)
                .ok_or_else(|| ScriptError::new(format!("no vertex with id {id}")))?,
            None => app
                .vertex(1)
                .ok_or_else(|| ScriptError::new("graph has no vertices"))?,
        };

        vertex.set_state(ElementState::Active);
        let (x, y) = vertex.coords();
        app.log(format!(
            "$vertex {} '{}' at ({x}, {y})",
            vertex.id(),
            vertex.name()
        ));
        app.log(format!("$edges: {}", vertex.edge_count()));

        for n in 1..=vertex.edge_count() {
            if app.is_stopped() {
                return Ok(());
            }
            let Some(edge) = vertex.edge_at(n) else {
                continue;
            };
            let Some(next) = vertex.adjacent(&edge) else {
                continue;
            };
            edge.set_state(ElementState::Testing);
            next.set_state(ElementState::Testing);
            app.log(format!(
                "$-> {} '{}' via edge {} (weight {})",
                next.id(),
                next.name(),
                edge.id(),
                edge.weight()
            ));
            app.step();
        }
        Ok(())
    }
}
