/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Built-in demonstration algorithms.
//!
//! Each one is a [`Script`](crate::script::Script) consuming only the
//! proxy surface, exactly like externally authored algorithm code
//! would. They double as end-to-end fixtures for the run pipeline.
//!
//! Conventions shared by all of them:
//! - origin/destination come from script vars (`begin`, `end`, `id`)
//!   with positional defaults (first and last vertex)
//! - log lines start with a classification symbol (`$` results,
//!   `#` trace)
//! - `step()` is called once per move so runs animate and cancel

pub mod bfs;
pub mod dfs;
pub mod first_path;
pub mod vertex_info;

pub use bfs::Bfs;
pub use dfs::Dfs;
pub use first_path::FirstPath;
pub use vertex_info::VertexInfo;

use crate::error::ScriptError;
use crate::script::{HostProxy, Script, VertexHandle};

/// Look up a built-in algorithm by its CLI name.
pub fn by_name(name: &str) -> Option<Box<dyn Script>> {
    match name {
        "bfs" => Some(Box::new(Bfs::default())),
        "dfs" => Some(Box::new(Dfs::default())),
        "path" => Some(Box::new(FirstPath::default())),
        "info" => Some(Box::new(VertexInfo::default())),
        _ => None,
    }
}

/// Resolve the traversal origin: explicit override, then the `begin`
/// script var, then the first vertex.
pub(crate) fn resolve_origin(
    app: &HostProxy,
    explicit: Option<u64>,
) -> Result<VertexHandle, ScriptError> {
    resolve_endpoint(app, explicit, "begin", 1)
}

/// Resolve the traversal destination: explicit override, then the
/// `end` script var, then the last vertex.
pub(crate) fn resolve_destination(
    app: &HostProxy,
    explicit: Option<u64>,
) -> Result<VertexHandle, ScriptError> {
    resolve_endpoint(app, explicit, "end", app.vertex_count())
}

fn resolve_endpoint(
    app: &HostProxy,
    explicit: Option<u64>,
    var: &str,
    default_position: usize,
) -> Result<VertexHandle, ScriptError> {
    if let Some(id) = explicit.or_else(|| app.get_var(var).and_then(|v| v.as_u64())) {
        return app
            .vertex_by_id(id)
            .ok_or_else(|| ScriptError::new(format!("no vertex with id {id}")));
    }
    app.vertex(default_position)
        .ok_or_else(|| ScriptError::new("graph has no vertices"))
}

/// Render a path as the `$`-classified result line all the path
/// finders emit.
pub(crate) fn path_line(label: &str, ids: &[u64]) -> String {
    let rendered = ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    format!("${label} [ {rendered} ]")
}
