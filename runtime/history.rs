/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Append-only execution history.
//!
//! One tab-separated line per finished run:
//! `date \t time \t graph \t script \t elapsed(4dp) \t solved`.
//! Append failures are reported through the controller's status hook
//! and never fail the run itself.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use time::OffsetDateTime;
use time::macros::format_description;

use crate::error::PersistenceError;

/// Default history file name.
pub const HISTORY_FILE: &str = "execution_history.csv";

/// Append one run record.
pub fn append(
    path: &Path,
    graph: &str,
    script: &str,
    elapsed: f64,
    solved: bool,
) -> Result<(), PersistenceError> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let line = format_record(now, graph, script, elapsed, solved)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

fn format_record(
    at: OffsetDateTime,
    graph: &str,
    script: &str,
    elapsed: f64,
    solved: bool,
) -> Result<String, PersistenceError> {
    let date = at
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(std::io::Error::other)?;
    let time = at
        .format(format_description!("[hour]:[minute]:[second]"))
        .map_err(std::io::Error::other)?;
    Ok(format!(
        "{date}\t{time}\t{graph}\t{script}\t{elapsed:.4}\t{solved}\n"
    ))
}
