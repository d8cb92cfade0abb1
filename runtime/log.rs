/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The per-run log.
//!
//! Lines come from two producers: the host itself (system lines,
//! always visible) and algorithm code (script lines). A script line's
//! first character is its classification symbol; the line is visible
//! only when that symbol appears in the user's allow-list, and is
//! displayed with the symbol stripped. This is the run's own record,
//! separate from the crate's diagnostic logging.

use std::fs;
use std::path::Path;

use crate::error::PersistenceError;

/// One logged line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub text: String,
    /// Host-emitted lines bypass symbol filtering.
    pub system: bool,
}

/// Ordered log for a single run. Cleared at the start of the next run.
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Vec<LogLine>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line; empty lines are dropped.
    pub fn push(&mut self, text: impl Into<String>, system: bool) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.lines.push(LogLine { text, system });
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The filtered view: system lines verbatim, script lines whose
    /// leading symbol is in `symbols` with that symbol stripped.
    pub fn visible(&self, symbols: &str) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| {
                if line.system {
                    return Some(line.text.as_str());
                }
                let symbol = line.text.chars().next()?;
                if symbols.contains(symbol) {
                    Some(&line.text[symbol.len_utf8()..])
                } else {
                    None
                }
            })
            .collect()
    }

    /// Write the filtered view to a file, one line per entry.
    pub fn save_visible(&self, path: &Path, symbols: &str) -> Result<(), PersistenceError> {
        let mut out = self.visible(symbols).join("\n");
        out.push('\n');
        fs::write(path, out)?;
        Ok(())
    }
}
