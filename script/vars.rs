/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Per-script properties side-channel.
//!
//! An algorithm named `bfs` may ship a sibling `bfs.json` holding a
//! flat key/value map (origin vertex, destination, tuning knobs). The
//! map is read-only from algorithm code via `get_var`; an absent key
//! or absent file is simply `None`, never an error at run time.

use log::debug;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::error::PersistenceError;

/// The loaded key/value map for one script.
#[derive(Debug, Clone, Default)]
pub struct ScriptVars {
    values: Map<String, Value>,
}

impl ScriptVars {
    /// Load the sibling `<stem>.json` of a script path. A missing file
    /// yields the empty map; a present-but-malformed file is an error.
    pub fn load_for(script_path: &Path) -> Result<Self, PersistenceError> {
        let vars_path = script_path.with_extension("json");
        if !vars_path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&vars_path)?;
        let values: Map<String, Value> = serde_json::from_str(&text)?;
        debug!("loaded {} vars from {}", values.len(), vars_path.display());
        Ok(Self { values })
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.values.get(name)?.as_u64()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name)?.as_f64()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.values.get(name)?.as_bool()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars_from(json: &str) -> ScriptVars {
        ScriptVars::from_map(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_absent_key_is_none() {
        let vars = vars_from(r#"{"begin": 1}"#);
        assert_eq!(vars.get("begin").and_then(Value::as_u64), Some(1));
        assert!(vars.get("end").is_none());
    }

    #[test]
    fn test_typed_accessors() {
        let vars = vars_from(r#"{"id": 3, "scale": 0.5, "trace": true, "label": "x"}"#);
        assert_eq!(vars.get_u64("id"), Some(3));
        assert_eq!(vars.get_f64("scale"), Some(0.5));
        assert_eq!(vars.get_bool("trace"), Some(true));
        assert_eq!(vars.get_str("label"), Some("x"));
        // Wrong-type reads are also absent, not errors.
        assert_eq!(vars.get_u64("label"), None);
    }

    #[test]
    fn test_missing_file_is_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let vars = ScriptVars::load_for(&dir.path().join("nope.rs")).unwrap();
        assert!(vars.is_empty());
    }

    #[test]
    fn test_sibling_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("bfs.rs");
        std::fs::write(dir.path().join("bfs.json"), r#"{"begin": 2, "end": 5}"#).unwrap();

        let vars = ScriptVars::load_for(&script).unwrap();
        assert_eq!(vars.get_u64("begin"), Some(2));
        assert_eq!(vars.get_u64("end"), Some(5));
    }

    #[test]
    fn test_malformed_sibling_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("bfs.rs");
        std::fs::write(dir.path().join("bfs.json"), "[1, 2, 3]").unwrap();
        assert!(matches!(
            ScriptVars::load_for(&script),
            Err(PersistenceError::Json(_))
        ));
    }
}
