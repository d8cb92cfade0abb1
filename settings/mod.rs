/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! User settings, persisted as `settings.json`.
//!
//! Field names on disk keep their historical spelling
//! (`logs_symbols`, `execution_time_log`) so existing settings files
//! keep loading.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::PersistenceError;

/// Default settings file name.
pub const SETTINGS_FILE: &str = "settings.json";

pub const MIN_SPEED: u8 = 1;
pub const MAX_SPEED: u8 = 10;

fn default_animation() -> bool {
    true
}

fn default_speed() -> u8 {
    MAX_SPEED
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Animate state transitions during a run.
    #[serde(default = "default_animation")]
    pub animation: bool,

    /// Run speed 1..=10; 10 disables the per-step delay entirely.
    #[serde(default = "default_speed")]
    pub speed: u8,

    /// Allow-list of log classification symbols to display.
    #[serde(rename = "logs_symbols", default)]
    pub log_symbols: String,

    /// Append a history record after every run.
    #[serde(rename = "execution_time_log", default)]
    pub execution_history: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            animation: true,
            speed: MAX_SPEED,
            log_symbols: String::new(),
            execution_history: false,
        }
    }
}

impl Settings {
    /// Load from disk; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let mut settings: Settings = serde_json::from_str(&text)?;
        if !(MIN_SPEED..=MAX_SPEED).contains(&settings.speed) {
            warn!("speed {} out of range, clamping", settings.speed);
            settings.speed = settings.speed.clamp(MIN_SPEED, MAX_SPEED);
        }
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}
