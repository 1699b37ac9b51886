//! Playback configuration for the demo host, loaded from ~/.tickline/playback.yaml.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the host drives a timeline: step size, step count and loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Seconds advanced per update.
    #[serde(default = "default_step")]
    pub step_seconds: f64,
    /// Number of updates to run.
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_loop")]
    pub loop_enabled: bool,
    /// Explicit timeline length. 0 = derive from the last event.
    #[serde(default)]
    pub duration: f64,
    /// Sleep `step_seconds` between updates.
    #[serde(default)]
    pub realtime: bool,
}

fn default_step() -> f64 {
    0.1
}

fn default_steps() -> u32 {
    70
}

fn default_loop() -> bool {
    true
}

/// Default path for the playback config.
pub fn default_config_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".tickline");
    path.push("playback.yaml");
    Some(path)
}

impl PlaybackConfig {
    /// Load config from the standard path.
    /// Returns None if the file doesn't exist or doesn't parse (graceful fallback).
    pub fn load() -> Option<Self> {
        Self::load_or_none(&default_config_path()?)
    }

    fn load_or_none(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Total virtual time covered by all steps.
    pub fn total_seconds(&self) -> f64 {
        self.step_seconds * f64::from(self.steps)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_seconds: default_step(),
            steps: default_steps(),
            loop_enabled: default_loop(),
            duration: 0.0,
            realtime: false,
        }
    }
}
