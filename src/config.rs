//! Run settings for the `snapto` binary.

use serde::{Deserialize, Serialize};
use snapto_core::RawOptions;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Default location of the run settings file.
pub const DEFAULT_RUN_CONFIG_PATH: &str = "config/snapto.toml";

/// Settings that shape a headless run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Frames to step.
    pub frames: u64,
    /// Also record transforms before the first frame.
    pub record_initial: bool,
    /// Options merged under every node's snap options.
    pub defaults: RawOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 1,
            record_initial: true,
            defaults: RawOptions::new(),
        }
    }
}

impl RunConfig {
    /// Load settings from `path`, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<RunConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    RunConfig::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if path != Path::new(DEFAULT_RUN_CONFIG_PATH) {
                    warn!("Run config not found at {}. Using defaults", path.display());
                }
                RunConfig::default()
            }
            Err(err) => {
                warn!("Failed to read {}: {err}. Using defaults", path.display());
                RunConfig::default()
            }
        }
    }

    /// `options` with every missing key taken from [`RunConfig::defaults`].
    pub fn with_defaults(&self, options: RawOptions) -> RawOptions {
        let mut merged = self.defaults.clone();
        for (name, value) in options.iter() {
            merged.insert(name, value.clone());
        }
        merged
    }
}
