//! End-of-run summary exported as JSON.

use crate::TransformRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Summary of a scene run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Scene identifier (usually the file name).
    pub scene: String,
    /// When the report was produced (RFC 3339, UTC).
    pub timestamp: String,
    /// Frames stepped.
    pub frames: u64,
    /// Number of entities carrying a snap behavior.
    pub behaviors: usize,
    /// Per-frame transform changes summed over every snapped entity.
    pub transforms_changed: u64,
    /// Final transform of every snapped entity.
    pub entities: Vec<TransformRecord>,
}

impl RunReport {
    /// Empty report stamped with the current time.
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            frames: 0,
            behaviors: 0,
            transforms_changed: 0,
            entities: Vec::new(),
        }
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write report {}", path.display()))
    }
}
