#![warn(missing_docs)]
//! Deterministic testing surfaces for snap scenarios (transform logs, golden
//! snapshots, fixture scenes).

mod fixtures;
mod micro_scenetest;
mod report;
mod snapshot;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use snapto_core::{FrameTick, ObjectId, SceneGraph};
use snapto_scene::Scene;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub use fixtures::*;
pub use micro_scenetest::*;
pub use report::*;
pub use snapshot::*;

/// Local transform of one entity at a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    /// Frame the transform was read at.
    pub tick: FrameTick,
    /// Entity handle.
    pub entity: ObjectId,
    /// Local position.
    pub position: [f32; 3],
    /// Local rotation quaternion (x, y, z, w).
    pub rotation: [f32; 4],
}

impl TransformRecord {
    /// Read the transform of `entity` from `scene`.
    pub fn capture(scene: &Scene, tick: FrameTick, entity: ObjectId) -> Option<Self> {
        let transform = scene.transform(entity)?;
        Some(Self {
            tick,
            entity,
            position: transform.position.to_array(),
            rotation: transform.rotation.to_array(),
        })
    }

    /// Round every component to three decimals so golden files ignore float
    /// noise.
    pub fn rounded(self) -> Self {
        Self {
            position: self.position.map(round3),
            rotation: self.rotation.map(round3),
            ..self
        }
    }
}

fn round3(value: f32) -> f32 {
    // adding zero folds -0.0 into 0.0
    (value * 1000.0).round() / 1000.0 + 0.0
}

/// Capture the rounded transforms of `entities`, skipping unknown handles.
pub fn capture_transforms(scene: &Scene, tick: FrameTick, entities: &[ObjectId]) -> Vec<TransformRecord> {
    entities
        .iter()
        .filter_map(|entity| TransformRecord::capture(scene, tick, *entity))
        .map(TransformRecord::rounded)
        .collect()
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create JSONL log {}", path.display()))?;
        Ok(Self { file })
    }

    /// Append a record to the log.
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}
