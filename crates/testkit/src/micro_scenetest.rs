//! Frame-stepped golden tests over a [`Runtime`].
//!
//! A micro scene-test attaches behaviors to a tiny scene, steps it a fixed
//! number of frames and records the tracked entity transforms after every
//! frame. The report is compared against a golden JSON file (or rewritten
//! when `SNAPTO_UPDATE_SNAPSHOTS=1` is set).

use crate::snapshot::assert_json_snapshot;
use crate::{capture_transforms, TransformRecord};
use anyhow::Result;
use serde::Serialize;
use snapto_core::{Behavior, FrameTick, ObjectId};
use snapto_scene::{Runtime, Scene};
use std::path::PathBuf;

/// Configuration for a micro scene-test.
#[derive(Debug, Clone)]
pub struct MicroScenetestConfig {
    /// Name written into the report.
    pub name: String,
    /// Frames to step (the report also holds the state before the first one).
    pub frames: u64,
    /// Entities whose transforms are recorded.
    pub tracked: Vec<ObjectId>,
    /// Path to the golden JSON file.
    pub snapshot_path: PathBuf,
}

/// Transforms recorded after a frame.
#[derive(Debug, Clone, Serialize)]
pub struct MicroScenetestFrame {
    /// Frames stepped so far.
    pub tick: FrameTick,
    /// Tracked transforms, rounded.
    pub transforms: Vec<TransformRecord>,
}

/// Full report of a micro scene-test.
#[derive(Debug, Clone, Serialize)]
pub struct MicroScenetestReport {
    /// Test name.
    pub name: String,
    /// One entry per recorded frame.
    pub frames: Vec<MicroScenetestFrame>,
}

/// Step `runtime` and collect the report without touching any snapshot.
///
/// `before_frame` runs ahead of every step and may move entities or push new
/// options.
pub fn record_micro_scenetest<B, F>(
    config: &MicroScenetestConfig,
    runtime: &mut Runtime<B>,
    mut before_frame: F,
) -> MicroScenetestReport
where
    B: Behavior<Scene>,
    F: FnMut(FrameTick, &mut Runtime<B>),
{
    let mut frames = Vec::with_capacity(config.frames as usize + 1);
    let capture = |runtime: &Runtime<B>| MicroScenetestFrame {
        tick: runtime.tick(),
        transforms: capture_transforms(runtime.scene(), runtime.tick(), &config.tracked),
    };

    frames.push(capture(runtime));
    for _ in 0..config.frames {
        before_frame(runtime.tick(), runtime);
        runtime.step();
        frames.push(capture(runtime));
    }

    MicroScenetestReport {
        name: config.name.clone(),
        frames,
    }
}

/// Run a micro scene-test and assert (or update) its golden file.
pub fn run_micro_scenetest<B, F>(
    config: MicroScenetestConfig,
    runtime: &mut Runtime<B>,
    before_frame: F,
) -> Result<()>
where
    B: Behavior<Scene>,
    F: FnMut(FrameTick, &mut Runtime<B>),
{
    let report = record_micro_scenetest(&config, runtime, before_frame);
    assert_json_snapshot(&config.snapshot_path, &report)
}
