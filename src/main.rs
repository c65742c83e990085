//! Headless runner: load a scene file, attach the snap behaviors it declares
//! and step the frame loop.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::{RunConfig, DEFAULT_RUN_CONFIG_PATH};
use snapto_behavior::SnapTo;
use snapto_core::ObjectId;
use snapto_scene::{load_scene, LoadedScene, Runtime};
use snapto_testkit::{capture_transforms, JsonlSink, RunReport, TransformRecord};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Snap scene entities onto surfaces or a grid", long_about = None)]
struct Args {
    /// Scene description (TOML)
    scene: PathBuf,
    /// Frames to step; overrides the run config
    #[arg(long)]
    frames: Option<u64>,
    /// Run settings file
    #[arg(long, default_value = DEFAULT_RUN_CONFIG_PATH)]
    config: PathBuf,
    /// Write the transforms of snapped entities after every frame as JSONL
    #[arg(long)]
    record: Option<PathBuf>,
    /// Write an end-of-run summary as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = RunConfig::load_from_path(&args.config);
    let frames = args.frames.unwrap_or(config.frames);

    let LoadedScene { scene, snaps } = load_scene(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;
    info!(scene = %args.scene.display(), nodes = scene.len(), behaviors = snaps.len(), "scene loaded");

    let mut runtime: Runtime<SnapTo> = Runtime::new(scene);
    let mut tracked: Vec<ObjectId> = Vec::with_capacity(snaps.len());
    for (entity, options) in snaps {
        let options = config.with_defaults(options);
        match SnapTo::from_options(entity, &options) {
            Ok(behavior) => {
                debug!(entity = %entity, mode = %behavior.config().mode, "attaching snap behavior");
                runtime.attach(entity, behavior);
                tracked.push(entity);
            }
            Err(err) => warn!(entity = %entity, %err, "skipping snap behavior"),
        }
    }

    let mut sink = args.record.as_deref().map(JsonlSink::create).transpose()?;
    let mut previous = capture_transforms(runtime.scene(), runtime.tick(), &tracked);
    if config.record_initial {
        write_records(sink.as_mut(), &previous)?;
    }

    let mut report = RunReport::new(scene_label(&args.scene));
    report.behaviors = tracked.len();
    for _ in 0..frames {
        let tick = runtime.step();
        let current = capture_transforms(runtime.scene(), tick, &tracked);
        report.transforms_changed += count_changes(&previous, &current);
        write_records(sink.as_mut(), &current)?;
        previous = current;
    }
    report.frames = runtime.tick().0;

    for record in &previous {
        let name = runtime
            .scene()
            .get(record.entity)
            .and_then(|node| node.name.clone())
            .unwrap_or_else(|| record.entity.to_string());
        let [x, y, z] = record.position;
        println!("{name:>12}  position ({x:.3}, {y:.3}, {z:.3})");
    }

    runtime.shutdown();
    report.entities = previous;
    if let Some(path) = &args.report {
        report.write_json(path)?;
    }
    info!(
        frames = report.frames,
        changed = report.transforms_changed,
        "run finished"
    );
    Ok(())
}

fn write_records(sink: Option<&mut JsonlSink>, records: &[TransformRecord]) -> Result<()> {
    if let Some(sink) = sink {
        for record in records {
            sink.write(record)?;
        }
    }
    Ok(())
}

fn count_changes(before: &[TransformRecord], after: &[TransformRecord]) -> u64 {
    before
        .iter()
        .zip(after)
        .filter(|(a, b)| a.position != b.position || a.rotation != b.rotation)
        .count() as u64
}

fn scene_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
