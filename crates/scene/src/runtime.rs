//! Frame loop that drives behaviors attached to scene entities.

use crate::graph::Scene;
use snapto_core::{Behavior, ConfigError, FrameScheduler, FrameTick, ObjectId, RawOptions};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Owns a [`Scene`] and at most one behavior per entity.
#[derive(Debug)]
pub struct Runtime<B> {
    scene: Scene,
    behaviors: BTreeMap<ObjectId, B>,
    tick: FrameTick,
}

impl<B: Behavior<Scene>> Runtime<B> {
    /// Wrap a scene; rendering has not started yet.
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            behaviors: BTreeMap::new(),
            tick: FrameTick::ZERO,
        }
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access (e.g. to move entities between frames).
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Frames stepped so far.
    pub fn tick(&self) -> FrameTick {
        self.tick
    }

    /// Behavior attached to `entity`.
    pub fn behavior(&self, entity: ObjectId) -> Option<&B> {
        self.behaviors.get(&entity)
    }

    /// Attach and activate `behavior` on `entity`, replacing (and
    /// deactivating) any previous one.
    pub fn attach(&mut self, entity: ObjectId, behavior: B) {
        if let Some(mut previous) = self.behaviors.remove(&entity) {
            debug!(entity = %entity, "replacing attached behavior");
            previous.on_deactivate(&mut self.scene);
        }
        let behavior = self.behaviors.entry(entity).or_insert(behavior);
        behavior.on_activate(&mut self.scene);
    }

    /// Push new options to the behavior on `entity`.
    pub fn configure(&mut self, entity: ObjectId, options: &RawOptions) -> Result<(), ConfigError> {
        match self.behaviors.get_mut(&entity) {
            Some(behavior) => behavior.on_config_change(&mut self.scene, options),
            None => {
                warn!(entity = %entity, "no behavior attached; options ignored");
                Ok(())
            }
        }
    }

    /// Deactivate and remove the behavior on `entity`.
    pub fn detach(&mut self, entity: ObjectId) -> Option<B> {
        let mut behavior = self.behaviors.remove(&entity)?;
        behavior.on_deactivate(&mut self.scene);
        Some(behavior)
    }

    /// Run one frame: start rendering on the first frame (firing pending
    /// render-start listeners), then call every frame hook.
    pub fn step(&mut self) -> FrameTick {
        if !self.scene.render_started() {
            for (_, owner) in self.scene.start_render() {
                if let Some(behavior) = self.behaviors.get_mut(&owner) {
                    behavior.on_render_start(&mut self.scene);
                }
            }
        }

        for owner in self.scene.scheduler().frame_owners() {
            if let Some(behavior) = self.behaviors.get_mut(&owner) {
                behavior.on_frame(&mut self.scene, self.tick);
            }
        }

        self.tick = self.tick.advance(1);
        self.tick
    }

    /// Step `frames` frames.
    pub fn run(&mut self, frames: u64) -> FrameTick {
        for _ in 0..frames {
            self.step();
        }
        self.tick
    }

    /// Tear down every behavior.
    pub fn shutdown(&mut self) {
        let entities: Vec<ObjectId> = self.behaviors.keys().copied().collect();
        for entity in entities {
            self.detach(entity);
        }
    }
}
