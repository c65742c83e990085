//! Frame hooks and fire-once render-start listeners.

use crate::graph::Scene;
use snapto_core::{FrameScheduler, HookId, ObjectId};
use std::collections::BTreeMap;
use tracing::trace;

/// Registered callbacks keyed by hook id (ids only grow, so map order is
/// registration order).
#[derive(Debug, Default)]
pub struct Scheduler {
    render_started: bool,
    next_id: u64,
    frame_hooks: BTreeMap<HookId, ObjectId>,
    render_start: BTreeMap<HookId, ObjectId>,
}

impl Scheduler {
    fn next_hook(&mut self) -> HookId {
        let id = HookId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Owners of frame hooks in registration order.
    pub fn frame_owners(&self) -> Vec<ObjectId> {
        self.frame_hooks.values().copied().collect()
    }

    /// Number of pending render-start listeners.
    pub fn pending_render_start(&self) -> usize {
        self.render_start.len()
    }

    /// Number of registered frame hooks.
    pub fn frame_hook_count(&self) -> usize {
        self.frame_hooks.len()
    }

    /// Mark rendering as started and hand back the listeners to fire. They
    /// are removed here, so each fires at most once.
    pub fn start_render(&mut self) -> Vec<(HookId, ObjectId)> {
        if self.render_started {
            return Vec::new();
        }
        self.render_started = true;
        let fired: Vec<_> = std::mem::take(&mut self.render_start).into_iter().collect();
        trace!(listeners = fired.len(), "render started");
        fired
    }
}

impl Scene {
    /// Scheduler state.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Start rendering; returns the render-start listeners that fire now.
    pub fn start_render(&mut self) -> Vec<(HookId, ObjectId)> {
        self.scheduler.start_render()
    }
}

impl FrameScheduler for Scene {
    fn render_started(&self) -> bool {
        self.scheduler.render_started
    }

    fn add_frame_hook(&mut self, owner: ObjectId) -> HookId {
        let id = self.scheduler.next_hook();
        self.scheduler.frame_hooks.insert(id, owner);
        id
    }

    fn once_render_start(&mut self, owner: ObjectId) -> HookId {
        let id = self.scheduler.next_hook();
        self.scheduler.render_start.insert(id, owner);
        id
    }

    fn remove_hook(&mut self, hook: HookId) -> bool {
        self.scheduler.frame_hooks.remove(&hook).is_some()
            || self.scheduler.render_start.remove(&hook).is_some()
    }
}
