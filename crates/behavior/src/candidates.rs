//! Lazily rebuilt list of objects a snap ray is tested against.

use snapto_core::{ObjectId, SceneGraph, Selector};
use std::collections::HashSet;
use tracing::trace;

/// Cached candidate objects plus the flag that forces a rebuild.
///
/// The list only holds handles; the scene graph owns the objects.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    objects: Vec<ObjectId>,
    stale: bool,
}

impl Default for CandidateSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateSet {
    /// A new set starts stale.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            stale: true,
        }
    }

    /// Force a rebuild on the next [`CandidateSet::refresh`].
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Whether the next refresh will rebuild.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Current candidates (possibly stale).
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    /// Rebuild if stale, then return the candidates.
    pub fn refresh<S>(&mut self, scene: &S, selector: &Selector, owner: ObjectId) -> &[ObjectId]
    where
        S: SceneGraph + ?Sized,
    {
        if self.stale {
            self.rebuild(scene, selector, owner);
        }
        &self.objects
    }

    /// Collect the immediate children of every entity `selector` matches (or
    /// of every root entity for an empty selector), dropping `owner` and
    /// everything below it.
    pub fn rebuild<S>(&mut self, scene: &S, selector: &Selector, owner: ObjectId)
    where
        S: SceneGraph + ?Sized,
    {
        self.stale = false;
        self.objects.clear();

        let entities = if selector.is_empty() {
            scene.root_children()
        } else {
            scene.query(selector)
        };

        let mut seen = HashSet::new();
        for entity in entities {
            for &child in scene.children(entity) {
                if child == owner || scene.is_descendant_of(child, owner) {
                    continue;
                }
                if seen.insert(child) {
                    self.objects.push(child);
                }
            }
        }

        trace!(
            owner = %owner,
            selector = %selector,
            candidates = self.objects.len(),
            "rebuilt snap candidates"
        );
    }
}
