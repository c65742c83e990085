//! Host abstractions consumed by the snap behavior.
//!
//! The behavior never owns the scene. It reads and mutates entity transforms,
//! queries candidate objects and casts rays through these traits, and it asks
//! the host to call it back on frames or once rendering has started.

use crate::options::{ConfigError, RawOptions};
use crate::selector::Selector;
use crate::{FrameTick, ObjectId};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local transform of a node (relative to its parent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Local position.
    pub position: Vec3,
    /// Local rotation.
    pub rotation: Quat,
}

impl Transform {
    /// Identity transform at `position`.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_position(Vec3::ZERO)
    }
}

/// World-space ray. `direction` is expected to be unit length (or zero, which
/// never hits anything).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin in world space.
    pub origin: Vec3,
    /// Normalized ray direction in world space.
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray, normalizing `direction` (a zero direction stays zero).
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at distance `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A single ray hit reported by a [`RayCaster`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// World-space hit point.
    pub point: Vec3,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
    /// Object that was hit.
    pub object: ObjectId,
    /// Normal of the hit face in the object's local space, when the object
    /// has face data.
    pub face_normal: Option<Vec3>,
}

/// Read/write access to the host scene graph.
pub trait SceneGraph {
    /// Entities matching `selector`, in document order.
    fn query(&self, selector: &Selector) -> Vec<ObjectId>;

    /// Entities directly under the scene root.
    fn root_children(&self) -> Vec<ObjectId>;

    /// Immediate children of `id` (empty for unknown ids).
    fn children(&self, id: ObjectId) -> &[ObjectId];

    /// Parent of `id`, `None` for root-level or unknown nodes.
    fn parent(&self, id: ObjectId) -> Option<ObjectId>;

    /// Returns true when `id` sits anywhere below `ancestor`.
    fn is_descendant_of(&self, id: ObjectId, ancestor: ObjectId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Local transform of `id`.
    fn transform(&self, id: ObjectId) -> Option<Transform>;

    /// Accumulated world rotation of `id`.
    fn world_rotation(&self, id: ObjectId) -> Option<Quat>;

    /// Overwrite the local position of `id`. Unknown ids are ignored.
    fn set_position(&mut self, id: ObjectId, position: Vec3);

    /// Overwrite the local rotation of `id`. Unknown ids are ignored.
    fn set_rotation(&mut self, id: ObjectId, rotation: Quat);
}

/// Ray intersection against an explicit object list.
pub trait RayCaster {
    /// Intersect `ray` with `objects` only (their descendants are not
    /// visited). Clears `hits` and fills it ordered by increasing distance.
    fn intersect_objects(&self, ray: &Ray, objects: &[ObjectId], hits: &mut Vec<Intersection>);
}

/// Identifier of a registered frame hook or render-start listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HookId(pub u64);

/// Frame and render-start callbacks offered by the host.
///
/// Hooks are keyed by the owning entity; the host routes the callback to the
/// behavior attached to that entity.
pub trait FrameScheduler {
    /// Whether the host render loop has started.
    fn render_started(&self) -> bool;

    /// Call the owner's `on_frame` every frame until removed.
    fn add_frame_hook(&mut self, owner: ObjectId) -> HookId;

    /// Call the owner's `on_render_start` once when rendering starts. The
    /// listener is dropped after firing.
    fn once_render_start(&mut self, owner: ObjectId) -> HookId;

    /// Remove a hook or pending listener. Returns false if it was not present.
    fn remove_hook(&mut self, hook: HookId) -> bool;
}

/// Everything the snap behavior needs from its host.
pub trait SnapHost: SceneGraph + RayCaster + FrameScheduler {}

impl<T: SceneGraph + RayCaster + FrameScheduler + ?Sized> SnapHost for T {}

/// Lifecycle entry points a host drives on an attached behavior.
pub trait Behavior<H: ?Sized> {
    /// Called once when the behavior is attached to its entity.
    fn on_activate(&mut self, host: &mut H);

    /// Called when the declarative options change. The options replace the
    /// previous set wholesale.
    fn on_config_change(&mut self, host: &mut H, options: &RawOptions) -> Result<(), ConfigError>;

    /// Called each frame while a frame hook is registered.
    fn on_frame(&mut self, host: &mut H, tick: FrameTick);

    /// Called once by a pending render-start listener.
    fn on_render_start(&mut self, host: &mut H);

    /// Called when the entity is torn down; must detach every hook.
    fn on_deactivate(&mut self, host: &mut H);
}
