//! Small scenes shared by behavior tests.

use glam::{Quat, Vec3};
use snapto_core::ObjectId;
use snapto_scene::{Geometry, Node, Scene};

/// Side length of fixture planes.
pub const FIXTURE_PLANE_SIZE: f32 = 20.0;

/// Horizontal ground plane entity named `ground` (class `ground`) at height `y`.
pub fn ground_plane(scene: &mut Scene, y: f32) -> ObjectId {
    scene.spawn(
        Node::entity()
            .named("ground")
            .with_class("ground")
            .at(Vec3::new(0.0, y, 0.0))
            .with_geometry(Geometry::plane(FIXTURE_PLANE_SIZE, FIXTURE_PLANE_SIZE)),
    )
}

/// Plane entity centered on `center` whose face normal is `normal`.
pub fn tilted_plane(scene: &mut Scene, center: Vec3, normal: Vec3) -> ObjectId {
    scene.spawn(
        Node::entity()
            .with_class("slope")
            .at(center)
            .rotated(Quat::from_rotation_arc(Vec3::Y, normal.normalize()))
            .with_geometry(Geometry::plane(FIXTURE_PLANE_SIZE, FIXTURE_PLANE_SIZE)),
    )
}

/// Geometry-less entity at `position`.
pub fn entity_at(scene: &mut Scene, position: Vec3) -> ObjectId {
    scene.spawn(Node::entity().at(position))
}

/// Geometry-less entity at `position` turned `yaw` radians about +Y.
pub fn yawed_entity_at(scene: &mut Scene, position: Vec3, yaw: f32) -> ObjectId {
    scene.spawn(Node::entity().at(position).rotated(Quat::from_rotation_y(yaw)))
}
