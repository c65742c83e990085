//! Ray-cast surface snapping and normal alignment.

use crate::euler::EulerAngles;
use glam::{Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};
use snapto_core::host::Ray;
use snapto_core::{Intersection, ObjectId, OrientationPolicy, RayCaster, RaySettings, SceneGraph};

/// Pose computed for a surface hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfacePose {
    /// Position only; rotation is left alone.
    Position(Vec3),
    /// Position plus a new rotation.
    Aligned {
        /// New local position.
        position: Vec3,
        /// New local rotation.
        rotation: Quat,
    },
}

/// Rotation state carried between cycles by the compose-external policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastApplied(pub Quat);

impl Default for LastApplied {
    fn default() -> Self {
        Self(Quat::IDENTITY)
    }
}

/// Build the snap ray: start `ray_start` units along the normalized
/// direction from `origin`.
pub fn snap_ray(origin: Vec3, settings: &RaySettings) -> Ray {
    let direction = settings.direction.normalize_or_zero();
    Ray::new(origin + direction * settings.ray_start, direction)
}

/// Cast `ray` against `candidates` into `hits` and return the nearest one.
///
/// `hits` is a caller-owned scratch buffer; it is cleared before use and not
/// shared between concurrent calls.
pub fn nearest_hit<'a, R>(
    caster: &R,
    ray: &Ray,
    candidates: &[ObjectId],
    hits: &'a mut Vec<Intersection>,
) -> Option<&'a Intersection>
where
    R: RayCaster + ?Sized,
{
    hits.clear();
    if candidates.is_empty() || ray.direction == Vec3::ZERO {
        return None;
    }
    caster.intersect_objects(ray, candidates, hits);
    hits.first()
}

/// World-space normal of the face that was hit, if the hit carries one.
pub fn world_normal<S>(scene: &S, hit: &Intersection) -> Option<Vec3>
where
    S: SceneGraph + ?Sized,
{
    let local = hit.face_normal?;
    let rotation = scene.world_rotation(hit.object).unwrap_or(Quat::IDENTITY);
    Some((rotation * local).normalize_or_zero()).filter(|n| *n != Vec3::ZERO)
}

/// Rotation whose up axis follows `normal` while keeping the heading of
/// `current`.
///
/// The heading is the yaw of `current` read with yaw applied first (YXZ). The
/// normal is moved into that heading's frame, the remaining tilt is read with
/// yaw applied last (XZY) so only its pitch and roll survive, and the result
/// is rebuilt in YXZ order. Pitch is kept within a quarter turn so reading the
/// result back gives the same yaw, which makes repeated snaps a fixed point.
/// The yaw is copied as-is, never negated: a negated copy flips the heading
/// on every cycle.
pub fn keep_live_yaw(normal: Vec3, current: Quat) -> Quat {
    let yaw = EulerAngles::from_quat_yxz(current).y;
    let local = Quat::from_rotation_y(-yaw) * normal;
    let tilt = EulerAngles::from_quat_xzy(Quat::from_rotation_arc(Vec3::Y, local));
    let (mut pitch, mut roll) = (tilt.x, tilt.z);
    // Rx(x) * Rz(z) and Rx(x +- pi) * Rz(pi - z) lift +Y to the same axis.
    if pitch > FRAC_PI_2 {
        pitch -= PI;
        roll = PI - roll;
    } else if pitch < -FRAC_PI_2 {
        pitch += PI;
        roll = PI - roll;
    }
    EulerAngles::new(pitch, yaw, roll).to_quat_yxz().normalize()
}

/// Compose the entity's rotation onto `tilt` when it was changed by someone
/// else since this behavior last wrote it.
pub fn compose_external(tilt: Quat, current: Quat, last: LastApplied) -> Quat {
    if current != last.0 {
        (tilt * current).normalize()
    } else {
        tilt
    }
}

/// Orientation for an entity whose up axis should follow `normal`.
pub fn aligned_rotation(
    normal: Vec3,
    current: Quat,
    policy: OrientationPolicy,
    last: LastApplied,
) -> Quat {
    match policy {
        OrientationPolicy::LiveYaw => keep_live_yaw(normal, current),
        OrientationPolicy::ComposeExternal => {
            compose_external(Quat::from_rotation_arc(Vec3::Y, normal), current, last)
        }
    }
}

/// Pose for a hit. `align` is `Some` in normal-align mode.
pub fn surface_pose<S>(
    scene: &S,
    hit: &Intersection,
    offset: Vec3,
    current: Quat,
    align: Option<(OrientationPolicy, LastApplied)>,
) -> SurfacePose
where
    S: SceneGraph + ?Sized,
{
    let normal = align.and_then(|_| world_normal(scene, hit));
    match (align, normal) {
        (Some((policy, last)), Some(normal)) => {
            let rotation = aligned_rotation(normal, current, policy, last);
            SurfacePose::Aligned {
                position: rotation * offset + hit.point,
                rotation,
            }
        }
        _ => SurfacePose::Position(offset + hit.point),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn ray_starts_along_direction() {
        let settings = RaySettings {
            ray_start: -2.0,
            direction: Vec3::new(0.0, -10.0, 0.0),
            ..RaySettings::default()
        };
        let ray = snap_ray(Vec3::new(1.0, 0.0, 0.0), &settings);
        assert_eq!(ray.origin, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(ray.direction, Vec3::NEG_Y);
    }

    #[test]
    fn flat_normal_keeps_only_yaw() {
        let current = Quat::from_rotation_y(0.6);
        let rotation = aligned_rotation(
            Vec3::Y,
            current,
            OrientationPolicy::LiveYaw,
            LastApplied::default(),
        );
        assert!((rotation * Vec3::Y - Vec3::Y).length() < EPS);
        assert!((EulerAngles::from_quat_yxz(rotation).y - 0.6).abs() < EPS);
    }

    #[test]
    fn tilted_normal_becomes_up_axis_with_yaw_kept() {
        let normal = Vec3::new(0.4, 1.0, 0.3).normalize();
        let current = Quat::from_rotation_y(-1.2);
        let rotation = aligned_rotation(
            normal,
            current,
            OrientationPolicy::LiveYaw,
            LastApplied::default(),
        );
        assert!((rotation * Vec3::Y - normal).length() < EPS);
        assert!((EulerAngles::from_quat_yxz(rotation).y + 1.2).abs() < EPS);
    }

    #[test]
    fn realigning_an_aligned_rotation_is_stable() {
        let normal = Vec3::new(0.6, 1.0, 0.5).normalize();
        let first = keep_live_yaw(normal, Quat::from_rotation_y(1.0));
        let second = keep_live_yaw(normal, first);
        assert!(first.dot(second).abs() > 1.0 - EPS);
        assert!((EulerAngles::from_quat_yxz(second).y - 1.0).abs() < EPS);
    }

    #[test]
    fn downward_normal_keeps_yaw() {
        let normal = Vec3::new(0.2, -1.0, 0.4).normalize();
        let first = keep_live_yaw(normal, Quat::from_rotation_y(0.4));
        assert!((first * Vec3::Y - normal).length() < EPS);
        assert!((EulerAngles::from_quat_yxz(first).y - 0.4).abs() < EPS);
        let second = keep_live_yaw(normal, first);
        assert!(first.dot(second).abs() > 1.0 - EPS);
    }

    #[test]
    fn compose_external_applies_foreign_rotation_once() {
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let tilt = Quat::from_rotation_arc(Vec3::Y, normal);
        let foreign = Quat::from_rotation_y(0.5);

        let first = aligned_rotation(
            normal,
            foreign,
            OrientationPolicy::ComposeExternal,
            LastApplied::default(),
        );
        assert!(first.dot(tilt * foreign).abs() > 1.0 - EPS);

        let second = aligned_rotation(
            normal,
            first,
            OrientationPolicy::ComposeExternal,
            LastApplied(first),
        );
        assert_eq!(second, tilt);
    }

    #[test]
    fn identity_rotation_is_not_external_change() {
        let normal = Vec3::new(0.0, 1.0, 1.0).normalize();
        let rotation = aligned_rotation(
            normal,
            Quat::IDENTITY,
            OrientationPolicy::ComposeExternal,
            LastApplied::default(),
        );
        assert_eq!(rotation, Quat::from_rotation_arc(Vec3::Y, normal));
    }
}
