//! Ray intersection against scene objects (Möller–Trumbore, double sided).

use crate::geometry::{Aabb, Geometry, Triangle};
use crate::graph::Scene;
use glam::Vec3;
use snapto_core::host::Ray;
use snapto_core::{Intersection, ObjectId, RayCaster};

const DET_EPSILON: f32 = 1e-8;
const BOUNDS_MARGIN: f32 = 1e-4;

/// Distance along `ray` to `tri`, if hit in front of the origin.
pub fn ray_triangle(ray: &Ray, tri: &Triangle) -> Option<f32> {
    let e1 = tri.b - tri.a;
    let e2 = tri.c - tri.a;
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);

    // Ray parallel to triangle plane
    if det.abs() < DET_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - tri.a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

/// Distance along `ray` to a sphere, if hit in front of the origin.
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = center - ray.origin;
    let along = to_center.dot(ray.direction);
    let dist_sq = to_center.length_squared() - along * along;
    let radius_sq = radius * radius;
    if dist_sq > radius_sq {
        return None;
    }
    let half_chord = (radius_sq - dist_sq).sqrt();
    let near = along - half_chord;
    let far = along + half_chord;
    if far < 0.0 {
        return None;
    }
    Some(if near < 0.0 { far } else { near })
}

impl Scene {
    fn intersect_object(&self, ray: &Ray, object: ObjectId, hits: &mut Vec<Intersection>) {
        let Some(geometry) = self.get(object).and_then(|n| n.geometry.as_ref()) else {
            return;
        };
        let Some(world) = self.world_matrix(object) else {
            return;
        };

        if let Geometry::Marker { radius } = geometry {
            let center = world.transform_point3(Vec3::ZERO);
            if let Some(distance) = ray_sphere(ray, center, *radius) {
                hits.push(Intersection {
                    point: ray.at(distance),
                    distance,
                    object,
                    face_normal: None,
                });
            }
            return;
        }

        let local = geometry.triangles();
        let world_tris: Vec<Triangle> = local.iter().map(|t| t.transformed(&world)).collect();
        let bounds = Aabb::from_points(world_tris.iter().flat_map(|t| [t.a, t.b, t.c]));
        let Some(bounds) = bounds.map(|b| b.expanded(BOUNDS_MARGIN)) else {
            return;
        };
        if bounds.ray_intersection(ray.origin, ray.direction).is_none() {
            return;
        }

        for (local_tri, world_tri) in local.iter().zip(&world_tris) {
            if let Some(distance) = ray_triangle(ray, world_tri) {
                hits.push(Intersection {
                    point: ray.at(distance),
                    distance,
                    object,
                    face_normal: Some(local_tri.normal()),
                });
            }
        }
    }
}

impl RayCaster for Scene {
    fn intersect_objects(&self, ray: &Ray, objects: &[ObjectId], hits: &mut Vec<Intersection>) {
        hits.clear();
        if ray.direction == Vec3::ZERO {
            return;
        }
        for &object in objects {
            self.intersect_object(ray, object, hits);
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    }
}
