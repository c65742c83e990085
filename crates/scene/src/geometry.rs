//! Triangle geometry and bounding boxes for the reference scene.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Geometry carried by a mesh node, in the node's local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    /// Horizontal rectangle in the XZ plane facing +Y.
    Plane {
        /// Size along X.
        width: f32,
        /// Size along Z.
        depth: f32,
    },
    /// Axis-aligned box centered on the origin.
    Cuboid {
        /// Full size per axis.
        size: [f32; 3],
    },
    /// Explicit triangle list; winding gives the face normal.
    Triangles(Vec<[[f32; 3]; 3]>),
    /// Pick sphere without face data.
    Marker {
        /// Sphere radius.
        radius: f32,
    },
}

/// One triangle in local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex.
    pub a: Vec3,
    /// Second vertex.
    pub b: Vec3,
    /// Third vertex.
    pub c: Vec3,
}

impl Triangle {
    /// Triangle from its vertices.
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Unit normal from counter-clockwise winding.
    pub fn normal(&self) -> Vec3 {
        (self.b - self.a).cross(self.c - self.a).normalize_or_zero()
    }

    /// Same triangle with every vertex transformed by `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            a: matrix.transform_point3(self.a),
            b: matrix.transform_point3(self.b),
            c: matrix.transform_point3(self.c),
        }
    }
}

impl Geometry {
    /// Plane of the given size.
    pub fn plane(width: f32, depth: f32) -> Self {
        Geometry::Plane { width, depth }
    }

    /// Box of the given full size.
    pub fn cuboid(size: Vec3) -> Self {
        Geometry::Cuboid {
            size: size.to_array(),
        }
    }

    /// Local-space triangles. Markers have none.
    pub fn triangles(&self) -> Vec<Triangle> {
        match self {
            Geometry::Plane { width, depth } => {
                let w = width * 0.5;
                let d = depth * 0.5;
                let corners = [
                    Vec3::new(-w, 0.0, -d),
                    Vec3::new(-w, 0.0, d),
                    Vec3::new(w, 0.0, d),
                    Vec3::new(w, 0.0, -d),
                ];
                vec![
                    Triangle::new(corners[0], corners[1], corners[2]),
                    Triangle::new(corners[0], corners[2], corners[3]),
                ]
            }
            Geometry::Cuboid { size } => {
                let half = Vec3::from_array(*size) * 0.5;
                // (normal, u, v) with u x v == normal
                let faces = [
                    (Vec3::X, Vec3::Y, Vec3::Z),
                    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
                    (Vec3::Y, Vec3::Z, Vec3::X),
                    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
                    (Vec3::Z, Vec3::X, Vec3::Y),
                    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
                ];
                let mut out = Vec::with_capacity(12);
                for (n, u, v) in faces {
                    let center = n * half;
                    let u = u * half;
                    let v = v * half;
                    let p0 = center - u - v;
                    let p1 = center + u - v;
                    let p2 = center + u + v;
                    let p3 = center - u + v;
                    out.push(Triangle::new(p0, p1, p2));
                    out.push(Triangle::new(p0, p2, p3));
                }
                out
            }
            Geometry::Triangles(list) => list
                .iter()
                .map(|[a, b, c]| {
                    Triangle::new(Vec3::from_array(*a), Vec3::from_array(*b), Vec3::from_array(*c))
                })
                .collect(),
            Geometry::Marker { .. } => Vec::new(),
        }
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box from its corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box around `points`, `None` when empty.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Grow each side by `margin`.
    pub fn expanded(self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    /// Slab test. Returns the entry distance (or exit distance when the
    /// origin is inside) for hits in front of the origin.
    pub fn ray_intersection(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray_origin[axis];
            let dir = ray_dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if dir.abs() < f32::EPSILON {
                // Parallel to this slab: must already be inside it
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let t1 = (lo - origin) * inv;
            let t2 = (hi - origin) * inv;
            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        // Entire box behind the origin, or no overlap
        if tmax < 0.0 || tmin > tmax {
            return None;
        }

        Some(if tmin < 0.0 { tmax } else { tmin })
    }
}
