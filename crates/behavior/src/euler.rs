//! Euler decomposition for the two axis orderings normal alignment needs.
//!
//! Orderings are intrinsic: `XZY` means `Rx * Rz * Ry`, so the Y (yaw) angle
//! is applied last and is the least significant; `YXZ` means `Ry * Rx * Rz`
//! with yaw most significant. Decomposition follows the rotation-matrix
//! extraction used by common scene-graph runtimes, including the gimbal-lock
//! fallback that pins the least significant angle to zero.

use glam::{Mat3, Quat};

const GIMBAL_LIMIT: f32 = 0.999_999_9;

/// Rotation angles in radians about the X, Y and Z axes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    /// Rotation about X.
    pub x: f32,
    /// Rotation about Y (yaw).
    pub y: f32,
    /// Rotation about Z.
    pub z: f32,
}

impl EulerAngles {
    /// Angles from their components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Decompose `rotation` as `Rx * Rz * Ry`.
    pub fn from_quat_xzy(rotation: Quat) -> Self {
        let m = Mat3::from_quat(rotation.normalize());
        // Row-major names: m{row}{col} == m.col(col).row
        let m11 = m.x_axis.x;
        let m12 = m.y_axis.x;
        let m13 = m.z_axis.x;
        let m22 = m.y_axis.y;
        let m23 = m.z_axis.y;
        let m32 = m.y_axis.z;
        let m33 = m.z_axis.z;

        let z = (-m12.clamp(-1.0, 1.0)).asin();
        if m12.abs() < GIMBAL_LIMIT {
            Self::new(m32.atan2(m22), m13.atan2(m11), z)
        } else {
            Self::new((-m23).atan2(m33), 0.0, z)
        }
    }

    /// Decompose `rotation` as `Ry * Rx * Rz`.
    pub fn from_quat_yxz(rotation: Quat) -> Self {
        let m = Mat3::from_quat(rotation.normalize());
        let m11 = m.x_axis.x;
        let m13 = m.z_axis.x;
        let m21 = m.x_axis.y;
        let m22 = m.y_axis.y;
        let m23 = m.z_axis.y;
        let m31 = m.x_axis.z;
        let m33 = m.z_axis.z;

        let x = (-m23.clamp(-1.0, 1.0)).asin();
        if m23.abs() < GIMBAL_LIMIT {
            Self::new(x, m13.atan2(m33), m21.atan2(m22))
        } else {
            Self::new(x, (-m31).atan2(m11), 0.0)
        }
    }

    /// Rebuild `Ry * Rx * Rz`.
    pub fn to_quat_yxz(self) -> Quat {
        Quat::from_rotation_y(self.y) * Quat::from_rotation_x(self.x) * Quat::from_rotation_z(self.z)
    }
}
