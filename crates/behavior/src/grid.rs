//! Grid snapping.

use glam::Vec3;

/// Quantize `position` down to the lattice spanned by `grid`, then add the
/// local `offset`: `floor(p / g) * g + o` per axis.
///
/// Zero grid components are not guarded and produce non-finite coordinates.
pub fn snap_to_grid(position: Vec3, grid: Vec3, offset: Vec3) -> Vec3 {
    (position / grid).floor() * grid + offset
}
