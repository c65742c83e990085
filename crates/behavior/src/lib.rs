#![warn(missing_docs)]
//! Snap behavior: place an entity on the first surface a ray hits (optionally
//! aligning it to the surface normal) or on a fixed 3D grid.

pub mod candidates;
pub mod euler;
pub mod grid;
mod snap;
pub mod surface;

pub use candidates::CandidateSet;
pub use euler::EulerAngles;
pub use grid::snap_to_grid;
pub use snap::{Lifecycle, SnapOutcome, SnapTo};
