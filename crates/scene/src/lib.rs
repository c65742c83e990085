#![warn(missing_docs)]
//! Reference host for the snap behavior: an in-memory scene graph with a
//! triangle raycaster, a frame scheduler and a TOML scene loader.

pub mod error;
pub mod geometry;
pub mod graph;
pub mod loader;
pub mod raycast;
pub mod runtime;
pub mod scheduler;

pub use error::SceneError;
pub use geometry::{Aabb, Geometry, Triangle};
pub use graph::{Node, NodeKind, Scene};
pub use loader::{load_scene, parse_scene, LoadedScene, SceneFile};
pub use runtime::Runtime;
pub use scheduler::Scheduler;
