#![warn(missing_docs)]
//! Core primitives shared across the workspace: host abstractions, typed
//! snap options and the selector grammar.

pub mod host;
pub mod options;
pub mod selector;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use host::{
    Behavior, FrameScheduler, HookId, Intersection, Ray, RayCaster, SceneGraph, SnapHost,
    Transform,
};
pub use options::{
    parse_property_string, ConfigError, OptionValue, OrientationPolicy, RawOptions, RaySettings,
    SnapConfig, SnapMode,
};
pub use selector::Selector;

/// Frame counter driven by the host render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameTick(pub u64);

impl FrameTick {
    /// First frame of any run.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` frames.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }
}

/// Handle to a node owned by the host scene graph.
///
/// Entities and the world objects they carry share one handle space; the
/// behavior only ever consults handles, it never owns the nodes behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
