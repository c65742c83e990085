//! TOML scene descriptions.
//!
//! ```toml
//! [[node]]
//! name = "ground"
//! classes = ["ground"]
//! position = [0.0, -5.0, 0.0]
//! geometry = { plane = { width = 10.0, depth = 10.0 } }
//!
//! [[node]]
//! name = "crate"
//! snapto = "type: hitnormal; offset: 0 0.5 0"
//! ```
//!
//! Parents must be declared before their children. `rotation` is given in
//! degrees and applied yaw first (Y, then X, then Z).

use crate::error::SceneError;
use crate::geometry::Geometry;
use crate::graph::{Node, Scene};
use glam::{Quat, Vec3};
use serde::Deserialize;
use snapto_core::{parse_property_string, ObjectId, RawOptions};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Snap attribute on a node: either `name: value; ...` text or a table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SnapSpec {
    /// Declarative property string.
    Attribute(String),
    /// Option table.
    Options(RawOptions),
}

impl SnapSpec {
    /// Raw options for the behavior.
    pub fn to_options(&self) -> Result<RawOptions, snapto_core::ConfigError> {
        match self {
            SnapSpec::Attribute(text) => parse_property_string(text),
            SnapSpec::Options(options) => Ok(options.clone()),
        }
    }
}

/// One `[[node]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    /// Unique name (selectable with `#name`, referenced by `parent`).
    pub name: Option<String>,
    /// Tag override.
    pub tag: Option<String>,
    /// Classes.
    #[serde(default)]
    pub classes: Vec<String>,
    /// Name of an earlier node to attach under.
    pub parent: Option<String>,
    /// Local position.
    #[serde(default)]
    pub position: [f32; 3],
    /// Local rotation, Euler degrees.
    #[serde(default)]
    pub rotation: [f32; 3],
    /// Geometry for the entity's mesh.
    pub geometry: Option<Geometry>,
    /// Snap behavior options.
    pub snapto: Option<SnapSpec>,
}

impl NodeSpec {
    fn label(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("node[{index}]"))
    }

    fn rotation(&self) -> Quat {
        let [x, y, z] = self.rotation.map(f32::to_radians);
        Quat::from_rotation_y(y) * Quat::from_rotation_x(x) * Quat::from_rotation_z(z)
    }

    fn to_node(&self) -> Node {
        let mut node = Node::entity()
            .at(Vec3::from_array(self.position))
            .rotated(self.rotation());
        if let Some(tag) = &self.tag {
            node = node.tagged(tag);
        }
        if let Some(name) = &self.name {
            node = node.named(name);
        }
        for class in &self.classes {
            node = node.with_class(class);
        }
        if let Some(geometry) = &self.geometry {
            node = node.with_geometry(geometry.clone());
        }
        node
    }
}

/// Top-level scene file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneFile {
    /// Nodes in declaration order.
    #[serde(default, rename = "node")]
    pub nodes: Vec<NodeSpec>,
}

/// A built scene plus the snap options found on its nodes.
#[derive(Debug)]
pub struct LoadedScene {
    /// The scene graph.
    pub scene: Scene,
    /// Entities carrying a snap attribute, in declaration order.
    pub snaps: Vec<(ObjectId, RawOptions)>,
}

impl SceneFile {
    /// Build the scene graph.
    pub fn build(&self) -> Result<LoadedScene, SceneError> {
        let mut scene = Scene::new();
        let mut by_name: HashMap<&str, ObjectId> = HashMap::new();
        let mut snaps = Vec::new();

        for (index, spec) in self.nodes.iter().enumerate() {
            let node = spec.to_node();
            let id = match &spec.parent {
                Some(parent) => {
                    let parent_id = by_name.get(parent.as_str()).copied().ok_or_else(|| {
                        SceneError::UnknownParent {
                            node: spec.label(index),
                            parent: parent.clone(),
                        }
                    })?;
                    scene.spawn_child(parent_id, node)
                }
                None => scene.spawn(node),
            };

            if let Some(name) = &spec.name {
                if by_name.insert(name.as_str(), id).is_some() {
                    return Err(SceneError::DuplicateName(name.clone()));
                }
            }

            if let Some(snap) = &spec.snapto {
                let options = snap.to_options().map_err(|source| SceneError::Snap {
                    node: spec.label(index),
                    source,
                })?;
                snaps.push((id, options));
            }
        }

        debug!(nodes = scene.len(), snaps = snaps.len(), "built scene");
        Ok(LoadedScene { scene, snaps })
    }
}

/// Parse and build a scene from TOML text.
pub fn parse_scene(text: &str) -> Result<LoadedScene, SceneError> {
    let file: SceneFile = toml::from_str(text)?;
    file.build()
}

/// Read, parse and build a scene file.
pub fn load_scene(path: &Path) -> Result<LoadedScene, SceneError> {
    let text = fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scene(&text)
}
