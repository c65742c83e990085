//! In-memory scene graph used as the reference snap host.
//!
//! Entities are addressable by selectors; geometry lives on a "mesh" object
//! node created under the entity, mirroring how scene-graph runtimes attach
//! renderable objects to entities.

use crate::geometry::Geometry;
use crate::scheduler::Scheduler;
use glam::{Mat4, Quat, Vec3};
use snapto_core::selector::SelectorSubject;
use snapto_core::{ObjectId, SceneGraph, Selector, Transform};

/// Tag given to object nodes that carry geometry.
pub const MESH_TAG: &str = "mesh";

/// Default tag for entities.
pub const ENTITY_TAG: &str = "entity";

/// Whether a node is a selectable entity or a plain world object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Selectable by queries.
    Entity,
    /// Internal object (e.g. a mesh) only reachable through its parent.
    Object,
}

/// A node stored in the scene arena.
#[derive(Debug, Clone)]
pub struct Node {
    /// Entity or object.
    pub kind: NodeKind,
    /// Tag matched by type selectors.
    pub tag: String,
    /// Unique name matched by `#id` selectors.
    pub name: Option<String>,
    /// Classes matched by `.class` selectors.
    pub classes: Vec<String>,
    /// Local transform.
    pub transform: Transform,
    /// Geometry (only on object nodes).
    pub geometry: Option<Geometry>,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
}

impl Node {
    /// A new entity with an identity transform.
    pub fn entity() -> Self {
        Self {
            kind: NodeKind::Entity,
            tag: ENTITY_TAG.to_string(),
            name: None,
            classes: Vec::new(),
            transform: Transform::default(),
            geometry: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// A mesh object carrying `geometry`.
    pub fn mesh(geometry: Geometry) -> Self {
        Self {
            kind: NodeKind::Object,
            tag: MESH_TAG.to_string(),
            geometry: Some(geometry),
            ..Self::entity()
        }
    }

    /// Set the tag.
    pub fn tagged(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    /// Set the unique name.
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Add a class.
    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    /// Set the local position.
    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Set the local rotation.
    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    /// Attach geometry. On an entity this spawns a mesh child when inserted.
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Parent node, `None` at the root.
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Child nodes in insertion order.
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    fn subject(&self) -> SelectorSubject<'_> {
        SelectorSubject {
            tag: &self.tag,
            id: self.name.as_deref(),
            classes: &self.classes,
        }
    }
}

/// Node arena plus the frame scheduler the snap behavior talks to.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    roots: Vec<ObjectId>,
    pub(crate) scheduler: Scheduler,
}

impl Scene {
    /// Empty scene whose render loop has not started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `node` at the root.
    pub fn spawn(&mut self, node: Node) -> ObjectId {
        self.insert(None, node)
    }

    /// Insert `node` under `parent`.
    ///
    /// # Panics
    /// Panics if `parent` does not belong to this scene.
    pub fn spawn_child(&mut self, parent: ObjectId, node: Node) -> ObjectId {
        assert!(self.get(parent).is_some(), "unknown parent {parent}");
        self.insert(Some(parent), node)
    }

    fn insert(&mut self, parent: Option<ObjectId>, mut node: Node) -> ObjectId {
        let id = ObjectId(self.nodes.len() as u32);
        let mesh = match node.kind {
            NodeKind::Entity => node.geometry.take(),
            NodeKind::Object => None,
        };
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        match parent {
            Some(p) => self.nodes[p.0 as usize].children.push(id),
            None => self.roots.push(id),
        }
        if let Some(geometry) = mesh {
            self.insert(Some(id), Node::mesh(geometry));
        }
        id
    }

    /// Node by handle.
    pub fn get(&self, id: ObjectId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Entity by unique name.
    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.iter()
            .find(|(_, node)| node.name.as_deref() == Some(name))
            .map(|(id, _)| id)
    }

    /// First mesh object directly under `entity`.
    pub fn mesh_of(&self, entity: ObjectId) -> Option<ObjectId> {
        self.children(entity)
            .iter()
            .copied()
            .find(|child| self.get(*child).is_some_and(|n| n.kind == NodeKind::Object))
    }

    /// Number of nodes (entities and objects).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the scene holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (ObjectId(i as u32), node))
    }

    /// Nodes in depth-first document order.
    pub fn document_order(&self) -> Vec<ObjectId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<ObjectId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Local-to-world matrix of `id`.
    pub fn world_matrix(&self, id: ObjectId) -> Option<Mat4> {
        let node = self.get(id)?;
        let local =
            Mat4::from_rotation_translation(node.transform.rotation, node.transform.position);
        match node.parent {
            Some(parent) => Some(self.world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    /// World-space position of `id`.
    pub fn world_position(&self, id: ObjectId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.transform_point3(Vec3::ZERO))
    }

    fn node_mut(&mut self, id: ObjectId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }
}

impl SceneGraph for Scene {
    fn query(&self, selector: &Selector) -> Vec<ObjectId> {
        self.document_order()
            .into_iter()
            .filter(|id| {
                self.get(*id)
                    .is_some_and(|n| n.kind == NodeKind::Entity && selector.matches(&n.subject()))
            })
            .collect()
    }

    fn root_children(&self) -> Vec<ObjectId> {
        self.roots.clone()
    }

    fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.get(id).map(|n| n.children()).unwrap_or(&[])
    }

    fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.get(id).and_then(|n| n.parent)
    }

    fn transform(&self, id: ObjectId) -> Option<Transform> {
        self.get(id).map(|n| n.transform)
    }

    fn world_rotation(&self, id: ObjectId) -> Option<Quat> {
        let node = self.get(id)?;
        match node.parent {
            Some(parent) => Some(self.world_rotation(parent)? * node.transform.rotation),
            None => Some(node.transform.rotation),
        }
    }

    fn set_position(&mut self, id: ObjectId, position: Vec3) {
        if let Some(node) = self.node_mut(id) {
            node.transform.position = position;
        }
    }

    fn set_rotation(&mut self, id: ObjectId, rotation: Quat) {
        if let Some(node) = self.node_mut(id) {
            node.transform.rotation = rotation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_geometry_becomes_mesh_child() {
        let mut scene = Scene::new();
        let ground = scene.spawn(Node::entity().named("ground").with_geometry(Geometry::plane(1.0, 1.0)));
        let mesh = scene.mesh_of(ground).expect("mesh child");
        let node = scene.get(mesh).expect("node");
        assert_eq!(node.kind, NodeKind::Object);
        assert_eq!(node.tag, MESH_TAG);
        assert!(scene.get(ground).expect("entity").geometry.is_none());
    }

    #[test]
    fn queries_skip_objects_and_follow_document_order() {
        let mut scene = Scene::new();
        let a = scene.spawn(Node::entity().with_class("x").with_geometry(Geometry::plane(1.0, 1.0)));
        let b = scene.spawn_child(a, Node::entity().with_class("x"));
        let c = scene.spawn(Node::entity().with_class("x"));
        assert_eq!(scene.query(&Selector::parse(".x")), vec![a, b, c]);
        assert_eq!(scene.query(&Selector::parse(MESH_TAG)), Vec::<ObjectId>::new());
    }

    #[test]
    fn world_transforms_accumulate() {
        let mut scene = Scene::new();
        let parent = scene.spawn(
            Node::entity()
                .at(Vec3::new(0.0, 1.0, 0.0))
                .rotated(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
        );
        let child = scene.spawn_child(parent, Node::entity().at(Vec3::new(1.0, 0.0, 0.0)));
        let world = scene.world_position(child).expect("world position");
        assert!((world - Vec3::new(0.0, 1.0, -1.0)).length() < 1e-5);
        assert!(scene.is_descendant_of(child, parent));
        assert!(!scene.is_descendant_of(parent, child));
    }
}
