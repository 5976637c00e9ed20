//! Scene graph of transformable parts.
//!
//! Parts form a tree: every part has exactly one parent except the root.
//! Transforms are local to the parent, matching how the host renderer
//! composes its own node hierarchy.

use glam::Vec3;
use serde::Serialize;

/// Unique identifier for a part. Indexes into the graph's part list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PartId(pub u32);

/// What a part represents to the host renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    /// Transform-only grouping node.
    Group,
    /// Icosahedron core of the procedural scene.
    Core,
    /// Small cube orbiting the core.
    Satellite,
    /// Node taken from a loaded model asset.
    AssetNode,
}

/// Transform component for parts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3, // Euler angles in radians, XYZ order
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub kind: PartKind,
    pub transform: Transform,
    pub parent: Option<PartId>,
    pub children: Vec<PartId>,
}

/// The scene graph. Parts are never removed once created, so ids stay valid
/// for the lifetime of the graph.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    parts: Vec<Part>,
    root: PartId,
}

impl SceneGraph {
    /// Create a graph holding only a root group with the given name.
    pub fn new(root_name: &str) -> Self {
        let root = Part {
            name: root_name.to_string(),
            kind: PartKind::Group,
            transform: Transform::default(),
            parent: None,
            children: Vec::new(),
        };
        Self {
            parts: vec![root],
            root: PartId(0),
        }
    }

    pub fn root(&self) -> PartId {
        self.root
    }

    /// Create a part under `parent`. Returns `None` if the parent does not exist.
    pub fn add_child(
        &mut self,
        parent: PartId,
        name: &str,
        kind: PartKind,
        transform: Transform,
    ) -> Option<PartId> {
        if !self.exists(parent) {
            return None;
        }
        let id = PartId(self.parts.len() as u32);
        self.parts.push(Part {
            name: name.to_string(),
            kind,
            transform,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.parts[parent.0 as usize].children.push(id);
        Some(id)
    }

    pub fn exists(&self, id: PartId) -> bool {
        (id.0 as usize) < self.parts.len()
    }

    pub fn get(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.get_mut(id.0 as usize)
    }

    pub fn transform(&self, id: PartId) -> Option<&Transform> {
        self.get(id).map(|p| &p.transform)
    }

    pub fn transform_mut(&mut self, id: PartId) -> Option<&mut Transform> {
        self.get_mut(id).map(|p| &mut p.transform)
    }

    pub fn children(&self, id: PartId) -> &[PartId] {
        self.get(id).map(|p| p.children.as_slice()).unwrap_or(&[])
    }

    /// All parts in creation order. Parents always precede their children.
    pub fn iter(&self) -> impl Iterator<Item = (PartId, &Part)> {
        self.parts
            .iter()
            .enumerate()
            .map(|(i, p)| (PartId(i as u32), p))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// World-space matrix of a part, composed root first.
    pub fn world_matrix(&self, id: PartId) -> glam::Mat4 {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(pid) = current {
            match self.get(pid) {
                Some(part) => {
                    chain.push(part.transform);
                    current = part.parent;
                }
                None => break,
            }
        }
        chain.iter().rev().fold(glam::Mat4::IDENTITY, |acc, t| {
            acc * local_matrix(t)
        })
    }
}

/// Local matrix of a transform: translate * rotate(XYZ) * scale.
pub fn local_matrix(t: &Transform) -> glam::Mat4 {
    let rotation = glam::Quat::from_euler(
        glam::EulerRot::XYZ,
        t.rotation.x,
        t.rotation.y,
        t.rotation.z,
    );
    glam::Mat4::from_scale_rotation_translation(t.scale, rotation, t.position)
}
