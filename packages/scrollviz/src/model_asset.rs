//! Model asset loading.
//!
//! Only the node structure of an asset matters here: names, hierarchy and
//! rest transforms. Geometry stays with the host renderer, which loads the
//! same file for drawing.
//!
//! ## Formats
//!
//! - glTF / GLB: every node of the default scene becomes an [`AssetNode`]
//!   with its decomposed local transform. Unnamed nodes get `node_{index}`.
//! - OBJ: every object (`o name`) becomes a root-level node positioned at
//!   the centre of its bounding box.

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use glam::{EulerRot, Quat, Vec3};

use crate::scene_graph::Transform;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Compute a bounding box from flat `[x, y, z, x, y, z, ...]` positions.
    pub fn from_flat_positions(positions: &[f32]) -> Option<Self> {
        let mut points = positions
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0], c[1], c[2]));
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

}

/// One addressable node of a model asset.
#[derive(Debug, Clone)]
pub struct AssetNode {
    pub name: String,
    /// Index into [`ModelAsset::nodes`]. Parents always precede children.
    pub parent: Option<usize>,
    /// Local rest transform.
    pub transform: Transform,
}

#[derive(Debug, Clone)]
pub struct ModelAsset {
    pub id: String,
    pub nodes: Vec<AssetNode>,
}

impl ModelAsset {
    /// Parse an asset, picking the format from its content.
    pub fn from_bytes(id: &str, bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(b"glTF") || bytes.first() == Some(&b'{') {
            Self::from_gltf_bytes(id, bytes)
        } else {
            let text = std::str::from_utf8(bytes)
                .with_context(|| format!("Asset '{}' is neither glTF nor text OBJ", id))?;
            Self::from_obj(id, text)
        }
    }

    /// Parse a binary GLB or JSON glTF document.
    pub fn from_gltf_bytes(id: &str, bytes: &[u8]) -> Result<Self> {
        let gltf = gltf::Gltf::from_slice(bytes)
            .with_context(|| format!("Failed to parse glTF asset '{}'", id))?;

        let scene = gltf
            .default_scene()
            .or_else(|| gltf.scenes().next())
            .ok_or_else(|| anyhow!("glTF asset '{}' has no scenes", id))?;

        let mut nodes = Vec::new();
        // Depth-first so parents are pushed before their children.
        let mut stack: Vec<(gltf::Node<'_>, Option<usize>)> =
            scene.nodes().map(|n| (n, None)).collect();
        stack.reverse();
        while let Some((node, parent)) = stack.pop() {
            let (translation, rotation, scale) = node.transform().decomposed();
            let (rx, ry, rz) = Quat::from_array(rotation).to_euler(EulerRot::XYZ);
            let name = node
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("node_{}", node.index()));

            let index = nodes.len();
            nodes.push(AssetNode {
                name,
                parent,
                transform: Transform {
                    position: Vec3::from_array(translation),
                    rotation: Vec3::new(rx, ry, rz),
                    scale: Vec3::from_array(scale),
                },
            });

            let mut children: Vec<_> = node.children().map(|c| (c, Some(index))).collect();
            children.reverse();
            stack.extend(children);
        }

        if nodes.is_empty() {
            bail!("glTF asset '{}' has no nodes", id);
        }

        Ok(Self {
            id: id.to_string(),
            nodes,
        })
    }

    /// Parse OBJ content. Each object becomes a node at its bounding-box centre.
    pub fn from_obj(id: &str, obj_content: &str) -> Result<Self> {
        let mut cursor = std::io::Cursor::new(obj_content.as_bytes());

        let load_options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };

        let (models, _materials) =
            tobj::load_obj_buf(&mut cursor, &load_options, |_| Ok((vec![], HashMap::new())))
                .map_err(|e| anyhow!("Failed to parse OBJ asset '{}': {}", id, e))?;

        let nodes: Vec<AssetNode> = models
            .iter()
            .filter_map(|model| {
                let bounds = BoundingBox::from_flat_positions(&model.mesh.positions)?;
                Some(AssetNode {
                    name: model.name.clone(),
                    parent: None,
                    transform: Transform::from_position(bounds.center()),
                })
            })
            .collect();

        if nodes.is_empty() {
            bail!("OBJ asset '{}' contains no vertices", id);
        }

        Ok(Self {
            id: id.to_string(),
            nodes,
        })
    }
}
