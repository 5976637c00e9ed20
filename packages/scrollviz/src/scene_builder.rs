//! Scene construction for the two scene variants.
//!
//! Both variants produce a [`BuiltScene`]: the part tree plus a validated
//! name → part registry. Timeline construction only ever addresses parts
//! through the registry.

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec3;

use crate::config::ProceduralConfig;
use crate::model_asset::ModelAsset;
use crate::scene_graph::{PartId, PartKind, SceneGraph, Transform};

pub const ROOT_NAME: &str = "model";
pub const CORE_NAME: &str = "core";

pub fn satellite_name(index: usize) -> String {
    format!("satellite_{}", index)
}

/// Outcome of resolving a list of part names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub found: Vec<(String, PartId)>,
    pub missing: Vec<String>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Name → part mapping, built once when the scene is built.
#[derive(Debug, Clone)]
pub struct PartRegistry {
    by_name: HashMap<String, PartId>,
    root: PartId,
}

impl PartRegistry {
    fn new(graph: &SceneGraph) -> Self {
        let mut by_name = HashMap::new();
        for (id, part) in graph.iter() {
            if by_name.contains_key(&part.name) {
                log::warn!("Duplicate part name '{}', keeping the first", part.name);
                continue;
            }
            by_name.insert(part.name.clone(), id);
        }
        Self {
            by_name,
            root: graph.root(),
        }
    }

    pub fn root(&self) -> PartId {
        self.root
    }

    pub fn get(&self, name: &str) -> Option<PartId> {
        self.by_name.get(name).copied()
    }

    /// Resolve names in order. Exact matches only.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Resolution {
        let mut resolution = Resolution::default();
        for name in names {
            let name = name.as_ref();
            match self.get(name) {
                Some(id) => resolution.found.push((name.to_string(), id)),
                None => resolution.missing.push(name.to_string()),
            }
        }
        resolution
    }
}

#[derive(Debug, Clone)]
pub struct BuiltScene {
    pub graph: SceneGraph,
    pub registry: PartRegistry,
    /// Parts exploded when no explicit list is configured.
    pub default_explode: Vec<String>,
}

impl BuiltScene {
    pub(crate) fn from_graph(graph: SceneGraph, default_explode: Vec<String>) -> Self {
        let registry = PartRegistry::new(&graph);
        Self {
            graph,
            registry,
            default_explode,
        }
    }

    pub fn root(&self) -> PartId {
        self.registry.root()
    }
}

/// Core plus `satellites` parts evenly spaced on a circle in the XY plane.
pub fn build_procedural(config: &ProceduralConfig) -> BuiltScene {
    let mut graph = SceneGraph::new(ROOT_NAME);
    let root = graph.root();

    graph.add_child(root, CORE_NAME, PartKind::Core, Transform::default());

    let mut satellites = Vec::with_capacity(config.satellites);
    for i in 0..config.satellites {
        let angle = TAU * i as f32 / config.satellites as f32;
        let position = Vec3::new(angle.cos() * config.radius, angle.sin() * config.radius, 0.0);
        let name = satellite_name(i);
        graph.add_child(root, &name, PartKind::Satellite, Transform::from_position(position));
        satellites.push(name);
    }

    log::info!(
        "Built procedural scene: core + {} satellites at radius {}",
        config.satellites,
        config.radius
    );
    BuiltScene::from_graph(graph, satellites)
}

/// Mirror the asset's node tree under a root group.
pub fn build_from_asset(asset: &ModelAsset) -> BuiltScene {
    let mut graph = SceneGraph::new(ROOT_NAME);
    let root = graph.root();

    let mut ids: Vec<Option<PartId>> = Vec::with_capacity(asset.nodes.len());
    for node in &asset.nodes {
        let parent = match node.parent {
            Some(index) => ids.get(index).copied().flatten(),
            None => Some(root),
        };
        let id = parent.and_then(|p| graph.add_child(p, &node.name, PartKind::AssetNode, node.transform));
        if id.is_none() {
            log::warn!("Skipping asset node '{}': parent not built", node.name);
        }
        ids.push(id);
    }

    log::info!("Built scene from asset '{}': {} nodes", asset.id, graph.len() - 1);
    BuiltScene::from_graph(graph, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedural_layout() {
        let scene = build_procedural(&ProceduralConfig::default());
        // root + core + 8 satellites
        assert_eq!(scene.graph.len(), 10);
        assert_eq!(scene.default_explode.len(), 8);

        let first = scene.registry.get("satellite_0").unwrap();
        let pos = scene.graph.transform(first).unwrap().position;
        assert!((pos - Vec3::new(1.5, 0.0, 0.0)).length() < 1e-6);

        let quarter = scene.registry.get("satellite_2").unwrap();
        let pos = scene.graph.transform(quarter).unwrap().position;
        assert!((pos - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_procedural_is_deterministic() {
        let a = build_procedural(&ProceduralConfig::default());
        let b = build_procedural(&ProceduralConfig::default());
        for ((_, pa), (_, pb)) in a.graph.iter().zip(b.graph.iter()) {
            assert_eq!(pa.name, pb.name);
            assert_eq!(pa.transform, pb.transform);
        }
    }

    #[test]
    fn test_satellites_parented_to_root() {
        let scene = build_procedural(&ProceduralConfig {
            satellites: 3,
            radius: 1.0,
        });
        let root = scene.root();
        assert_eq!(scene.graph.children(root).len(), 4);
        assert_eq!(scene.graph.get(root).unwrap().name, ROOT_NAME);
    }

    #[test]
    fn test_resolve_reports_missing() {
        let scene = build_procedural(&ProceduralConfig::default());
        let resolution = scene.registry.resolve(&["core", "visor", "satellite_1"]);
        assert_eq!(resolution.found.len(), 2);
        assert_eq!(resolution.missing, vec!["visor".to_string()]);
        assert!(!resolution.is_complete());
    }

    #[test]
    fn test_asset_nodes_registered() {
        let asset = ModelAsset::from_obj(
            "test",
            "o visor\nv 0 1 0\nv 1 1 0\nv 0 2 0\nf 1 2 3\n",
        )
        .unwrap();
        let scene = build_from_asset(&asset);
        let visor = scene.registry.get("visor").unwrap();
        assert_eq!(scene.graph.get(visor).unwrap().parent, Some(scene.root()));
        assert_eq!(scene.graph.get(visor).unwrap().kind, PartKind::AssetNode);
        assert!(scene.default_explode.is_empty());
    }
}
