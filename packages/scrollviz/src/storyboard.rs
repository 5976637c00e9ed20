//! The five-stage scroll narrative.
//!
//! | Label        | What happens                                              |
//! |--------------|-----------------------------------------------------------|
//! | `intro`      | model spins a full turn, camera zooms in                  |
//! | `turn`       | second spin, model shifts to its offset                   |
//! | `pull_back`  | camera pulls back to frame the explode                    |
//! | `explode`    | parts move out along their rest direction, labels appear  |
//! | `reassemble` | camera settles, labels fade, parts return one by one      |
//!
//! Reassembly animates to each part's cached rest position, so the end
//! state is exact whatever the explode factor.

use glam::Vec3;

use crate::config::StoryConfig;
use crate::scene_builder::BuiltScene;
use crate::scene_graph::PartId;
use crate::scene_state::SceneState;
use crate::timeline::{Axis, Placement, Segment, Target, Timeline, TimelineBuilder, TimelineError};

pub const INTRO: &str = "intro";
pub const TURN: &str = "turn";
pub const PULL_BACK: &str = "pull_back";
pub const EXPLODE: &str = "explode";
pub const REASSEMBLE: &str = "reassemble";

pub const STAGES: [&str; 5] = [INTRO, TURN, PULL_BACK, EXPLODE, REASSEMBLE];

/// Displace `rest` radially from the origin.
pub fn explode(rest: Vec3, factor: f32) -> Vec3 {
    rest * factor
}

/// Inverse of [`explode`] for the same factor.
pub fn reassemble(exploded: Vec3, factor: f32) -> Vec3 {
    exploded / factor
}

struct ExplodeTarget {
    id: PartId,
    /// Rest and exploded positions, both in the parent's local space.
    rest: Vec3,
    exploded: Vec3,
    label: Option<String>,
}

/// Build the scroll timeline for `base`. Parts that are not in the scene
/// are skipped; with none left the explode and reassemble stages are
/// omitted entirely.
pub fn build_storyboard(
    base: &SceneState,
    scene: Option<&BuiltScene>,
    config: &StoryConfig,
) -> Result<Timeline, TimelineError> {
    let mut tl = TimelineBuilder::new(config.tween_duration, config.ease);
    let root = scene.map(|s| Target::Part(s.root()));

    tl.add_label(INTRO, Placement::At(0.0))?;
    if let Some(root) = &root {
        tl.add(
            Segment::to(root.clone())
                .rotation(Vec3::from_array(config.intro_rotation))
                .at(Placement::label(INTRO)),
        )?;
    }
    tl.add(
        Segment::to(Target::Camera)
            .position_axis(Axis::Z, config.intro_camera_z)
            .at(Placement::label(INTRO)),
    )?;

    tl.add_label(TURN, Placement::Append)?;
    if let Some(root) = &root {
        let mut turn = Segment::to(root.clone()).rotation(Vec3::from_array(config.turn_rotation));
        let offset = Vec3::from_array(config.turn_root_offset);
        if offset != Vec3::ZERO {
            turn = turn.position(offset);
        }
        tl.add(turn.at(Placement::label(TURN)))?;
    }

    tl.add_label(PULL_BACK, Placement::Append)?;
    tl.add(
        Segment::to(Target::Camera)
            .position_axis(Axis::Z, config.pull_back_camera_z)
            .at(Placement::label(PULL_BACK)),
    )?;

    let targets = scene.map(|s| explode_targets(s, config)).unwrap_or_default();
    if targets.is_empty() {
        log::warn!("No explodable parts resolved; skipping explode and reassemble stages");
        return Ok(tl.build(base));
    }

    tl.add_label(EXPLODE, Placement::Append)?;
    for target in &targets {
        tl.add(
            Segment::to(Target::Part(target.id))
                .position(target.exploded)
                .at(Placement::label(EXPLODE)),
        )?;
        if let Some(label) = &target.label {
            tl.add(
                Segment::to(Target::Overlay(label.clone()))
                    .opacity(1.0)
                    .at(Placement::label(EXPLODE)),
            )?;
        }
    }

    tl.add_label(REASSEMBLE, Placement::Append)?;
    tl.add(
        Segment::to(Target::Camera)
            .position_axis(Axis::Z, config.reassemble_camera_z)
            .at(Placement::label(REASSEMBLE)),
    )?;
    for label in targets.iter().filter_map(|t| t.label.as_ref()) {
        tl.add(
            Segment::to(Target::Overlay(label.clone()))
                .opacity(0.0)
                .at(Placement::label(REASSEMBLE)),
        )?;
    }
    for (i, target) in targets.iter().enumerate() {
        // Parts come home one after another.
        let placement = if i == 0 {
            Placement::label(REASSEMBLE)
        } else {
            Placement::Append
        };
        tl.add(
            Segment::to(Target::Part(target.id))
                .position(target.rest)
                .at(placement),
        )?;
    }

    let timeline = tl.build(base);
    log::info!(
        "Storyboard: {} labels, {} tweens, duration {:.2}, {} exploding part(s)",
        timeline.labels().len(),
        timeline.tween_count(),
        timeline.duration(),
        targets.len()
    );
    Ok(timeline)
}

fn explode_targets(scene: &BuiltScene, config: &StoryConfig) -> Vec<ExplodeTarget> {
    let (names, labels): (Vec<String>, Vec<Option<String>>) = if config.explode_parts.is_empty() {
        scene
            .default_explode
            .iter()
            .map(|n| (n.clone(), None))
            .unzip()
    } else {
        config
            .explode_parts
            .iter()
            .map(|p| (p.name.clone(), p.label.clone()))
            .unzip()
    };

    let resolution = scene.registry.resolve(&names);
    if !resolution.is_complete() {
        log::warn!("Explode parts not found in scene: {:?}", resolution.missing);
    }

    let graph = &scene.graph;
    let model_from_world = graph.world_matrix(scene.root()).inverse();
    resolution
        .found
        .into_iter()
        .filter_map(|(name, id)| {
            let part = graph.get(id)?;
            let rest = part.transform.position;
            // Displace along origin -> rest in model space, then express the
            // result in the parent's space, where the tween applies.
            let parent_to_model = model_from_world * graph.world_matrix(part.parent?);
            let rest_model = parent_to_model.transform_point3(rest);
            let exploded = parent_to_model
                .inverse()
                .transform_point3(explode(rest_model, config.explode_factor));
            let label = names
                .iter()
                .position(|n| *n == name)
                .and_then(|i| labels[i].clone());
            Some(ExplodeTarget {
                id,
                rest,
                exploded,
                label,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;
    use crate::config::{CameraSettings, ExplodePart, ProceduralConfig};
    use crate::scene_builder::build_procedural;
    use crate::scene_graph::{PartKind, SceneGraph, Transform};
    use crate::timeline::{Property, TrackKey};

    fn procedural() -> (BuiltScene, SceneState) {
        let scene = build_procedural(&ProceduralConfig::default());
        let camera = PerspectiveCamera::new(&CameraSettings::default(), 1.0);
        let state = SceneState::new::<&str>(camera, Some(scene.graph.clone()), &[]);
        (scene, state)
    }

    #[test]
    fn test_explode_reassemble_inverse() {
        let rest = Vec3::new(1.5, -0.3, 0.7);
        let back = reassemble(explode(rest, 2.5), 2.5);
        assert!((back - rest).length() < 1e-6);
    }

    #[test]
    fn test_labels_in_order() {
        let (scene, state) = procedural();
        let tl = build_storyboard(&state, Some(&scene), &StoryConfig::default()).unwrap();

        let names: Vec<&str> = tl.labels().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, STAGES.to_vec());
        let times: Vec<f32> = tl.labels().iter().map(|l| l.time).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_sequential_reassembly_duration() {
        let (scene, state) = procedural();
        let tl = build_storyboard(&state, Some(&scene), &StoryConfig::default()).unwrap();
        // 2.0 to reassemble, then 8 satellites at 0.5 each
        assert!((tl.duration() - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_core_not_exploded() {
        let (scene, state) = procedural();
        let tl = build_storyboard(&state, Some(&scene), &StoryConfig::default()).unwrap();
        let core = scene.registry.get("core").unwrap();
        assert!(tl.tracks().all(|(key, _)| key.target != Target::Part(core)));
    }

    #[test]
    fn test_explode_targets_scaled() {
        let (scene, state) = procedural();
        let tl = build_storyboard(&state, Some(&scene), &StoryConfig::default()).unwrap();
        let head = tl.label(REASSEMBLE).unwrap().time;
        let mut exploded = state.clone();
        exploded.apply(&tl.sample(head));

        let sat = scene.registry.get("satellite_0").unwrap();
        let pos = exploded.graph.unwrap().transform(sat).unwrap().position;
        assert!((pos - Vec3::new(3.75, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_partial_resolution_explodes_found_only() {
        let (scene, state) = procedural();
        let config = StoryConfig {
            explode_parts: vec![
                ExplodePart::labelled("satellite_1", "label-one"),
                ExplodePart::labelled("visor", "label-visor"),
            ],
            ..StoryConfig::default()
        };
        let state = SceneState {
            overlays: [("label-one".to_string(), 0.0), ("label-visor".to_string(), 0.0)]
                .into_iter()
                .collect(),
            ..state
        };
        let tl = build_storyboard(&state, Some(&scene), &config).unwrap();

        assert!(tl.label(EXPLODE).is_some());
        let overlays: Vec<_> = tl
            .tracks()
            .filter_map(|(key, _)| match &key.target {
                Target::Overlay(id) => Some(id.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(overlays, vec!["label-one".to_string()]);
    }

    #[test]
    fn test_turn_moves_root_only_when_offset_set() {
        let (scene, state) = procedural();
        let root_x = TrackKey {
            target: Target::Part(scene.root()),
            property: Property::Position(Axis::X),
        };

        let tl = build_storyboard(&state, Some(&scene), &StoryConfig::default()).unwrap();
        assert!(tl.track(&root_x).is_none());

        let config = StoryConfig {
            turn_root_offset: [1.5, 0.0, 0.0],
            ..StoryConfig::default()
        };
        let tl = build_storyboard(&state, Some(&scene), &config).unwrap();
        let track = tl.track(&root_x).unwrap();
        assert_eq!(track.tweens[0].stage.as_deref(), Some(TURN));
        assert_eq!(track.sample(tl.duration()), 1.5);
    }

    #[test]
    fn test_nested_part_explodes_from_model_origin() {
        let mut graph = SceneGraph::new("model");
        let root = graph.root();
        let body = graph
            .add_child(root, "body", PartKind::AssetNode, Transform::from_position(Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();
        let visor = graph
            .add_child(body, "visor", PartKind::AssetNode, Transform::from_position(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        let scene = BuiltScene::from_graph(graph, vec!["visor".to_string()]);
        let camera = PerspectiveCamera::new(&CameraSettings::default(), 1.0);
        let state = SceneState::new::<&str>(camera, Some(scene.graph.clone()), &[]);

        let tl = build_storyboard(&state, Some(&scene), &StoryConfig::default()).unwrap();
        let mut exploded = state.clone();
        exploded.apply(&tl.sample(tl.label(REASSEMBLE).unwrap().time));
        let local = exploded.graph.unwrap().transform(visor).unwrap().position;
        // Model space (2.5, 5, 0) minus the parent's (0, 2, 0)
        assert!((local - Vec3::new(2.5, 3.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_no_scene_skips_model_stages() {
        let camera = PerspectiveCamera::new(&CameraSettings::default(), 1.0);
        let state = SceneState::new::<&str>(camera, None, &[]);
        let tl = build_storyboard(&state, None, &StoryConfig::default()).unwrap();

        assert!(tl.label(EXPLODE).is_none());
        assert!(tl.label(REASSEMBLE).is_none());
        assert!(tl.tracks().all(|(key, _)| key.target == Target::Camera));
        // The turn stage has nothing to move, so pull_back follows intro directly
        assert_eq!(tl.label(PULL_BACK).unwrap().time, 0.5);
        assert_eq!(tl.duration(), 1.0);
    }
}
