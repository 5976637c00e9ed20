//! Complete animatable state of the scene at one play-head position.

use std::collections::BTreeMap;

use crate::camera::PerspectiveCamera;
use crate::scene_graph::SceneGraph;
use crate::timeline::{Property, Target, TrackKey, TrackSource, TrackValues};

#[derive(Debug, Clone)]
pub struct SceneState {
    pub camera: PerspectiveCamera,
    /// `None` while no model is loaded.
    pub graph: Option<SceneGraph>,
    /// Overlay id → opacity.
    pub overlays: BTreeMap<String, f32>,
}

impl SceneState {
    /// Overlays start hidden.
    pub fn new<S: AsRef<str>>(
        camera: PerspectiveCamera,
        graph: Option<SceneGraph>,
        overlay_ids: &[S],
    ) -> Self {
        Self {
            camera,
            graph,
            overlays: overlay_ids
                .iter()
                .map(|id| (id.as_ref().to_string(), 0.0))
                .collect(),
        }
    }

    /// Write sampled values into the state. Keys that do not resolve are ignored.
    pub fn apply(&mut self, values: &TrackValues) {
        for (key, &value) in values {
            match (&key.target, key.property) {
                (Target::Camera, Property::Position(axis)) => {
                    axis.set(&mut self.camera.position, value);
                }
                (Target::Part(id), property) => {
                    let Some(t) = self.graph.as_mut().and_then(|g| g.transform_mut(*id)) else {
                        continue;
                    };
                    match property {
                        Property::Position(axis) => axis.set(&mut t.position, value),
                        Property::Rotation(axis) => axis.set(&mut t.rotation, value),
                        Property::Scale(axis) => axis.set(&mut t.scale, value),
                        Property::Opacity => {}
                    }
                }
                (Target::Overlay(name), Property::Opacity) => {
                    if let Some(opacity) = self.overlays.get_mut(name) {
                        *opacity = value;
                    }
                }
                _ => {}
            }
        }
    }
}

impl TrackSource for SceneState {
    fn base_value(&self, key: &TrackKey) -> Option<f32> {
        match (&key.target, key.property) {
            (Target::Camera, Property::Position(axis)) => Some(axis.get(self.camera.position)),
            (Target::Part(id), property) => {
                let t = self.graph.as_ref()?.transform(*id)?;
                match property {
                    Property::Position(axis) => Some(axis.get(t.position)),
                    Property::Rotation(axis) => Some(axis.get(t.rotation)),
                    Property::Scale(axis) => Some(axis.get(t.scale)),
                    Property::Opacity => None,
                }
            }
            (Target::Overlay(name), Property::Opacity) => self.overlays.get(name).copied(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;
    use crate::scene_graph::PartId;
    use crate::timeline::Axis;

    fn state() -> SceneState {
        let camera = PerspectiveCamera::new(&CameraSettings::default(), 1.0);
        SceneState::new(camera, Some(SceneGraph::new("model")), &["label-a"])
    }

    #[test]
    fn test_base_values() {
        let s = state();
        let cam_z = TrackKey {
            target: Target::Camera,
            property: Property::Position(Axis::Z),
        };
        assert_eq!(s.base_value(&cam_z), Some(5.0));

        let overlay = TrackKey {
            target: Target::Overlay("label-a".into()),
            property: Property::Opacity,
        };
        assert_eq!(s.base_value(&overlay), Some(0.0));

        let missing = TrackKey {
            target: Target::Part(PartId(7)),
            property: Property::Position(Axis::X),
        };
        assert_eq!(s.base_value(&missing), None);
    }

    #[test]
    fn test_camera_rotation_unsupported() {
        let key = TrackKey {
            target: Target::Camera,
            property: Property::Rotation(Axis::X),
        };
        assert_eq!(state().base_value(&key), None);
    }

    #[test]
    fn test_apply_writes_values() {
        let mut s = state();
        let mut values = TrackValues::new();
        values.insert(
            TrackKey {
                target: Target::Part(PartId(0)),
                property: Property::Rotation(Axis::Y),
            },
            1.25,
        );
        values.insert(
            TrackKey {
                target: Target::Overlay("label-a".into()),
                property: Property::Opacity,
            },
            0.5,
        );
        s.apply(&values);

        let graph = s.graph.as_ref().unwrap();
        assert_eq!(graph.transform(PartId(0)).unwrap().rotation.y, 1.25);
        assert_eq!(s.overlays["label-a"], 0.5);
    }

    #[test]
    fn test_apply_without_model_is_noop() {
        let camera = PerspectiveCamera::new(&CameraSettings::default(), 1.0);
        let mut s = SceneState::new::<&str>(camera, None, &[]);
        let mut values = TrackValues::new();
        values.insert(
            TrackKey {
                target: Target::Part(PartId(0)),
                property: Property::Position(Axis::X),
            },
            3.0,
        );
        s.apply(&values);
        assert!(s.graph.is_none());
    }
}
