//! Application configuration.
//!
//! Everything is optional in JSON; missing fields fall back to the values
//! the demo pages ship with.

use std::f32::consts::PI;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::easing::Ease;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraSettings,
    pub scene: SceneConfig,
    pub story: StoryConfig,
    pub scroll: ScrollConfig,
    pub tilt: TiltConfig,
    pub viewport: ViewportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::procedural()
    }
}

impl AppConfig {
    /// Icosahedron and satellites, no pointer tilt.
    pub fn procedural() -> Self {
        Self {
            camera: CameraSettings::default(),
            scene: SceneConfig::Procedural(ProceduralConfig::default()),
            story: StoryConfig::default(),
            scroll: ScrollConfig::default(),
            tilt: TiltConfig {
                enabled: false,
                ..TiltConfig::default()
            },
            viewport: ViewportConfig::default(),
        }
    }

    /// Loaded humanoid model with named explode parts and pointer tilt.
    pub fn asset(url: &str) -> Self {
        Self {
            scene: SceneConfig::Asset(AssetConfig {
                url: url.to_string(),
            }),
            story: StoryConfig {
                explode_parts: vec![
                    ExplodePart::labelled("visor", "label-visor"),
                    ExplodePart::labelled("backpack", "label-backpack"),
                    ExplodePart::labelled("Object_10", "label-body"),
                ],
                ..StoryConfig::default()
            },
            tilt: TiltConfig::default(),
            ..Self::procedural()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse config JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json_str(&contents)
    }
}

/// Perspective camera parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub start_z: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            start_z: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SceneConfig {
    Procedural(ProceduralConfig),
    Asset(AssetConfig),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProceduralConfig {
    pub satellites: usize,
    pub radius: f32,
}

impl Default for ProceduralConfig {
    fn default() -> Self {
        Self {
            satellites: 8,
            radius: 1.5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Where the host fetches the model from. Native hosts treat it as a path.
    pub url: String,
}

/// A named part that takes part in the explode stage, with an optional
/// overlay element revealed while it is exploded.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplodePart {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl ExplodePart {
    pub fn labelled(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: Some(label.to_string()),
        }
    }
}

/// Targets and timing of the five scroll stages.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoryConfig {
    pub intro_rotation: [f32; 3],
    pub intro_camera_z: f32,
    pub turn_rotation: [f32; 3],
    pub turn_root_offset: [f32; 3],
    pub pull_back_camera_z: f32,
    pub explode_factor: f32,
    pub reassemble_camera_z: f32,
    /// Parts to explode. Empty means every satellite of the procedural scene.
    pub explode_parts: Vec<ExplodePart>,
    pub tween_duration: f32,
    pub ease: Ease,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            intro_rotation: [2.0 * PI, 2.0 * PI, 0.0],
            intro_camera_z: 3.0,
            turn_rotation: [4.0 * PI, 4.0 * PI, 0.0],
            turn_root_offset: [0.0, 0.0, 0.0],
            pull_back_camera_z: 8.0,
            explode_factor: 2.5,
            reassemble_camera_z: 4.0,
            explode_parts: Vec::new(),
            tween_duration: 0.5,
            ease: Ease::Power1Out,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Seconds the play-head takes to catch up with the scroll position.
    /// Zero snaps immediately.
    pub scrub_lag: f32,
    pub scrub_ease: Ease,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            scrub_lag: 1.0,
            scrub_ease: Ease::Power3Out,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TiltConfig {
    pub enabled: bool,
    /// Fraction of the remaining distance covered each frame.
    pub damping: f32,
    /// Radians of tilt per unit of normalised pointer offset.
    pub amplitude: f32,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            damping: 0.05,
            amplitude: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub max_pixel_ratio: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { max_pixel_ratio: 2.0 }
    }
}
