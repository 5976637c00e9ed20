//! Scene lighting: one ambient term and one directional light.
//!
//! The host renderer owns shading; this module only carries the rig so
//! every frame snapshot describes the complete scene.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::Serialize;

/// Global lighting configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LightingConfig {
    /// Ambient light color (RGB, 0-1 range).
    pub ambient_color: Vec3,

    /// Ambient light intensity (adds to all surfaces equally).
    pub ambient_intensity: f32,

    /// Directional light color (RGB, 0-1 range).
    pub directional_color: Vec3,

    /// Directional light intensity multiplier.
    pub directional_intensity: f32,

    /// Position of the directional light. It shines towards the origin.
    pub directional_position: Vec3,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: hex_color(0xffffff),
            ambient_intensity: 0.5,
            directional_color: hex_color(0xffffff),
            directional_intensity: 1.0,
            directional_position: Vec3::new(5.0, 5.0, 5.0),
        }
    }
}

impl LightingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_uniforms(&self) -> LightingUniforms {
        // Direction points FROM the light source
        let dir = -self.directional_position;
        let dir_normalized = if dir.length() > 0.001 {
            dir.normalize()
        } else {
            // Fallback to down direction
            Vec3::NEG_Y
        };

        LightingUniforms {
            direction: dir_normalized.extend(0.0).to_array(),
            color: self.directional_color.extend(1.0).to_array(),
            ambient_color: self.ambient_color.extend(1.0).to_array(),
            intensity: self.directional_intensity,
            ambient: self.ambient_intensity,
            _padding: [0.0; 2],
        }
    }
}

/// Convert a `0xRRGGBB` color to RGB floats in 0-1.
pub fn hex_color(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// GPU-ready lighting uniforms.
/// Total size: 64 bytes (16-byte aligned).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightingUniforms {
    pub direction: [f32; 4],     // 16 bytes
    pub color: [f32; 4],         // 16 bytes
    pub ambient_color: [f32; 4], // 16 bytes
    pub intensity: f32,          // 4 bytes
    pub ambient: f32,            // 4 bytes
    pub _padding: [f32; 2],      // 8 bytes
}
