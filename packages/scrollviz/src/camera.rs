//! Perspective camera.
//!
//! The camera looks down -Z from its position. Only the position is driven
//! by the scroll timeline; aspect ratio follows the viewport.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use serde::Serialize;

use crate::config::CameraSettings;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    pub fn new(settings: &CameraSettings, aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, settings.start_z),
            fov: settings.fov,
            aspect,
            near: settings.near,
            far: settings.far,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, Vec3::NEG_Z, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn to_uniforms(&self) -> CameraUniforms {
        CameraUniforms {
            view_proj: self.view_projection_matrix().to_cols_array_2d(),
            position: [self.position.x, self.position.y, self.position.z, 1.0],
            fov: self.fov,
            aspect: self.aspect,
            near: self.near,
            far: self.far,
        }
    }
}

/// GPU-ready camera block for hosts that upload their own uniforms.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4], // 64 bytes
    pub position: [f32; 4],       // 16 bytes
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
} // Total: 96 bytes
