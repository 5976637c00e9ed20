//! Pointer input and the damped mouse tilt it drives.

use glam::{Vec2, Vec3};

use crate::config::TiltConfig;

/// Map client pixel coordinates to [-1, 1] with +Y up.
pub fn normalize_pointer(client_x: f32, client_y: f32, width: u32, height: u32) -> Vec2 {
    if width == 0 || height == 0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        (client_x / width as f32) * 2.0 - 1.0,
        -(client_y / height as f32) * 2.0 + 1.0,
    )
}

/// Pointer-driven tilt, smoothed with a first-order exponential filter.
///
/// Each [`MouseTilt::step`] covers `damping` of the remaining distance to
/// `pointer * amplitude`, so with damping in (0, 1] the tilt approaches the
/// target monotonically and never overshoots.
#[derive(Debug, Clone)]
pub struct MouseTilt {
    damping: f32,
    amplitude: f32,
    pointer: Vec2,
    current: Vec2,
}

impl MouseTilt {
    pub fn new(config: &TiltConfig) -> Self {
        Self {
            damping: config.damping.clamp(0.0, 1.0),
            amplitude: config.amplitude,
            pointer: Vec2::ZERO,
            current: Vec2::ZERO,
        }
    }

    pub fn set_pointer(&mut self, pointer: Vec2) {
        self.pointer = pointer;
    }

    pub fn target(&self) -> Vec2 {
        self.pointer * self.amplitude
    }

    pub fn current(&self) -> Vec2 {
        self.current
    }

    /// Advance one frame.
    pub fn step(&mut self) -> Vec2 {
        self.current += (self.target() - self.current) * self.damping;
        self.current
    }

    /// Euler offset for the model: pointer Y pitches, pointer X yaws.
    pub fn rotation_offset(&self) -> Vec3 {
        Vec3::new(self.current.y, self.current.x, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tilt() -> MouseTilt {
        MouseTilt::new(&TiltConfig::default())
    }

    #[test]
    fn test_normalize_corners() {
        assert_eq!(normalize_pointer(0.0, 0.0, 800, 600), Vec2::new(-1.0, 1.0));
        assert_eq!(normalize_pointer(800.0, 600.0, 800, 600), Vec2::new(1.0, -1.0));
        assert_eq!(normalize_pointer(400.0, 300.0, 800, 600), Vec2::ZERO);
    }

    #[test]
    fn test_normalize_zero_viewport() {
        assert_eq!(normalize_pointer(10.0, 10.0, 0, 600), Vec2::ZERO);
    }

    #[test]
    fn test_first_step_is_damped() {
        let mut t = tilt();
        t.set_pointer(Vec2::new(1.0, 0.0));
        let v = t.step();
        assert!((v.x - 0.2 * 0.05).abs() < 1e-7);
    }

    #[test]
    fn test_converges_without_overshoot() {
        let mut t = tilt();
        t.set_pointer(Vec2::new(1.0, -0.5));
        let target = t.target();
        assert_eq!(target, Vec2::new(0.2, -0.1));

        let mut prev_gap = (target - t.current()).length();
        for _ in 0..500 {
            let v = t.step();
            assert!(v.x <= target.x);
            assert!(v.y >= target.y);
            let gap = (target - v).length();
            assert!(gap <= prev_gap);
            prev_gap = gap;
        }
        assert!(prev_gap < 1e-6);
    }

    #[test]
    fn test_rotation_offset_axes() {
        let mut t = tilt();
        t.set_pointer(Vec2::new(1.0, 0.5));
        for _ in 0..1000 {
            t.step();
        }
        let offset = t.rotation_offset();
        assert!((offset.y - 0.2).abs() < 1e-4);
        assert!((offset.x - 0.1).abs() < 1e-4);
        assert_eq!(offset.z, 0.0);
    }
}
