//! The scroll-driven scene context.
//!
//! [`Visualiser`] owns everything a page would otherwise keep in globals:
//! scene, camera, lighting, timeline, scrub and tilt state, viewport. Hosts
//! feed it scroll, pointer and resize input and call [`Visualiser::frame`]
//! once per display refresh.

use anyhow::Result;

use crate::camera::PerspectiveCamera;
use crate::config::{AppConfig, SceneConfig};
use crate::input::{normalize_pointer, MouseTilt};
use crate::lighting::LightingConfig;
use crate::model_asset::ModelAsset;
use crate::render::{FrameSink, FrameSnapshot, SurfaceSize};
use crate::scene_builder::{build_from_asset, build_procedural, BuiltScene};
use crate::scene_state::SceneState;
use crate::scroll::{scroll_progress, ScrubController};
use crate::storyboard::build_storyboard;
use crate::timeline::{Timeline, TimelineError};

/// CSS-pixel viewport plus device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

pub struct Visualiser {
    config: AppConfig,
    scene: Option<BuiltScene>,
    lighting: LightingConfig,
    camera: PerspectiveCamera,
    base: SceneState,
    timeline: Timeline,
    scrub: ScrubController,
    tilt: MouseTilt,
    viewport: Viewport,
    surface: SurfaceSize,
    progress: f32,
    frame_index: u64,
}

impl Visualiser {
    /// Build the scene for `config`. Procedural scenes are ready at once;
    /// asset scenes stay empty until [`Visualiser::install_model`].
    pub fn new(config: AppConfig, viewport: Viewport) -> Result<Self, TimelineError> {
        let scene = match &config.scene {
            SceneConfig::Procedural(p) => Some(build_procedural(p)),
            SceneConfig::Asset(_) => None,
        };
        let camera = PerspectiveCamera::new(&config.camera, 1.0);

        let mut visualiser = Self {
            scene,
            lighting: LightingConfig::new(),
            camera,
            base: SceneState::new::<&str>(camera, None, &[]),
            timeline: Timeline::default(),
            scrub: ScrubController::new(config.scroll.scrub_lag, config.scroll.scrub_ease),
            tilt: MouseTilt::new(&config.tilt),
            viewport,
            surface: SurfaceSize::default(),
            progress: 0.0,
            frame_index: 0,
            config,
        };
        visualiser.resize(viewport.width, viewport.height, viewport.pixel_ratio);
        visualiser.rebuild()?;
        Ok(visualiser)
    }

    /// Populate the scene from a loaded asset and rebuild the timeline.
    pub fn install_model(&mut self, asset: &ModelAsset) -> Result<(), TimelineError> {
        self.scene = Some(build_from_asset(asset));
        self.rebuild()
    }

    fn rebuild(&mut self) -> Result<(), TimelineError> {
        let overlay_ids: Vec<&str> = self
            .config
            .story
            .explode_parts
            .iter()
            .filter_map(|p| p.label.as_deref())
            .collect();
        self.base = SceneState::new(
            self.camera,
            self.scene.as_ref().map(|s| s.graph.clone()),
            &overlay_ids,
        );
        self.timeline = build_storyboard(&self.base, self.scene.as_ref(), &self.config.story)?;

        // Duration may have changed; keep the page position, not the head.
        self.scrub.snap(self.timeline.head_for_progress(self.progress));
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn lighting(&self) -> &LightingConfig {
        &self.lighting
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn has_model(&self) -> bool {
        self.scene.is_some()
    }

    pub fn scene(&self) -> Option<&BuiltScene> {
        self.scene.as_ref()
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn head(&self) -> f32 {
        self.scrub.head()
    }

    pub fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
        self.scrub
            .set_target(self.timeline.head_for_progress(self.progress));
    }

    /// Set progress and move the head there without scrubbing.
    pub fn jump_to_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
        self.scrub.snap(self.timeline.head_for_progress(self.progress));
    }

    pub fn set_scroll(&mut self, scroll_top: f32, scroll_height: f32, client_height: f32) {
        self.set_progress(scroll_progress(scroll_top, scroll_height, client_height));
    }

    pub fn set_pointer(&mut self, client_x: f32, client_y: f32) {
        let pointer = normalize_pointer(client_x, client_y, self.viewport.width, self.viewport.height);
        self.tilt.set_pointer(pointer);
    }

    /// Match camera aspect and drawing-buffer size to the viewport.
    /// Zero-sized viewports are ignored.
    pub fn resize(&mut self, width: u32, height: u32, pixel_ratio: f32) {
        if width == 0 || height == 0 {
            return;
        }
        let ratio = pixel_ratio.clamp(1.0, self.config.viewport.max_pixel_ratio.max(1.0));
        self.viewport = Viewport {
            width,
            height,
            pixel_ratio: ratio,
        };
        self.camera.aspect = width as f32 / height as f32;
        self.base.camera.aspect = self.camera.aspect;
        self.surface = SurfaceSize {
            width: (width as f32 * ratio).round() as u32,
            height: (height as f32 * ratio).round() as u32,
        };
        log::debug!(
            "Resized to {}x{} (surface {}x{})",
            width,
            height,
            self.surface.width,
            self.surface.height
        );
    }

    /// Scene state at a play-head position. Depends on nothing else.
    pub fn state_at_head(&self, head: f32) -> SceneState {
        let mut state = self.base.clone();
        state.apply(&self.timeline.sample(head));
        state
    }

    pub fn state_at_progress(&self, progress: f32) -> SceneState {
        self.state_at_head(self.timeline.head_for_progress(progress))
    }

    /// Advance one display refresh and capture the frame.
    pub fn frame(&mut self, dt: f32) -> FrameSnapshot {
        let head = self.scrub.advance(dt);
        let mut state = self.state_at_head(head);

        if self.config.tilt.enabled {
            if let Some(scene) = &self.scene {
                self.tilt.step();
                let offset = self.tilt.rotation_offset();
                if let Some(t) = state.graph.as_mut().and_then(|g| g.transform_mut(scene.root())) {
                    t.rotation += offset;
                }
            }
        }

        let snapshot = FrameSnapshot {
            frame: self.frame_index,
            progress: self.progress,
            head,
            stage: self.timeline.stage_at(head).map(str::to_string),
            camera: state.camera,
            surface: self.surface,
            parts: FrameSnapshot::parts_from_state(&state),
            overlays: state.overlays,
            lighting: self.lighting,
        };
        self.frame_index += 1;
        snapshot
    }

    pub fn render(&mut self, dt: f32, sink: &mut dyn FrameSink) -> Result<()> {
        let frame = self.frame(dt);
        sink.draw(&frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrollConfig;

    fn viewport() -> Viewport {
        Viewport {
            width: 800,
            height: 600,
            pixel_ratio: 1.0,
        }
    }

    fn instant() -> AppConfig {
        AppConfig {
            scroll: ScrollConfig {
                scrub_lag: 0.0,
                ..ScrollConfig::default()
            },
            ..AppConfig::procedural()
        }
    }

    #[test]
    fn test_new_procedural_has_model() {
        let vis = Visualiser::new(AppConfig::procedural(), viewport()).unwrap();
        assert!(vis.has_model());
        assert!((vis.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!(vis.timeline().duration() > 0.0);
    }

    #[test]
    fn test_asset_scene_starts_empty() {
        let mut vis = Visualiser::new(AppConfig::asset("model.glb"), viewport()).unwrap();
        assert!(!vis.has_model());
        let frame = vis.frame(0.016);
        assert!(frame.parts.is_empty());
    }

    #[test]
    fn test_resize_caps_pixel_ratio() {
        let mut vis = Visualiser::new(AppConfig::procedural(), viewport()).unwrap();
        vis.resize(1000, 500, 3.0);
        assert_eq!(vis.surface(), SurfaceSize { width: 2000, height: 1000 });
        assert_eq!(vis.camera().aspect, 2.0);
    }

    #[test]
    fn test_resize_ignores_zero() {
        let mut vis = Visualiser::new(AppConfig::procedural(), viewport()).unwrap();
        vis.resize(0, 500, 1.0);
        assert_eq!(vis.viewport(), viewport());
    }

    #[test]
    fn test_frame_follows_progress() {
        let mut vis = Visualiser::new(instant(), viewport()).unwrap();
        vis.set_progress(1.0);
        let frame = vis.frame(0.016);
        assert_eq!(frame.head, vis.timeline().duration());
        assert_eq!(frame.stage.as_deref(), Some("reassemble"));
        assert!((frame.camera.position.z - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_jump_skips_scrub() {
        let mut vis = Visualiser::new(AppConfig::procedural(), viewport()).unwrap();
        vis.jump_to_progress(0.5);
        assert_eq!(vis.head(), vis.timeline().duration() * 0.5);
        let frame = vis.frame(0.016);
        assert_eq!(frame.head, vis.timeline().duration() * 0.5);
    }

    #[test]
    fn test_scrub_lags_behind_progress() {
        let mut vis = Visualiser::new(AppConfig::procedural(), viewport()).unwrap();
        vis.set_progress(1.0);
        let frame = vis.frame(0.1);
        assert!(frame.head > 0.0);
        assert!(frame.head < vis.timeline().duration());
    }

    #[test]
    fn test_scroll_sets_progress() {
        let mut vis = Visualiser::new(instant(), viewport()).unwrap();
        vis.set_scroll(500.0, 2000.0, 1000.0);
        assert_eq!(vis.progress(), 0.5);
    }

    #[test]
    fn test_frame_counter_and_sink() {
        let mut vis = Visualiser::new(instant(), viewport()).unwrap();
        let mut frames: Vec<FrameSnapshot> = Vec::new();
        vis.render(0.016, &mut frames).unwrap();
        vis.render(0.016, &mut frames).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].frame, 1);
    }
}
