//! Frame snapshots and the sinks that consume them.
//!
//! Rasterisation happens outside this crate. Every frame is reduced to a
//! [`FrameSnapshot`] and handed to a [`FrameSink`]: the browser host draws
//! it with its own renderer, the CLI writes it out as JSON lines.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use glam::Vec3;
use serde::Serialize;

use crate::camera::PerspectiveCamera;
use crate::lighting::LightingConfig;
use crate::scene_graph::PartKind;
use crate::scene_state::SceneState;

/// Drawing-buffer size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartSnapshot {
    pub name: String,
    pub kind: PartKind,
    pub parent: Option<String>,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub progress: f32,
    pub head: f32,
    pub stage: Option<String>,
    pub camera: PerspectiveCamera,
    pub surface: SurfaceSize,
    /// Empty while no model is loaded.
    pub parts: Vec<PartSnapshot>,
    pub overlays: BTreeMap<String, f32>,
    pub lighting: LightingConfig,
}

impl FrameSnapshot {
    pub fn parts_from_state(state: &SceneState) -> Vec<PartSnapshot> {
        let Some(graph) = &state.graph else {
            return Vec::new();
        };
        graph
            .iter()
            .map(|(_, part)| PartSnapshot {
                name: part.name.clone(),
                kind: part.kind,
                parent: part
                    .parent
                    .and_then(|p| graph.get(p))
                    .map(|p| p.name.clone()),
                position: part.transform.position,
                rotation: part.transform.rotation,
                scale: part.transform.scale,
            })
            .collect()
    }

    pub fn part(&self, name: &str) -> Option<&PartSnapshot> {
        self.parts.iter().find(|p| p.name == name)
    }
}

/// CSS properties that show an overlay at `opacity`. Fully transparent
/// overlays are also hidden so they stop catching pointer events.
pub fn overlay_style(opacity: f32) -> [(&'static str, String); 2] {
    let visibility = if opacity > 0.0 { "visible" } else { "hidden" };
    [
        ("opacity", opacity.to_string()),
        ("visibility", visibility.to_string()),
    ]
}

/// Consumer of rendered frames.
pub trait FrameSink {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<()>;
}

/// Keeps every frame in memory.
impl FrameSink for Vec<FrameSnapshot> {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<()> {
        self.push(frame.clone());
        Ok(())
    }
}

/// Writes one JSON object per frame.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<()> {
        serde_json::to_writer(&mut self.writer, frame)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}
