//! Label-keyed tween timeline.
//!
//! A [`TimelineBuilder`] collects [`Segment`]s, each placed at an absolute
//! time, at a named [`Label`], or appended after everything so far. Building
//! resolves every segment into per-property [`Track`]s whose start values
//! are fixed up front, so sampling the finished [`Timeline`] is a pure
//! function of the play-head.
//!
//! Placement rules:
//! - `At(t)` starts at `t`.
//! - `Label(name)` starts at the label. An unknown label is created at the
//!   current end of the timeline first.
//! - `Append` starts at the current end (the latest end time so far).
//!
//! Segments sharing a label run in parallel. Label times never decrease in
//! declaration order.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::Serialize;
use thiserror::Error;

use crate::easing::{lerp, Ease};
use crate::scene_graph::PartId;

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("label '{label}' at {time} would precede label '{previous}' at {previous_time}")]
    LabelRewind {
        label: String,
        time: f32,
        previous: String,
        previous_time: f32,
    },
    #[error("label '{0}' already exists")]
    DuplicateLabel(String),
    #[error("negative placement time {0}")]
    NegativeTime(f32),
    #[error("negative tween duration {0}")]
    NegativeDuration(f32),
}

/// What a segment animates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Camera,
    Part(PartId),
    /// Host overlay element (e.g. a text label) addressed by id.
    Overlay(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn get(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    pub fn set(self, v: &mut Vec3, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
            Axis::Z => v.z = value,
        }
    }
}

/// A single animatable scalar of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Position(Axis),
    Rotation(Axis),
    Scale(Axis),
    Opacity,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TrackKey {
    pub target: Target,
    pub property: Property,
}

/// Where a segment starts.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    At(f32),
    Label(String),
    Append,
}

impl Placement {
    pub fn label(name: &str) -> Self {
        Placement::Label(name.to_string())
    }
}

/// One interpolation from the current value of some properties to new ones.
#[derive(Debug, Clone)]
pub struct Segment {
    pub target: Target,
    pub values: Vec<(Property, f32)>,
    pub placement: Placement,
    /// Falls back to the builder default when `None`.
    pub duration: Option<f32>,
    pub ease: Option<Ease>,
}

impl Segment {
    pub fn to(target: Target) -> Self {
        Self {
            target,
            values: Vec::new(),
            placement: Placement::Append,
            duration: None,
            ease: None,
        }
    }

    pub fn position(mut self, v: Vec3) -> Self {
        self.values
            .extend(Axis::ALL.map(|a| (Property::Position(a), a.get(v))));
        self
    }

    pub fn position_axis(mut self, axis: Axis, value: f32) -> Self {
        self.values.push((Property::Position(axis), value));
        self
    }

    pub fn rotation(mut self, v: Vec3) -> Self {
        self.values
            .extend(Axis::ALL.map(|a| (Property::Rotation(a), a.get(v))));
        self
    }

    pub fn opacity(mut self, value: f32) -> Self {
        self.values.push((Property::Opacity, value));
        self
    }

    pub fn at(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = Some(ease);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub name: String,
    pub time: f32,
}

/// A resolved scalar interpolation on one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub start: f32,
    pub duration: f32,
    #[serde(skip)]
    pub ease: Ease,
    /// Label in effect when the tween starts.
    pub stage: Option<String>,
}

impl Tween {
    pub fn end(&self) -> f32 {
        self.start + self.duration
    }

    fn value_at(&self, head: f32) -> f32 {
        if head >= self.end() {
            return self.to;
        }
        let t = (head - self.start) / self.duration;
        lerp(self.from, self.to, self.ease.apply(t))
    }
}

/// All tweens of a single property, sorted by start time.
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    pub initial: f32,
    pub tweens: Vec<Tween>,
}

impl Track {
    /// Value of the property at `head`. Tweens that started later win where
    /// tweens overlap.
    pub fn sample(&self, head: f32) -> f32 {
        let mut value = self.initial;
        for tween in &self.tweens {
            if head < tween.start {
                break;
            }
            value = tween.value_at(head);
        }
        value
    }
}

/// Supplies the base (pre-timeline) value of a property.
pub trait TrackSource {
    fn base_value(&self, key: &TrackKey) -> Option<f32>;
}

pub type TrackValues = BTreeMap<TrackKey, f32>;

struct PlacedSegment {
    segment: Segment,
    start: f32,
    duration: f32,
    ease: Ease,
    stage: Option<String>,
}

pub struct TimelineBuilder {
    default_duration: f32,
    default_ease: Ease,
    labels: Vec<Label>,
    placed: Vec<PlacedSegment>,
    end: f32,
}

impl TimelineBuilder {
    pub fn new(default_duration: f32, default_ease: Ease) -> Self {
        Self {
            default_duration,
            default_ease,
            labels: Vec::new(),
            placed: Vec::new(),
            end: 0.0,
        }
    }

    /// Current end of the timeline.
    pub fn end(&self) -> f32 {
        self.end
    }

    pub fn label_time(&self, name: &str) -> Option<f32> {
        self.labels.iter().find(|l| l.name == name).map(|l| l.time)
    }

    /// Declare a label. Returns its time.
    pub fn add_label(&mut self, name: &str, placement: Placement) -> Result<f32, TimelineError> {
        if self.label_time(name).is_some() {
            return Err(TimelineError::DuplicateLabel(name.to_string()));
        }
        let time = match placement {
            Placement::At(t) if t < 0.0 => return Err(TimelineError::NegativeTime(t)),
            Placement::At(t) => t,
            Placement::Label(other) => match self.label_time(&other) {
                Some(t) => t,
                None => self.end,
            },
            Placement::Append => self.end,
        };
        if let Some(last) = self.labels.last() {
            if time < last.time {
                return Err(TimelineError::LabelRewind {
                    label: name.to_string(),
                    time,
                    previous: last.name.clone(),
                    previous_time: last.time,
                });
            }
        }
        self.labels.push(Label {
            name: name.to_string(),
            time,
        });
        Ok(time)
    }

    /// Place a segment. Returns its start time.
    pub fn add(&mut self, segment: Segment) -> Result<f32, TimelineError> {
        let start = match &segment.placement {
            Placement::At(t) if *t < 0.0 => return Err(TimelineError::NegativeTime(*t)),
            Placement::At(t) => *t,
            Placement::Label(name) => match self.label_time(name) {
                Some(t) => t,
                None => self.add_label(name, Placement::Append)?,
            },
            Placement::Append => self.end,
        };
        let duration = segment.duration.unwrap_or(self.default_duration);
        if duration < 0.0 {
            return Err(TimelineError::NegativeDuration(duration));
        }
        let ease = segment.ease.unwrap_or(self.default_ease);
        let stage = match &segment.placement {
            Placement::Label(name) => Some(name.clone()),
            _ => self
                .labels
                .iter()
                .rev()
                .find(|l| l.time <= start)
                .map(|l| l.name.clone()),
        };

        self.end = self.end.max(start + duration);
        self.placed.push(PlacedSegment {
            segment,
            start,
            duration,
            ease,
            stage,
        });
        Ok(start)
    }

    /// Resolve start values against `source` and freeze the timeline.
    ///
    /// Properties the source cannot resolve are dropped with a warning.
    pub fn build(self, source: &impl TrackSource) -> Timeline {
        let mut pending: BTreeMap<TrackKey, Vec<(f32, usize, f32, f32, Ease, Option<String>)>> =
            BTreeMap::new();
        let mut order = 0;
        for placed in &self.placed {
            for &(property, to) in &placed.segment.values {
                let key = TrackKey {
                    target: placed.segment.target.clone(),
                    property,
                };
                pending.entry(key).or_default().push((
                    placed.start,
                    order,
                    placed.duration,
                    to,
                    placed.ease,
                    placed.stage.clone(),
                ));
                order += 1;
            }
        }

        let mut tracks = BTreeMap::new();
        let mut dropped = 0;
        for (key, mut entries) in pending {
            let Some(initial) = source.base_value(&key) else {
                log::warn!("Dropping {} tween(s) for unresolved {:?}", entries.len(), key);
                dropped += entries.len();
                continue;
            };
            entries.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            let mut track = Track {
                initial,
                tweens: Vec::with_capacity(entries.len()),
            };
            for (start, _, duration, to, ease, stage) in entries {
                // Implicit start value: whatever the property holds when the tween begins.
                let from = track.sample(start);
                track.tweens.push(Tween {
                    from,
                    to,
                    start,
                    duration,
                    ease,
                    stage,
                });
            }
            tracks.insert(key, track);
        }

        log::debug!(
            "Timeline built: {} tracks, {} labels, duration {:.2}, {} tween(s) dropped",
            tracks.len(),
            self.labels.len(),
            self.end,
            dropped
        );

        Timeline {
            tracks,
            labels: self.labels,
            duration: self.end,
        }
    }
}

/// A frozen timeline. Sampling never mutates it.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    tracks: BTreeMap<TrackKey, Track>,
    labels: Vec<Label>,
    duration: f32,
}

impl Timeline {
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Labels in declaration order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn label(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.name == name)
    }

    pub fn tracks(&self) -> impl Iterator<Item = (&TrackKey, &Track)> {
        self.tracks.iter()
    }

    pub fn track(&self, key: &TrackKey) -> Option<&Track> {
        self.tracks.get(key)
    }

    pub fn tween_count(&self) -> usize {
        self.tracks.values().map(|t| t.tweens.len()).sum()
    }

    /// Tweens tagged with the given stage label.
    pub fn stage_tweens<'a>(&'a self, stage: &'a str) -> impl Iterator<Item = (&'a TrackKey, &'a Tween)> {
        self.tracks.iter().flat_map(move |(key, track)| {
            track
                .tweens
                .iter()
                .filter(move |t| t.stage.as_deref() == Some(stage))
                .map(move |t| (key, t))
        })
    }

    /// Map scroll progress to a play-head position.
    pub fn head_for_progress(&self, progress: f32) -> f32 {
        progress.clamp(0.0, 1.0) * self.duration
    }

    /// Latest label at or before `head`.
    pub fn stage_at(&self, head: f32) -> Option<&str> {
        self.labels
            .iter()
            .rev()
            .find(|l| l.time <= head)
            .map(|l| l.name.as_str())
    }

    pub fn sample(&self, head: f32) -> TrackValues {
        self.tracks
            .iter()
            .map(|(key, track)| (key.clone(), track.sample(head)))
            .collect()
    }

    pub fn sample_progress(&self, progress: f32) -> TrackValues {
        self.sample(self.head_for_progress(progress))
    }
}
