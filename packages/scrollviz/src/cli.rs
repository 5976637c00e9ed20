//! Native command line for inspecting timelines and sweeping frames.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::{AppConfig, AssetConfig, SceneConfig};
use crate::model_asset::ModelAsset;
use crate::render::{FrameSink, JsonLinesSink};
use crate::timeline::{Label, Property, Target};
use crate::visualiser::{Viewport, Visualiser};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model asset (glTF, GLB or OBJ); selects the asset scene
    #[arg(long, global = true)]
    asset: Option<PathBuf>,

    /// Viewport width
    #[arg(long, global = true, default_value_t = 800)]
    width: u32,

    /// Viewport height
    #[arg(long, global = true, default_value_t = 600)]
    height: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print stage labels and every tween
    Timeline {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the scene at one scroll position
    Sample {
        /// Scroll progress in [0, 1]
        #[arg(long)]
        progress: f32,
    },
    /// Scroll top to bottom, writing one JSON frame per line
    Sweep {
        /// Number of scroll steps
        #[arg(long, default_value_t = 60)]
        steps: usize,

        /// Frames per second (sets the scrub step)
        #[arg(long, default_value_t = 60.0)]
        fps: f32,

        /// Output file, stdout if omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct TweenRow<'a> {
    target: String,
    property: Property,
    stage: Option<&'a str>,
    start: f32,
    end: f32,
    from: f32,
    to: f32,
}

#[derive(Serialize)]
struct TimelineReport<'a> {
    duration: f32,
    labels: &'a [Label],
    tweens: Vec<TweenRow<'a>>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut visualiser = load_visualiser(&cli)?;

    match cli.command {
        Commands::Timeline { json } => print_timeline(&visualiser, json)?,
        Commands::Sample { progress } => {
            visualiser.jump_to_progress(progress);
            let frame = visualiser.frame(0.0);
            println!("{}", serde_json::to_string_pretty(&frame)?);
        }
        Commands::Sweep { steps, fps, out } => {
            let writer: Box<dyn Write> = match &out {
                Some(path) => Box::new(BufWriter::new(
                    File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
                )),
                None => Box::new(BufWriter::new(std::io::stdout())),
            };
            let mut sink = JsonLinesSink::new(writer);
            sweep(&mut visualiser, steps, fps, &mut sink)?;
            sink.into_inner().flush()?;
        }
    }
    Ok(())
}

fn load_visualiser(cli: &Cli) -> Result<Visualiser> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => match &cli.asset {
            Some(asset) => AppConfig::asset(&asset.to_string_lossy()),
            None => AppConfig::procedural(),
        },
    };
    if let Some(asset) = &cli.asset {
        config.scene = SceneConfig::Asset(AssetConfig {
            url: asset.to_string_lossy().into_owned(),
        });
    }

    let asset_path = match &config.scene {
        SceneConfig::Asset(asset) => Some(PathBuf::from(&asset.url)),
        SceneConfig::Procedural(_) => None,
    };

    let viewport = Viewport {
        width: cli.width,
        height: cli.height,
        pixel_ratio: 1.0,
    };
    let mut visualiser = Visualiser::new(config, viewport)?;

    if let Some(path) = asset_path {
        // A broken asset degrades to an empty scene; it never aborts the run.
        match read_asset(&path) {
            Ok(asset) => visualiser.install_model(&asset)?,
            Err(e) => log::error!("Failed to load model: {:#}", e),
        }
    }
    Ok(visualiser)
}

fn read_asset(path: &Path) -> Result<ModelAsset> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    ModelAsset::from_bytes(&id, &bytes)
}

fn target_name(visualiser: &Visualiser, target: &Target) -> String {
    match target {
        Target::Camera => "camera".to_string(),
        Target::Part(id) => visualiser
            .scene()
            .and_then(|s| s.graph.get(*id))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("part#{}", id.0)),
        Target::Overlay(id) => format!("overlay:{}", id),
    }
}

fn print_timeline(visualiser: &Visualiser, json: bool) -> Result<()> {
    let timeline = visualiser.timeline();
    let mut tweens: Vec<TweenRow> = timeline
        .tracks()
        .flat_map(|(key, track)| {
            track.tweens.iter().map(move |tween| (key, tween))
        })
        .map(|(key, tween)| TweenRow {
            target: target_name(visualiser, &key.target),
            property: key.property,
            stage: tween.stage.as_deref(),
            start: tween.start,
            end: tween.end(),
            from: tween.from,
            to: tween.to,
        })
        .collect();
    tweens.sort_by(|a, b| a.start.total_cmp(&b.start));

    if json {
        let report = TimelineReport {
            duration: timeline.duration(),
            labels: timeline.labels(),
            tweens,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("duration {:.2}", timeline.duration());
    for label in timeline.labels() {
        println!("  @{:<6.2} {}", label.time, label.name);
    }
    for row in &tweens {
        println!(
            "  [{:>5.2} - {:>5.2}] {:<12} {:<16} {:?}: {:.3} -> {:.3}",
            row.start,
            row.end,
            row.stage.unwrap_or("-"),
            row.target,
            row.property,
            row.from,
            row.to
        );
    }
    Ok(())
}

/// Feed evenly spaced scroll positions, one per frame, then let the scrub settle.
fn sweep(visualiser: &mut Visualiser, steps: usize, fps: f32, sink: &mut dyn FrameSink) -> Result<()> {
    let dt = 1.0 / fps.max(1.0);
    let steps = steps.max(1);
    for i in 0..=steps {
        visualiser.set_progress(i as f32 / steps as f32);
        visualiser.render(dt, sink)?;
    }

    let settle_frames = (visualiser.config().scroll.scrub_lag / dt).ceil() as usize;
    for _ in 0..settle_frames {
        visualiser.render(dt, sink)?;
    }
    log::info!("Swept {} steps + {} settle frames", steps + 1, settle_frames);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FrameSnapshot;

    fn procedural() -> Visualiser {
        let viewport = Viewport {
            width: 800,
            height: 600,
            pixel_ratio: 1.0,
        };
        Visualiser::new(AppConfig::procedural(), viewport).unwrap()
    }

    #[test]
    fn test_sweep_settles_at_end() {
        let mut vis = procedural();
        let mut frames: Vec<FrameSnapshot> = Vec::new();
        sweep(&mut vis, 10, 60.0, &mut frames).unwrap();

        // 11 scroll steps, then about a second of settle frames
        assert!(frames.len() >= 11 + 59);
        let last = frames.last().unwrap();
        assert_eq!(last.head, vis.timeline().duration());
        assert_eq!(last.progress, 1.0);
    }

    #[test]
    fn test_target_names() {
        let vis = procedural();
        let core = vis.scene().unwrap().registry.get("core").unwrap();
        assert_eq!(target_name(&vis, &Target::Part(core)), "core");
        assert_eq!(target_name(&vis, &Target::Camera), "camera");
        assert_eq!(target_name(&vis, &Target::Overlay("x".into())), "overlay:x");
    }

    #[test]
    fn test_missing_asset_file_errors() {
        assert!(read_asset(Path::new("/nonexistent/model.glb")).is_err());
    }

    #[test]
    fn test_cli_parses_sweep() {
        let cli = Cli::try_parse_from(["scrollviz", "sweep", "--steps", "5", "--width", "1024"]).unwrap();
        assert_eq!(cli.width, 1024);
        assert!(matches!(cli.command, Commands::Sweep { steps: 5, .. }));
    }
}
