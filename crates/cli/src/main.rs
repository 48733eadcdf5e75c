#![deny(unsafe_code)]
//! CLI binary for the fieldlines overlay.
//!
//! Subcommands:
//! - `render [scene]`: run the overlay for N frames, write the last frame as JSON or SVG
//! - `config`: print the default configuration and its schema

mod error;
mod scene;
mod svg_sink;

use clap::{Parser, Subcommand, ValueEnum};
use error::CliError;
use fieldlines_core::{FieldOverlay, FrameInput, OverlayConfig, OverlayFrame};
use scene::Scene;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use svg_sink::SvgSink;

#[derive(Parser)]
#[command(name = "fieldlines", about = "Equipotential contours and field lines for point sources")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Svg,
}

#[derive(Subcommand)]
enum Command {
    /// Run the overlay over a scene and write the final frame.
    Render {
        /// Scene file (JSON). Uses a built-in charge pair when omitted.
        scene: Option<PathBuf>,

        /// Number of frames to run before writing output.
        #[arg(short, long, default_value_t = 1)]
        frames: u64,

        /// Overlay configuration as a flat JSON object.
        #[arg(long, default_value = "{}")]
        config: String,

        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Svg)]
        format: Format,

        /// Output file path. Writes to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip equipotential contours.
        #[arg(long)]
        no_contours: bool,

        /// Skip field lines.
        #[arg(long)]
        no_streamlines: bool,
    },
    /// Print the default overlay configuration and its schema.
    Config,
}

struct RenderArgs {
    scene: Option<PathBuf>,
    frames: u64,
    config: String,
    format: Format,
    output: Option<PathBuf>,
    show_contours: bool,
    show_streamlines: bool,
}

fn parse_config(text: &str) -> Result<OverlayConfig, CliError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| CliError::Input(format!("invalid --config JSON: {e}")))?;
    if !value.is_object() {
        return Err(CliError::Input("--config must be a JSON object".into()));
    }
    Ok(OverlayConfig::from_json(&value))
}

fn encode(frame: &OverlayFrame<'_>, scene: &Scene, format: Format) -> Result<String, CliError> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(frame)?),
        Format::Svg => {
            let mut sink = SvgSink::new(scene.bounds());
            frame.draw(&mut sink);
            log::debug!("svg: {} primitives", sink.primitives());
            Ok(sink.into_document().to_string())
        }
    }
}

fn write_output(path: Option<&Path>, body: &str) -> Result<(), CliError> {
    match path {
        Some(path) => std::fs::write(path, body)
            .map_err(|e| CliError::Io(format!("{}: {e}", path.display()))),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{body}").map_err(|e| CliError::Io(e.to_string()))
        }
    }
}

/// Runs frames `1..=frames` and returns the last one. Earlier frames only
/// advance the contour cache, the way a live host would between draws.
fn run_frames<'o>(
    overlay: &'o mut FieldOverlay,
    input: &mut FrameInput<'_>,
    frames: u64,
) -> OverlayFrame<'o> {
    for index in 1..frames {
        input.frame_index = index;
        overlay.frame(input);
    }
    input.frame_index = frames;
    overlay.frame(input)
}

fn render(args: RenderArgs, json: bool) -> Result<(), CliError> {
    let scene = match &args.scene {
        Some(path) => Scene::load(path)?,
        None => Scene::default(),
    };
    let mut overlay = FieldOverlay::new(parse_config(&args.config)?)?;
    let transform = scene.transform();
    let mut input = FrameInput {
        particles: &scene.particles,
        magnets: &scene.magnets,
        bounds: scene.bounds(),
        transform: &transform,
        show_contours: args.show_contours,
        show_streamlines: args.show_streamlines,
        frame_index: 0,
    };

    let frames = args.frames.max(1);
    let frame = run_frames(&mut overlay, &mut input, frames);
    let segments = frame.segment_count();
    let levels = frame.contours.len();
    let streamlines = frame.streamlines.len();
    let body = encode(&frame, &scene, args.format)?;
    write_output(args.output.as_deref(), &body)?;

    let recomputes = overlay.cache().recomputes();
    let destination = args
        .output
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout".into());
    if json {
        let info = serde_json::json!({
            "frames": frames,
            "levels": levels,
            "segments": segments,
            "streamlines": streamlines,
            "recomputes": recomputes,
            "output": destination,
        });
        let text = serde_json::to_string_pretty(&info)?;
        // stdout already carries the frame itself
        if args.output.is_some() {
            println!("{text}");
        } else {
            eprintln!("{text}");
        }
    } else {
        eprintln!(
            "rendered {frames} frames ({levels} levels, {segments} segments, \
             {streamlines} field lines, {recomputes} recomputes) -> {destination}"
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Config => {
            let defaults = OverlayConfig::default().to_json();
            if cli.json {
                let info = serde_json::json!({
                    "defaults": defaults,
                    "schema": OverlayConfig::schema(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Defaults:");
                println!("{}", serde_json::to_string_pretty(&defaults)?);
            }
        }
        Command::Render {
            scene,
            frames,
            config,
            format,
            output,
            no_contours,
            no_streamlines,
        } => {
            let args = RenderArgs {
                scene,
                frames,
                config,
                format,
                output,
                show_contours: !no_contours,
                show_streamlines: !no_streamlines,
            };
            render(args, cli.json)?;
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
