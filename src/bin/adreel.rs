use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "adreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render the full ad video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct FaceArgs {
    /// Regular TTF/OTF font for scene text.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Bold font for the title. Falls back to `--font`.
    #[arg(long)]
    bold_font: Option<PathBuf>,

    /// Draw placeholder blocks instead of glyphs (no font needed).
    #[arg(long, default_value_t = false)]
    draft: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Scene script JSON.
    #[arg(long)]
    scenes: PathBuf,

    /// Product title.
    #[arg(long)]
    title: String,

    /// Scene index (0-based).
    #[arg(long, default_value_t = 0)]
    scene: usize,

    /// Frame within the scene (0-based).
    #[arg(long, default_value_t = 0)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    face: FaceArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Scene script JSON. Narration paths are relative to this file.
    #[arg(long)]
    scenes: PathBuf,

    /// Product title.
    #[arg(long)]
    title: String,

    /// Output path. Defaults to the suggested `<title>_ad.<ext>` in the current directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output container: webm or mp4.
    #[arg(long, default_value = "webm")]
    container: adreel::Container,

    /// Narration clips loaded in parallel.
    #[arg(long, default_value_t = 4)]
    narration_jobs: usize,

    /// Ignore narration clips referenced by the script.
    #[arg(long, default_value_t = false)]
    no_narration: bool,

    /// Frames buffered ahead of ffmpeg.
    #[arg(long, default_value_t = adreel::DEFAULT_QUEUE_CAPACITY)]
    queue: usize,

    #[command(flatten)]
    face: FaceArgs,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let script = adreel::ScriptDef::from_path(&args.scenes)?;
    let timeline = script.to_timeline()?;
    let scene = timeline.scene(args.scene).with_context(|| {
        format!(
            "scene {} out of range (script has {})",
            args.scene,
            timeline.len()
        )
    })?;
    let frames = timeline.frames_for_scene(args.scene, adreel::FPS_30);
    if args.frame >= frames {
        anyhow::bail!(
            "frame {} out of range (scene {} has {frames} frames)",
            args.frame,
            args.scene
        );
    }
    let seq = timeline
        .frames_before_scene(args.scene, adreel::FPS_30)
        .saturating_add(args.frame);

    let mut renderer = adreel::FrameRenderer::new(load_face(&args.face)?)?;
    let state = adreel::RenderState {
        scene_index: args.scene,
        frame_in_scene: args.frame,
    };
    let frame = renderer.render(
        adreel::FrameIndex(seq),
        &state,
        scene,
        &args.title,
        timeline.len(),
    )?;

    adreel::ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let script = adreel::ScriptDef::from_path(&args.scenes)?;
    let timeline = if args.no_narration {
        script.to_timeline()?
    } else {
        let root = args.scenes.parent().unwrap_or_else(|| Path::new("."));
        let source = adreel::FileNarrationSource::new(root);
        adreel::resolve_narrations(&script, &source, args.narration_jobs)?
    };

    let renderer = adreel::FrameRenderer::new(load_face(&args.face)?)?;
    let opts = adreel::PipelineOpts {
        container: args.container,
        queue_capacity: args.queue,
    };
    let mut orch =
        adreel::PipelineOrchestrator::new(renderer, adreel::FfmpegEncoder::default(), opts);
    let artifact = orch.run(&timeline, &args.title)?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(&artifact.suggested_filename));
    adreel::ensure_parent_dir(&out)?;
    std::fs::write(&out, &artifact.bytes)
        .with_context(|| format!("write video '{}'", out.display()))?;

    let stats = orch.stats();
    eprintln!(
        "wrote {} ({}, {} frames, {} bytes)",
        out.display(),
        artifact.mime_type,
        stats.frames_submitted,
        artifact.bytes.len()
    );
    Ok(())
}

fn load_face(args: &FaceArgs) -> anyhow::Result<Box<dyn adreel::FontFace>> {
    if args.draft {
        return Ok(Box::new(adreel::BlockFace::default()));
    }
    let Some(font) = args.font.as_ref() else {
        anyhow::bail!("pass --font <ttf/otf> or --draft");
    };
    let mut face = adreel::ParleyFace::from_path(font)?;
    if let Some(bold) = args.bold_font.as_ref() {
        face = face.with_bold_path(bold)?;
    }
    Ok(Box::new(face))
}
