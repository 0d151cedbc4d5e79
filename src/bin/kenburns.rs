use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use kenburns::{
    AssetId, FfmpegEncoder, FfmpegEncoderOpts, FrameIndex, ImageAsset, InMemoryEncoder,
    MusicSource, Pacing, RenderController, RenderOptions, Resolution, SessionState, Settings,
    StreamEncoder,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kenburns", version, about = "Ken Burns slideshow video renderer")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a WebM slideshow (requires `ffmpeg` on PATH unless `--dry-run`).
    Render(RenderArgs),
    /// Render a single timeline frame as a PNG.
    Frame(FrameArgs),
    /// Print the timeline plan as JSON.
    Plan(PlanArgs),
}

#[derive(Args, Debug)]
struct SettingsArgs {
    /// Settings JSON file; flags below override its fields.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Seconds each image is held (1-10).
    #[arg(long)]
    hold: Option<f64>,

    /// Output resolution: 720p, 1080p, 1280x720 or 1920x1080.
    #[arg(long)]
    resolution: Option<Resolution>,

    /// Mix in the looping music track.
    #[arg(long, default_value_t = false)]
    music: bool,

    /// Seed for pan offsets and transition kinds.
    #[arg(long)]
    seed: Option<u64>,
}

impl SettingsArgs {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => Settings::from_path(path)?,
            None => Settings::default(),
        };
        if let Some(hold) = self.hold {
            settings.hold_seconds = hold;
        }
        if let Some(resolution) = self.resolution {
            settings.resolution = resolution;
        }
        if self.music {
            settings.add_music = true;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input images, in display order.
    #[arg(long = "image", required = true, num_args = 1..)]
    images: Vec<PathBuf>,

    /// Output WebM path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Music file used with `--music`.
    #[arg(long)]
    music_path: Option<PathBuf>,

    /// Render as fast as possible instead of in real time.
    #[arg(long, default_value_t = false)]
    unpaced: bool,

    /// Overwrite output if it already exists.
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Run the full pipeline into an in-memory encoder and write nothing.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input images, in display order.
    #[arg(long = "image", required = true, num_args = 1..)]
    images: Vec<PathBuf>,

    /// Frame index (0-based).
    #[arg(long)]
    index: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    settings: SettingsArgs,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Number of images to plan for.
    #[arg(long)]
    image_count: usize,

    /// Seconds each image is held (1-10).
    #[arg(long)]
    hold: Option<f64>,

    /// Seed for pan offsets and transition kinds.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn load_images(paths: &[PathBuf]) -> anyhow::Result<Vec<ImageAsset>> {
    paths
        .iter()
        .enumerate()
        .map(|(i, p)| {
            ImageAsset::from_path(AssetId(i as u64), p)
                .with_context(|| format!("load image '{}'", p.display()))
        })
        .collect()
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let settings = args.settings.settings()?;
    if !args.dry_run && !args.overwrite && args.out.exists() {
        anyhow::bail!(
            "output file '{}' already exists (pass --overwrite)",
            args.out.display()
        );
    }
    let images = load_images(&args.images)?;

    let mut options = RenderOptions {
        seed: args.settings.seed,
        pacing: if args.unpaced {
            Pacing::Unpaced
        } else {
            Pacing::RealTime
        },
        ..RenderOptions::default()
    };
    if let Some(path) = &args.music_path {
        options.music = MusicSource::Path(path.clone());
    }
    let controller = RenderController::new(options);

    let mut encoder: Box<dyn StreamEncoder> = if args.dry_run {
        Box::new(InMemoryEncoder::new())
    } else {
        Box::new(FfmpegEncoder::new(FfmpegEncoderOpts::default()))
    };

    let done = AtomicBool::new(false);
    let output = std::thread::scope(|s| {
        let progress = controller.progress();
        let done = &done;
        s.spawn(move || {
            let mut last = None;
            while !done.load(Ordering::Relaxed) {
                let snap = progress.snapshot();
                if snap.state == SessionState::Rendering && last != Some(snap.progress_percent) {
                    eprintln!("progress {:>3}%", snap.progress_percent);
                    last = Some(snap.progress_percent);
                }
                std::thread::sleep(Duration::from_millis(250));
            }
        });
        let res = controller.render(&images, &settings, encoder.as_mut());
        done.store(true, Ordering::Relaxed);
        res
    })?;

    for w in &controller.session().warnings {
        eprintln!("warning: {w}");
    }

    if args.dry_run {
        eprintln!(
            "dry run: {} frames, {} bytes ({})",
            controller.session().current_frame,
            output.bytes.len(),
            output.mime
        );
        return Ok(());
    }

    write_output(&args.out, &output.bytes)?;
    eprintln!("wrote {} ({})", args.out.display(), output.mime);
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    kenburns::ensure_parent_dir(path)?;
    std::fs::write(path, bytes).with_context(|| format!("write output '{}'", path.display()))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let settings = args.settings.settings()?;
    let images = load_images(&args.images)?;
    let controller = RenderController::new(RenderOptions {
        seed: args.settings.seed,
        ..RenderOptions::default()
    });
    // Frames are composited over an opaque background, so premultiplied equals straight alpha.
    let frame = controller.preview_frame(&images, &settings, FrameIndex(args.index))?;

    kenburns::ensure_parent_dir(&args.out)?;
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

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let mut settings = Settings::default();
    if let Some(hold) = args.hold {
        settings.hold_seconds = hold;
    }
    let controller = RenderController::new(RenderOptions {
        seed: args.seed,
        ..RenderOptions::default()
    });
    let plan = controller.plan(args.image_count, &settings)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
