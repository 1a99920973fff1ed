use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use eventscope::{
    CpuSurface, Direction, EventScope, InputDocument, ManualScheduler, RecordedFrame,
    RecordingSurface, Rgba8, SleepScheduler,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "eventscope", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one period as a PNG.
    Frame(FrameArgs),
    /// Play through the range, printing one JSON line per redraw.
    Play(PlayArgs),
    /// Print the period buckets as JSON.
    Buckets(BucketsArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Show the period containing this date (YYYY-MM-DD or RFC 3339).
    #[arg(long, conflicts_with = "step")]
    date: Option<String>,

    /// Show the period this many steps after the first one.
    #[arg(long)]
    step: Option<u32>,

    /// Draw as paused, including the previous period.
    #[arg(long)]
    paused: bool,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Speed multiplier applied to `periods_per_second`.
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Start at the end of the range and play backward.
    #[arg(long)]
    reverse: bool,

    /// Sleep between ticks instead of running as fast as possible.
    #[arg(long)]
    realtime: bool,
}

#[derive(Parser, Debug)]
struct BucketsArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Play(args) => cmd_play(args),
        Command::Buckets(args) => cmd_buckets(args),
    }
}

fn read_doc(path: &Path) -> anyhow::Result<InputDocument> {
    InputDocument::from_path(path).with_context(|| format!("load input '{}'", path.display()))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let doc = read_doc(&args.in_path)?;
    let viewport = doc.options.viewport;
    let mut scope = EventScope::initialize(doc, ManualScheduler::new(), RecordingSurface::new())?;

    if let Some(date) = &args.date {
        let t = scope
            .zone()
            .parse(date)
            .with_context(|| format!("parse date '{date}'"))?;
        scope.seek(t)?;
    }
    for _ in 0..args.step.unwrap_or(0) {
        scope.step(Direction::Forward)?;
    }

    let mut canvas =
        CpuSurface::for_viewport(viewport.view_width, viewport.view_height, Rgba8::WHITE)?;
    let counts = scope.render_into(&mut canvas, args.paused)?;
    let frame = canvas.take_frame().context("renderer produced no frame")?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} current, {} previous)",
        args.out.display(),
        counts.current,
        counts.previous
    );
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let doc = read_doc(&args.in_path)?;
    let mut scope = EventScope::initialize(
        doc,
        SleepScheduler::new(args.realtime),
        RecordingSurface::new(),
    )?;
    scope.set_speed(args.speed)?;

    let direction = if args.reverse {
        let end = scope.state().range_end;
        scope.seek(end)?;
        Direction::Backward
    } else {
        Direction::Forward
    };
    scope.surface_mut().clear();
    scope.play(direction)?;

    while let Some(handle) = scope.scheduler_mut().wait_next() {
        scope.on_tick(handle)?;
        for frame in std::mem::take(&mut scope.surface_mut().frames) {
            println!("{}", frame_line(&frame)?);
        }
    }
    Ok(())
}

fn frame_line(frame: &RecordedFrame) -> anyhow::Result<String> {
    let counts = frame.counts();
    let line = serde_json::json!({
        "period_start": frame.header.period_start,
        "label": frame.header.label,
        "paused": frame.header.paused,
        "current": counts.current,
        "previous": counts.previous,
    });
    Ok(serde_json::to_string(&line)?)
}

fn cmd_buckets(args: BucketsArgs) -> anyhow::Result<()> {
    let doc = read_doc(&args.in_path)?;
    let mut scope = EventScope::initialize(doc, ManualScheduler::new(), RecordingSurface::new())?;
    let buckets = scope.buckets()?;
    println!("{}", serde_json::to_string_pretty(buckets)?);
    Ok(())
}
