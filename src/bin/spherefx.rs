use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use spherefx::{
    CameraPose, EffectConfig, EffectContext, EffectState, InMemoryCamera, InMemoryControls,
    InMemoryScene, NodeState, SharedCamera, SharedControls, SharedScene, SharedSolver,
};

#[derive(Parser, Debug)]
#[command(name = "spherefx", version)]
struct Cli {
    /// Log lifecycle decisions at debug level.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check an effect config and report every invalid field.
    Validate(ValidateArgs),
    /// Run an effect headlessly and write a per-frame JSON trace.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Effect config JSON (tagged by `effect`).
    #[arg(long)]
    config: PathBuf,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Effect config JSON (tagged by `effect`).
    #[arg(long)]
    config: PathBuf,

    /// Scene description JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Frames per simulated second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Seconds to simulate. Defaults to the config duration plus one second.
    #[arg(long)]
    seconds: Option<f64>,

    /// Physics solver used by the gravity effect.
    #[arg(long, value_enum, default_value_t = SolverChoice::Point)]
    solver: SolverChoice,

    /// Output trace path. Writes to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SolverChoice {
    Point,
    #[cfg(feature = "rapier")]
    Rapier,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Trace {
    effect: &'static str,
    fps: u32,
    completions: u32,
    frames: Vec<TraceFrame>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct TraceFrame {
    frame: u64,
    time: f64,
    state: EffectState,
    #[serde(skip_serializing_if = "Option::is_none")]
    phase: Option<&'static str>,
    camera: CameraPose,
    controls_enabled: bool,
    nodes: Vec<NodeState>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn read_text(path: &Path, what: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("open {what} '{}'", path.display()))
}

fn read_config(path: &Path) -> anyhow::Result<EffectConfig> {
    let text = read_text(path, "config")?;
    EffectConfig::from_json(&text).with_context(|| format!("parse config '{}'", path.display()))
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let cfg = read_config(&args.config)?;
    match cfg.validate() {
        Ok(()) => {
            println!("ok: {} config is valid", cfg.kind().name());
            Ok(())
        }
        Err(errors) => {
            for (field, message) in errors.field_messages() {
                println!("{field}: {message}");
            }
            anyhow::bail!(
                "{} config has {} invalid field(s)",
                cfg.kind().name(),
                errors.errors.len()
            )
        }
    }
}

fn make_solver(choice: SolverChoice) -> SharedSolver {
    match choice {
        SolverChoice::Point => Rc::new(RefCell::new(spherefx::PointSolver::new())),
        #[cfg(feature = "rapier")]
        SolverChoice::Rapier => Rc::new(RefCell::new(spherefx::RapierSolver::new())),
    }
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.fps > 0, "--fps must be > 0");
    let cfg = read_config(&args.config)?;
    let scene_text = read_text(&args.scene, "scene")?;
    let scene = Rc::new(RefCell::new(
        InMemoryScene::from_json(&scene_text)
            .with_context(|| format!("build scene '{}'", args.scene.display()))?,
    ));
    let camera = Rc::new(RefCell::new(InMemoryCamera::default()));
    let controls = Rc::new(RefCell::new(InMemoryControls::default()));

    let shared_scene: SharedScene = scene.clone();
    let shared_camera: SharedCamera = camera.clone();
    let shared_controls: SharedControls = controls.clone();
    let ctx = EffectContext::new()
        .with_scene(shared_scene)
        .with_camera(shared_camera)
        .with_controls(shared_controls)
        .with_solver(make_solver(args.solver));

    let mut effect = spherefx::create_effect(&cfg);
    let completions = Rc::new(Cell::new(0u32));
    let counter = completions.clone();
    effect.set_on_complete(Box::new(move || counter.set(counter.get() + 1)));
    effect.init(ctx).context("init effect")?;
    anyhow::ensure!(effect.play().context("play effect")?, "effect refused to play");

    let seconds = args.seconds.unwrap_or(cfg.duration_sec() + 1.0);
    anyhow::ensure!(
        seconds.is_finite() && seconds >= 0.0,
        "--seconds must be finite and >= 0"
    );
    let frame_count = (seconds * f64::from(args.fps)).round() as u64;
    let mut frames = Vec::with_capacity(frame_count as usize + 1);
    for frame in 0..=frame_count {
        let time = frame as f64 / f64::from(args.fps);
        effect
            .tick(time)
            .with_context(|| format!("tick frame {frame}"))?;
        let cam = camera.borrow();
        let ctl = controls.borrow();
        frames.push(TraceFrame {
            frame,
            time,
            state: effect.state(),
            phase: effect.phase_name(),
            camera: CameraPose {
                position: cam.position,
                target: cam.target,
                fov: cam.fov_deg,
            },
            controls_enabled: ctl.enabled,
            nodes: scene.borrow().snapshot(),
        });
    }
    effect.dispose();

    let trace = Trace {
        effect: cfg.kind().name(),
        fps: args.fps,
        completions: completions.get(),
        frames,
    };
    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            let f = File::create(out).with_context(|| format!("create '{}'", out.display()))?;
            let mut w = BufWriter::new(f);
            serde_json::to_writer_pretty(&mut w, &trace).context("write trace")?;
            w.flush().context("flush trace")?;
            eprintln!("wrote {}", out.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            serde_json::to_writer_pretty(&mut w, &trace).context("write trace")?;
            writeln!(w).context("write trace")?;
        }
    }
    Ok(())
}
