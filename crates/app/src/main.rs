use std::{
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use serde_json::json;
use stagefx_core::{
    artist_layout, InputEvent, Layout, MotionStage, PlayMode, SceneSpec, SiteConfig, StageEvent,
    TimedInput,
};
use tracing_subscriber::EnvFilter;

fn main() -> stagefx_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            sources,
            script,
            duration_ms,
            fps,
            writes,
        } => run_simulate(&sources, script.as_deref(), duration_ms, fps, writes),
        Commands::Inspect { sources } => run_inspect(&sources),
    }
}

fn run_simulate(
    sources: &Sources,
    script: Option<&Path>,
    duration_ms: f64,
    fps: f64,
    dump_writes: bool,
) -> stagefx_core::Result<()> {
    let mut stage = sources.build_stage()?;
    let mut script = match script {
        Some(path) => serde_json::from_str::<Vec<TimedInput>>(&std::fs::read_to_string(path)?)?,
        None => demo_script(stage.layout().max_scroll()),
    };
    script.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));

    let frame_ms = 1000.0 / fps.max(1.0);
    tracing::info!(
        scene = stage.scene_name(),
        duration_ms,
        fps,
        inputs = script.len(),
        "starting simulation"
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for event in stage.start(0.0) {
        log_event(&event);
    }

    let mut pending = script.into_iter().peekable();
    let mut frames = 0_u64;
    let mut now = 0.0;
    while now <= duration_ms {
        while let Some(input) = pending.next_if(|input| input.at_ms <= now) {
            stage.handle(input.event)?;
        }

        let output = stage.frame(now);
        for event in &output.events {
            log_event(event);
        }
        if dump_writes {
            let line = json!({
                "frame": output.tick.frame,
                "timestamp_ms": output.tick.timestamp_ms,
                "offset": output.sample.smoothed_offset,
                "events": output.events,
                "writes": output.writes,
            });
            serde_json::to_writer(&mut out, &line)?;
            out.write_all(b"\n")?;
        }

        frames += 1;
        now += frame_ms;
    }
    out.flush()?;

    tracing::info!(
        frames,
        offset = stage.scroll().smoothed_offset(),
        preloader = ?stage.preloader().phase(),
        "simulation finished"
    );
    Ok(())
}

fn run_inspect(sources: &Sources) -> stagefx_core::Result<()> {
    let stage = sources.build_stage()?;
    let layout = stage.layout();
    println!(
        "scene {} on {}x{} viewport, {} px scrollable",
        stage.scene_name(),
        layout.viewport.width,
        layout.viewport.height,
        layout.max_scroll()
    );
    for player in stage.timelines() {
        match player.mode() {
            PlayMode::Autoplay => {
                println!("  {:<20} autoplay {:>6.2}s", player.name(), player.duration());
            }
            PlayMode::Scrubbed { range, scrub_secs } => println!(
                "  {:<20} scrubbed {:>6.0}..{:<6.0} scrub {scrub_secs}s",
                player.name(),
                range.start,
                range.end
            ),
        }
    }
    Ok(())
}

fn log_event(event: &StageEvent) {
    match event {
        StageEvent::Preloader { event } => tracing::info!(?event, "preloader"),
        StageEvent::ThemeChanged {
            section,
            background,
            text,
        } => tracing::info!(%section, %background, %text, "theme changed"),
        StageEvent::Trigger { event } => tracing::info!(?event, "trigger"),
        StageEvent::Revealed { target } => tracing::info!(%target, "revealed"),
        StageEvent::TimelineStarted { name } => tracing::info!(%name, "timeline started"),
        StageEvent::TimelineCompleted { name } => tracing::info!(%name, "timeline completed"),
    }
}

/// Wheel down through the whole page, wiggle the pointer, then jump back up.
fn demo_script(max_scroll: f64) -> Vec<TimedInput> {
    let mut script = Vec::new();
    let steps = 60;
    let step = max_scroll / steps as f64;
    for i in 0..steps {
        let at_ms = 2000.0 + i as f64 * 80.0;
        script.push(TimedInput {
            at_ms,
            event: InputEvent::Wheel { delta: step },
        });
        script.push(TimedInput {
            at_ms,
            event: InputEvent::MouseMove {
                x: 200.0 + (i % 10) as f64 * 100.0,
                y: 300.0 + (i % 4) as f64 * 50.0,
            },
        });
    }
    script.push(TimedInput {
        at_ms: 9000.0,
        event: InputEvent::Scroll { offset: 0.0 },
    });
    script
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(clap::Args, Debug)]
struct Sources {
    /// Site configuration JSON. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Scene JSON. The built-in artist site when omitted.
    #[arg(short, long)]
    scene: Option<PathBuf>,
    /// Layout JSON. The built-in artist layout when omitted.
    #[arg(short, long)]
    layout: Option<PathBuf>,
}

impl Sources {
    fn build_stage(&self) -> stagefx_core::Result<MotionStage> {
        let config = match &self.config {
            Some(path) => SiteConfig::from_json_file(path)?,
            None => SiteConfig::default(),
        };
        let scene = match &self.scene {
            Some(path) => SceneSpec::from_json_file(path)?,
            None => SceneSpec::artist_site()?,
        };
        let layout = match &self.layout {
            Some(path) => Layout::from_json_str(&std::fs::read_to_string(path)?)?,
            None => artist_layout(),
        };
        MotionStage::new(config, &scene, layout)
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless scroll motion simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scripted scroll session frame by frame.
    Simulate {
        #[command(flatten)]
        sources: Sources,
        /// JSON array of `{ "at_ms": .., "event": { "type": .. } }` inputs.
        #[arg(long)]
        script: Option<PathBuf>,
        /// Session length in milliseconds.
        #[arg(short, long, default_value_t = 12000.0)]
        duration_ms: f64,
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
        /// Print every frame's events and style writes as JSON lines.
        #[arg(short, long)]
        writes: bool,
    },
    /// Resolve a scene and print its timelines.
    Inspect {
        #[command(flatten)]
        sources: Sources,
    },
}
