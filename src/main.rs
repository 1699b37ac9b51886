//! Tickline demo host — drives a timeline with fixed time steps and prints fired events.
//!
//! Without `--cues` it plays four built-in events: two handled by the global
//! callback and two with dedicated callbacks, added out of order.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tickline::config::PlaybackConfig;
use tickline::cue_sheet::CueSheet;
use tickline::{EventId, Timeline};

#[derive(Debug, Parser)]
#[command(version, about = "Drive a timeline with fixed time steps")]
struct Args {
    /// Playback config (default: ~/.tickline/playback.yaml).
    #[arg(long)]
    config: Option<PathBuf>,
    /// YAML cue sheet to play instead of the built-in events.
    #[arg(long)]
    cues: Option<PathBuf>,
    /// Seconds advanced per update.
    #[arg(long)]
    step: Option<f64>,
    /// Number of updates.
    #[arg(long)]
    steps: Option<u32>,
    #[arg(long = "loop", overrides_with = "no_loop")]
    looped: bool,
    #[arg(long, overrides_with = "looped")]
    no_loop: bool,
    /// Explicit timeline length in seconds.
    #[arg(long)]
    duration: Option<f64>,
    /// Sleep between updates.
    #[arg(long)]
    realtime: bool,
}

impl Args {
    fn resolve(&self) -> tickline::Result<PlaybackConfig> {
        let mut config = match &self.config {
            Some(path) => PlaybackConfig::load_from(path)?,
            None => PlaybackConfig::load().unwrap_or_default(),
        };
        if let Some(step) = self.step {
            config.step_seconds = step;
        }
        if let Some(steps) = self.steps {
            config.steps = steps;
        }
        if self.looped {
            config.loop_enabled = true;
        }
        if self.no_loop {
            config.loop_enabled = false;
        }
        if let Some(duration) = self.duration {
            config.duration = duration;
        }
        config.realtime |= self.realtime;
        Ok(config)
    }
}

fn format_params(params: &[f64]) -> String {
    params
        .iter()
        .map(|p| format!("{p:.2}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn printer(tag: &'static str) -> impl FnMut(EventId, &[f64]) {
    move |id, params| println!("[{tag}] id={id} params=[{}]", format_params(params))
}

fn insert_builtin(timeline: &mut Timeline) {
    timeline.add_event_with_params(1.0, 100, vec![1.0]);
    timeline.add_event_with_callback(2.0, 101, vec![0.5, 2.0], printer("CUE1"));
    timeline.add_event(4.5, 200);
    // Earlier than the previous event: sorted on insertion.
    timeline.add_event_with_callback(3.2, 300, Vec::new(), printer("CUE2"));
}

fn run(args: &Args) -> tickline::Result<()> {
    let config = args.resolve()?;

    let mut timeline = Timeline::new();
    timeline.set_global_callback(printer("GLOBAL"));

    match &args.cues {
        Some(path) => {
            let sheet = CueSheet::load(path)?;
            info!(path = %path.display(), cues = sheet.len(), "loaded cue sheet");
            timeline.add_batch(sheet.into_events());
        }
        None => insert_builtin(&mut timeline),
    }

    timeline.set_duration(config.duration);
    timeline.set_loop(config.loop_enabled);

    println!(
        "tickline v{} — {} events, duration {:.2}s, loop {}",
        env!("CARGO_PKG_VERSION"),
        timeline.count(),
        timeline.duration(),
        if timeline.is_loop() { "on" } else { "off" }
    );
    println!(
        "playing {} steps of {:.3}s ({:.2}s)...",
        config.steps,
        config.step_seconds,
        config.total_seconds()
    );

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("failed to install Ctrl-C handler: {e}");
    }

    let sleep_duration = Duration::try_from_secs_f64(config.step_seconds).unwrap_or_default();
    timeline.play();
    for _ in 0..config.steps {
        if interrupted.load(Ordering::SeqCst) {
            info!(time = timeline.current_time(), "interrupted");
            timeline.stop();
            break;
        }
        timeline.update(config.step_seconds);
        if config.realtime {
            thread::sleep(sleep_duration);
        }
    }

    println!("done at {:.2}s.", timeline.current_time());
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("tickline: {e}");
        std::process::exit(1);
    }
}
