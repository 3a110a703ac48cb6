//! Crash Graph entry point
//!
//! On the web the library's `CrashGraphHandle` is the entry point, so the
//! binary has nothing to do there. Natively it plays one headless round:
//!
//! ```text
//! crash-graph [CRASH_AT] [SETTINGS_JSON_FILE]
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::error::Error;

    use crash_graph::platform::manual::ManualScheduler;
    use crash_graph::platform::native::{FRAME_INTERVAL, SystemClock, run_frames};
    use crash_graph::renderer::RecordingSurface;
    use crash_graph::sim::Viewport;
    use crash_graph::{CrashGraph, Settings, format_multiplier};

    /// Default crash point when none is given
    const DEFAULT_CRASH_AT: f64 = 2.0;
    /// Upper bound on frames for one round (two minutes at 60 Hz)
    const MAX_FRAMES: u64 = 60 * 120;

    pub fn run() -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args().skip(1);

        let crash_at = match args.next() {
            Some(arg) => match arg.parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 1.0 => value,
                _ => {
                    log::warn!("Invalid crash point {arg:?}, using {DEFAULT_CRASH_AT}");
                    DEFAULT_CRASH_AT
                }
            },
            None => DEFAULT_CRASH_AT,
        };
        let settings = match args.next() {
            Some(path) => Settings::from_json(&std::fs::read_to_string(&path)?)?,
            None => Settings::default(),
        };

        let mut graph = CrashGraph::new(
            RecordingSurface::new(),
            ManualScheduler::new(),
            SystemClock::new(),
            settings,
            Viewport::new(800.0, 400.0, 1.0),
        );
        graph.on_crash_complete(|m| log::info!("Round over at {}", format_multiplier(m)));

        log::info!("Running until {}", format_multiplier(crash_at));
        graph.start(None);

        let mut commands = 0;
        let frames = run_frames(&mut graph, FRAME_INTERVAL, MAX_FRAMES, |g| {
            if g.is_running() && g.current_multiplier() >= crash_at {
                g.crash(Some(crash_at));
            }
            commands += g.surface_mut().take().len();
        });

        let state = graph.state();
        log::info!(
            "{frames} frames, {commands} draw commands, {} points, crashed at {}",
            state.points.len(),
            state
                .crash_multiplier
                .map(format_multiplier)
                .unwrap_or_else(|| "-".into())
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Crash Graph (native, headless) starting...");

    if let Err(e) = headless::run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Initialization happens in the library's wasm start hook
}
