//! Native host: wall clock and a sleep-paced frame loop
//!
//! There is no display refresh to hook into, so frames are delivered at a
//! fixed interval for as long as the graph keeps asking for them.

use std::thread;
use std::time::{Duration, Instant};

use super::manual::ManualScheduler;
use crate::controller::{Clock, CrashGraph};
use crate::renderer::Surface;

/// Roughly one 60 Hz refresh
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Milliseconds since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Deliver frames every `interval` until the graph stops asking or
/// `max_frames` have run. `after_frame` sees the graph after each frame.
/// Returns the number of frames delivered.
pub fn run_frames<S, C>(
    graph: &mut CrashGraph<S, ManualScheduler, C>,
    interval: Duration,
    max_frames: u64,
    mut after_frame: impl FnMut(&mut CrashGraph<S, ManualScheduler, C>),
) -> u64
where
    S: Surface,
    C: Clock,
{
    let mut frames = 0;
    while frames < max_frames && graph.has_pending_frame() {
        thread::sleep(interval);
        graph.scheduler_mut().fire();
        let now = graph.clock().now_ms();
        if let Some(completed) = graph.on_frame(now) {
            completed.notify();
        }
        frames += 1;
        after_frame(graph);
    }
    frames
}
