//! Round lifecycle and frame scheduling
//!
//! [`CrashGraph`] ties the simulation to a drawing surface and to the host's
//! frame and time sources. The host calls `on_frame` whenever a frame it was
//! asked for comes due; everything else is driven by the lifecycle methods.

use std::rc::Rc;

use crate::consts::RESIZE_DEBOUNCE_MS;
use crate::renderer::{Renderer, Surface};
use crate::settings::Settings;
use crate::sim::{GraphState, Phase, Viewport, advance, integrate_particles};

/// Opaque id of a requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Per-frame callback source (one frame per display refresh)
pub trait Scheduler {
    /// Ask for one future `on_frame` call
    fn request_frame(&mut self) -> FrameHandle;
    /// Withdraw a request that has not fired yet
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Monotonic time source in milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

type CrashCallback = Rc<dyn Fn(f64)>;

/// A finished crash animation that still has to be reported.
///
/// Returned by [`CrashGraph::on_frame`] so the host can release its hold on
/// the graph before user code runs; the callback may then freely call back
/// into the graph (`reset`, `start`, ...).
#[must_use = "call notify() to run the crash-complete callback"]
pub struct CrashComplete {
    pub multiplier: f64,
    callback: Option<CrashCallback>,
}

impl CrashComplete {
    /// Run the registered callback, if any
    pub fn notify(self) {
        if let Some(callback) = self.callback {
            callback(self.multiplier);
        }
    }
}

/// A live multiplier graph bound to one surface
pub struct CrashGraph<S: Surface, K: Scheduler, C: Clock> {
    state: GraphState,
    renderer: Renderer<S>,
    scheduler: K,
    clock: C,
    /// Outstanding frame request, at most one
    frame: Option<FrameHandle>,
    /// Whether frames keep being rescheduled
    looping: bool,
    last_resize_ms: Option<f64>,
    pending_resize: Option<Viewport>,
    crash_reported: bool,
    on_crash_complete: Option<CrashCallback>,
    destroyed: bool,
}

impl<S: Surface, K: Scheduler, C: Clock> CrashGraph<S, K, C> {
    /// Build a graph and draw its idle frame
    pub fn new(surface: S, scheduler: K, clock: C, settings: Settings, viewport: Viewport) -> Self {
        let settings = settings.validated();
        let now = clock.now_ms();
        let seed = settings.seed.unwrap_or(now.to_bits());

        let mut renderer = Renderer::new(surface, &settings);
        renderer.resize(viewport);

        let mut graph = Self {
            state: GraphState::new(&settings, viewport, seed),
            renderer,
            scheduler,
            clock,
            frame: None,
            looping: false,
            last_resize_ms: None,
            pending_resize: None,
            crash_reported: false,
            on_crash_complete: None,
            destroyed: false,
        };
        graph.redraw(now);

        log::info!(
            "Crash graph ready ({}x{} @{}x, {} mode, seed {})",
            viewport.width,
            viewport.height,
            viewport.pixel_ratio,
            if settings.external_mode {
                "external"
            } else {
                "growth"
            },
            seed
        );
        graph
    }

    /// Called once with the crash multiplier when the collapse animation ends.
    /// Delivered through the [`CrashComplete`] that `on_frame` returns.
    pub fn on_crash_complete(&mut self, callback: impl Fn(f64) + 'static) {
        self.on_crash_complete = Some(Rc::new(callback));
    }

    /// Begin a round at `start_ms` (defaults to now). No-op while running.
    pub fn start(&mut self, start_ms: Option<f64>) {
        if self.destroyed || self.is_running() {
            return;
        }
        let now = match start_ms {
            Some(t) if t.is_finite() => t,
            Some(t) => {
                log::warn!("Ignoring non-finite start time {t}");
                self.clock.now_ms()
            }
            None => self.clock.now_ms(),
        };

        // A stopped round still sits in Running; start over from scratch
        self.state.clear();
        self.state.begin(now);
        self.crash_reported = false;
        self.looping = true;
        self.schedule();
        log::info!("Round started at {now:.0}ms");
    }

    /// Push an externally observed multiplier. Returns `false` when ignored.
    pub fn set_external_multiplier(&mut self, value: f64, immediate: bool) -> bool {
        if self.destroyed {
            return false;
        }
        let accepted = self.state.set_external(value, immediate);
        if !accepted {
            log::warn!(
                "Ignored external multiplier {value} (phase {:?}, external {})",
                self.state.phase,
                self.state.source.is_external()
            );
        } else if immediate && !self.looping {
            self.redraw(self.clock.now_ms());
        }
        accepted
    }

    /// End the round at `value` (defaults to the current multiplier)
    pub fn crash(&mut self, value: Option<f64>) {
        if self.destroyed {
            return;
        }
        let now = self.clock.now_ms();
        if !self.state.crash(value, now) {
            log::debug!("Crash ignored in phase {:?}", self.state.phase);
            return;
        }
        log::info!(
            "Crashed at {}",
            crate::format_multiplier(self.state.crash_multiplier.unwrap_or(1.0))
        );
        self.looping = true;
        self.schedule();
    }

    /// Halt a running curve and cancel its pending frame. Buffers are kept.
    ///
    /// A crash collapse still in progress keeps its frames until it settles,
    /// so the explosion drains and the completion is still reported.
    pub fn stop(&mut self) {
        if self.state.phase == Phase::Crashed && self.looping {
            log::debug!("Stop during crash collapse, letting it settle");
            return;
        }
        self.halt();
    }

    fn halt(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel_frame(handle);
        }
        if self.looping {
            log::info!("Animation stopped");
        }
        self.looping = false;
        self.pending_resize = None;
    }

    /// Stop, then drop all round state and draw the idle frame
    pub fn reset(&mut self) {
        if self.destroyed {
            return;
        }
        self.halt();
        self.state.clear();
        self.crash_reported = false;
        self.redraw(self.clock.now_ms());
        log::info!("Graph reset");
    }

    /// Stop for good. Every later call is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.halt();
        self.on_crash_complete = None;
        self.destroyed = true;
        log::info!("Graph destroyed");
    }

    /// Viewport size notification.
    ///
    /// Applied immediately unless one was applied less than
    /// `RESIZE_DEBOUNCE_MS` ago; then the latest size waits for the next frame.
    pub fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) {
        if self.destroyed {
            return;
        }
        let viewport = Viewport::new(width, height, pixel_ratio);
        let now = self.clock.now_ms();

        if self.resize_due(now) {
            self.pending_resize = None;
            self.apply_resize(viewport, now);
        } else {
            log::debug!("Resize to {width}x{height} deferred");
            self.pending_resize = Some(viewport);
            self.schedule();
        }
    }

    /// Run one frame at host time `now_ms`. Ignored unless a frame was requested.
    ///
    /// Returns the crash completion on the frame the collapse ends; the host
    /// calls [`CrashComplete::notify`] once it no longer borrows the graph.
    pub fn on_frame(&mut self, now_ms: f64) -> Option<CrashComplete> {
        if self.destroyed || self.frame.take().is_none() {
            return None;
        }
        let mut completed = None;

        if let Some(viewport) = self.pending_resize {
            if self.resize_due(now_ms) {
                self.pending_resize = None;
                self.apply_resize(viewport, now_ms);
            }
        }

        if self.looping {
            advance(&mut self.state, now_ms);
            self.renderer.draw_scene(&self.state, now_ms);
            if self.state.phase == Phase::Crashed {
                integrate_particles(&mut self.state);
                self.renderer.draw_particles(&self.state.particles);
                completed = self.finish_crash(now_ms);
            }
        }

        if self.looping || self.pending_resize.is_some() {
            self.schedule();
        }
        completed
    }

    pub fn current_multiplier(&self) -> f64 {
        self.state.current_multiplier
    }

    /// Running and not stopped
    pub fn is_running(&self) -> bool {
        self.state.phase == Phase::Running && self.looping
    }

    pub fn is_crashed(&self) -> bool {
        self.state.phase == Phase::Crashed
    }

    pub fn crash_multiplier(&self) -> Option<f64> {
        self.state.crash_multiplier
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frame.is_some()
    }

    pub fn surface(&self) -> &S {
        self.renderer.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.renderer.surface_mut()
    }

    pub fn scheduler(&self) -> &K {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut K {
        &mut self.scheduler
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn schedule(&mut self) {
        if self.frame.is_none() {
            self.frame = Some(self.scheduler.request_frame());
        }
    }

    fn resize_due(&self, now_ms: f64) -> bool {
        self.last_resize_ms
            .is_none_or(|last| now_ms - last >= RESIZE_DEBOUNCE_MS)
    }

    fn apply_resize(&mut self, viewport: Viewport, now_ms: f64) {
        self.last_resize_ms = Some(now_ms);
        self.renderer.resize(viewport);
        self.state.resize(viewport);
        log::debug!(
            "Resized to {}x{} @{}x ({} points rescaled)",
            viewport.width,
            viewport.height,
            viewport.pixel_ratio,
            self.state.points.len()
        );

        // Nothing else will repaint a still graph
        if !self.looping {
            self.redraw(now_ms);
        }
    }

    /// Repaint the current state without stepping anything
    fn redraw(&mut self, now_ms: f64) {
        self.renderer.draw_scene(&self.state, now_ms);
        if self.state.phase == Phase::Crashed {
            self.renderer.draw_particles(&self.state.particles);
        }
    }

    /// Report the finished collapse once, then stop once nothing moves
    fn finish_crash(&mut self, now_ms: f64) -> Option<CrashComplete> {
        let done = self
            .state
            .collapse_progress(now_ms)
            .is_some_and(|p| p >= 1.0);
        if !done {
            return None;
        }

        let mut completed = None;
        if !self.crash_reported {
            self.crash_reported = true;
            let value = self
                .state
                .crash_multiplier
                .unwrap_or(self.state.current_multiplier);
            log::info!("Crash animation complete");
            completed = Some(CrashComplete {
                multiplier: value,
                callback: self.on_crash_complete.clone(),
            });
        }

        if self.state.particles.is_empty() {
            log::debug!("Crash animation settled");
            self.looping = false;
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::platform::manual::{ManualClock, ManualScheduler};
    use crate::renderer::{Layer, RecordingSurface};
    use crate::settings::Padding;

    type TestGraph = CrashGraph<RecordingSurface, ManualScheduler, ManualClock>;

    const FRAME_MS: f64 = 16.0;

    fn graph_with(settings: Settings) -> (TestGraph, ManualClock) {
        let clock = ManualClock::new(0.0);
        let graph = CrashGraph::new(
            RecordingSurface::new(),
            ManualScheduler::new(),
            clock.clone(),
            Settings {
                seed: Some(42),
                ..settings
            },
            Viewport::new(800.0, 400.0, 1.0),
        );
        (graph, clock)
    }

    fn graph() -> (TestGraph, ManualClock) {
        graph_with(Settings::default())
    }

    /// Advance one frame and deliver it
    fn pump(graph: &mut TestGraph, clock: &ManualClock) {
        let now = clock.advance(FRAME_MS);
        graph.scheduler_mut().fire();
        if let Some(done) = graph.on_frame(now) {
            done.notify();
        }
    }

    #[test]
    fn test_new_draws_idle_frame() {
        let (graph, _) = graph();
        assert_eq!(graph.phase(), Phase::Idle);
        assert!(!graph.has_pending_frame());
        assert!(graph.surface().texts().contains(&"1.00x"));
        assert_eq!(graph.surface().size.x, 800.0);
    }

    #[test]
    fn test_start_schedules_once() {
        let (mut graph, _) = graph();
        graph.start(None);
        graph.start(None);
        assert!(graph.is_running());
        assert_eq!(graph.scheduler().pending().len(), 1);
        assert_eq!(graph.state().points.len(), 1);
    }

    #[test]
    fn test_growth_strictly_increases_over_fifty_frames() {
        let (mut graph, clock) = graph();
        graph.start(None);

        let mut last = graph.current_multiplier();
        for _ in 0..50 {
            pump(&mut graph, &clock);
            let m = graph.current_multiplier();
            assert!(m > last, "{m} <= {last}");
            assert!(m >= 1.0);
            last = m;
        }
        assert!(graph.has_pending_frame());
    }

    #[test]
    fn test_point_buffer_stays_bounded() {
        let (mut graph, clock) = graph_with(Settings {
            max_points: 10,
            growth_rate: 0.001,
            ..Settings::default()
        });
        graph.start(None);
        for _ in 0..500 {
            pump(&mut graph, &clock);
            assert!(graph.state().points.len() <= 10);
        }
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let (mut graph, clock) = graph();
        graph.start(None);
        for _ in 0..20 {
            pump(&mut graph, &clock);
        }
        graph.crash(None);
        pump(&mut graph, &clock);
        graph.reset();

        assert_eq!(graph.current_multiplier(), 1.0);
        assert_eq!(graph.phase(), Phase::Idle);
        assert!(graph.state().points.is_empty());
        assert!(graph.state().particles.is_empty());
        assert!(!graph.has_pending_frame());
        assert!(!graph.scheduler().has_pending());
    }

    #[test]
    fn test_crash_value_is_frozen() {
        let (mut graph, clock) = graph();
        graph.start(None);
        for _ in 0..10 {
            pump(&mut graph, &clock);
        }
        let shown = graph.current_multiplier();
        graph.crash(Some(3.45));
        assert!(graph.is_crashed());
        assert!(!graph.is_running());

        for _ in 0..100 {
            pump(&mut graph, &clock);
            assert_eq!(graph.crash_multiplier(), Some(3.45));
            // The label keeps the value it showed, without a jump
            assert_eq!(graph.current_multiplier(), shown);
        }
        graph.crash(Some(8.0));
        assert_eq!(graph.crash_multiplier(), Some(3.45));
    }

    #[test]
    fn test_external_immediate_snaps() {
        let (mut graph, clock) = graph_with(Settings::external());
        graph.start(None);
        assert!(graph.set_external_multiplier(5.0, true));
        assert_eq!(graph.current_multiplier(), 5.0);

        pump(&mut graph, &clock);
        assert_eq!(graph.current_multiplier(), 5.0);
    }

    #[test]
    fn test_external_smoothing_approaches_target() {
        let (mut graph, clock) = graph_with(Settings::external());
        graph.start(None);
        graph.set_external_multiplier(2.0, false);

        let mut last_gap = 1.0;
        for _ in 0..200 {
            pump(&mut graph, &clock);
            let gap = 2.0 - graph.current_multiplier();
            assert!(gap >= 0.0 && gap <= last_gap);
            last_gap = gap;
        }
        assert_eq!(graph.current_multiplier(), 2.0);
    }

    #[test]
    fn test_external_ignored_in_growth_mode() {
        let (mut graph, _) = graph();
        graph.start(None);
        assert!(!graph.set_external_multiplier(5.0, true));
        assert_eq!(graph.current_multiplier(), 1.0);
    }

    #[test]
    fn test_particles_burst_then_drain_and_settle() {
        let (mut graph, clock) = graph_with(Settings {
            particle_count: 30,
            ..Settings::default()
        });
        let completed = Rc::new(RefCell::new(Vec::new()));
        let sink = completed.clone();
        graph.on_crash_complete(move |m| sink.borrow_mut().push(m));

        graph.start(None);
        pump(&mut graph, &clock);
        graph.crash(Some(2.0));
        assert_eq!(graph.state().particles.len(), 30);

        let mut last = 30;
        let mut frames = 0;
        while graph.has_pending_frame() {
            pump(&mut graph, &clock);
            let count = graph.state().particles.len();
            assert!(count <= last);
            last = count;
            frames += 1;
            assert!(frames < 1000, "crash animation never settled");
        }

        assert_eq!(graph.state().particles.len(), 0);
        assert_eq!(*completed.borrow(), vec![2.0]);
        assert!(graph.is_crashed());
    }

    #[test]
    fn test_default_growth_draws_curve_from_origin() {
        let (mut graph, clock) = graph();
        let origin = graph.state().geometry.origin();
        graph.start(None);
        // Three seconds at the default rate reaches about 1.35x
        for _ in 0..188 {
            pump(&mut graph, &clock);
        }

        let points = graph.state().points.as_slice();
        assert!(points.len() > 2, "only {} points", points.len());
        assert_eq!(points[0].pos, origin);
        assert_eq!(points[0].multiplier, 1.0);
        assert!(points.windows(2).all(|w| w[0].multiplier < w[1].multiplier));
        assert!(graph.surface().layers().contains(&Layer::Curve));
        assert!(graph.surface().layers().contains(&Layer::Fill));
    }

    #[test]
    fn test_crash_callback_may_reset_shared_graph() {
        let (graph, clock) = graph();
        let graph = Rc::new(RefCell::new(graph));
        let completed = Rc::new(RefCell::new(Vec::new()));

        let weak = Rc::downgrade(&graph);
        let sink = completed.clone();
        graph.borrow_mut().on_crash_complete(move |m| {
            sink.borrow_mut().push(m);
            if let Some(graph) = weak.upgrade() {
                graph.borrow_mut().reset();
            }
        });

        graph.borrow_mut().start(None);
        graph.borrow_mut().crash(Some(1.5));

        let mut frames = 0;
        while graph.borrow().has_pending_frame() {
            let now = clock.advance(FRAME_MS);
            graph.borrow_mut().scheduler_mut().fire();
            let done = graph.borrow_mut().on_frame(now);
            if let Some(done) = done {
                done.notify();
            }
            frames += 1;
            assert!(frames < 1000, "crash animation never settled");
        }

        assert_eq!(*completed.borrow(), vec![1.5]);
        let graph = graph.borrow();
        assert_eq!(graph.phase(), Phase::Idle);
        assert!(graph.state().particles.is_empty());
        assert!(!graph.scheduler().has_pending());
    }

    #[test]
    fn test_stop_lets_crash_collapse_finish() {
        let (mut graph, clock) = graph();
        let completed = Rc::new(RefCell::new(Vec::new()));
        let sink = completed.clone();
        graph.on_crash_complete(move |m| sink.borrow_mut().push(m));

        graph.start(None);
        pump(&mut graph, &clock);
        graph.crash(Some(2.0));
        graph.stop();
        assert!(graph.has_pending_frame());

        let mut frames = 0;
        while graph.has_pending_frame() {
            pump(&mut graph, &clock);
            frames += 1;
            assert!(frames < 1000, "crash animation never settled");
        }

        assert!(frames as f64 * FRAME_MS >= crate::consts::COLLAPSE_DURATION_MS);
        assert!(graph.state().particles.is_empty());
        assert_eq!(*completed.borrow(), vec![2.0]);
        assert!(graph.is_crashed());
    }

    #[test]
    fn test_particles_drawn_after_curve() {
        let (mut graph, clock) = graph();
        graph.start(None);
        for _ in 0..30 {
            pump(&mut graph, &clock);
        }
        graph.crash(None);
        graph.surface_mut().take();
        pump(&mut graph, &clock);

        let layers = graph.surface().layers();
        assert_eq!(layers.last(), Some(&Layer::Particles));
        assert!(layers.contains(&Layer::Curve));
    }

    #[test]
    fn test_stop_keeps_buffers_and_cancels_frame() {
        let (mut graph, clock) = graph();
        graph.start(None);
        for _ in 0..30 {
            pump(&mut graph, &clock);
        }
        let points = graph.state().points.len();
        let m = graph.current_multiplier();

        graph.stop();
        assert!(!graph.is_running());
        assert!(!graph.has_pending_frame());
        assert_eq!(graph.scheduler().cancelled, 1);

        // A late delivery changes nothing
        assert!(graph.on_frame(clock.advance(FRAME_MS)).is_none());
        assert_eq!(graph.state().points.len(), points);
        assert_eq!(graph.current_multiplier(), m);

        // Stopping twice is harmless
        graph.stop();

        graph.start(None);
        assert!(graph.is_running());
        assert_eq!(graph.current_multiplier(), 1.0);
        assert_eq!(graph.state().points.len(), 1);
    }

    #[test]
    fn test_resize_rescales_points() {
        let (mut graph, clock) = graph_with(Settings {
            padding: Padding::uniform(0.0),
            ..Settings::default()
        });
        graph.resize(200.0, 400.0, 1.0);
        graph.start(None);
        for _ in 0..60 {
            pump(&mut graph, &clock);
        }
        let before: Vec<f64> = graph.state().points.iter().map(|p| p.pos.x).collect();

        clock.advance(100.0);
        graph.resize(400.0, 400.0, 2.0);
        let after: Vec<f64> = graph.state().points.iter().map(|p| p.pos.x).collect();
        for (a, b) in before.iter().zip(&after) {
            assert!((b - a * 2.0).abs() < 1e-9);
        }
        assert_eq!(graph.surface().pixel_ratio, 2.0);
    }

    #[test]
    fn test_resize_debounced_until_next_frame() {
        let (mut graph, clock) = graph();
        clock.advance(100.0);
        graph.resize(1000.0, 500.0, 1.0);
        assert_eq!(graph.state().geometry.display_width, 1000.0);

        // Too soon: parked until a frame arrives
        clock.advance(5.0);
        graph.resize(1200.0, 600.0, 1.0);
        assert_eq!(graph.state().geometry.display_width, 1000.0);
        assert!(graph.has_pending_frame());

        pump(&mut graph, &clock);
        assert_eq!(graph.state().geometry.display_width, 1200.0);
        // Idle graph does not keep ticking
        assert!(!graph.has_pending_frame());
    }

    #[test]
    fn test_destroy_disables_everything() {
        let (mut graph, clock) = graph();
        graph.start(None);
        graph.destroy();
        assert!(graph.is_destroyed());
        assert!(!graph.has_pending_frame());

        graph.start(None);
        graph.crash(Some(2.0));
        graph.resize(10.0, 10.0, 1.0);
        assert!(graph.on_frame(clock.advance(FRAME_MS)).is_none());
        assert!(!graph.has_pending_frame());
        assert!(!graph.is_crashed());
    }

    #[test]
    fn test_start_time_is_honored() {
        let (mut graph, clock) = graph();
        clock.set(1000.0);
        graph.start(Some(500.0));
        assert_eq!(graph.state().start_time, Some(500.0));

        graph.reset();
        graph.start(Some(f64::NAN));
        assert_eq!(graph.state().start_time, Some(1000.0));
    }
}
