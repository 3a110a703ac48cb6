//! Round state and lifecycle transitions
//!
//! Everything a frame reads or writes lives in [`GraphState`]. Transitions
//! return `false` instead of failing when they do not apply, so callers can
//! log misuse without ever halting the animation.

use serde::{Deserialize, Serialize};

use super::geometry::{GeometryMapping, Viewport};
use super::particles::ParticleSystem;
use super::points::{Point, PointBuffer, SampleOutcome};
use super::source::ValueSource;
use crate::consts::COLLAPSE_DURATION_MS;
use crate::sanitize_multiplier;
use crate::settings::Settings;

/// Round lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Nothing buffered, nothing scheduled
    #[default]
    Idle,
    /// Curve growing
    Running,
    /// Growth frozen, collapse and explosion playing
    Crashed,
}

/// Complete animation state for one graph
#[derive(Debug, Clone)]
pub struct GraphState {
    pub phase: Phase,
    /// Displayed multiplier (always >= 1.0)
    pub current_multiplier: f64,
    /// Frozen at the crash, set once per round
    pub crash_multiplier: Option<f64>,
    /// Round start (ms, host clock)
    pub start_time: Option<f64>,
    /// Crash instant (ms, host clock)
    pub crash_time: Option<f64>,
    pub source: ValueSource,
    pub points: PointBuffer,
    pub particles: ParticleSystem,
    pub geometry: GeometryMapping,
    max_multiplier: f64,
    particle_count: usize,
}

impl GraphState {
    pub fn new(settings: &Settings, viewport: Viewport, seed: u64) -> Self {
        let source = if settings.external_mode {
            ValueSource::external(settings.smoothing)
        } else {
            ValueSource::growth(settings.growth_rate)
        };

        Self {
            phase: Phase::Idle,
            current_multiplier: 1.0,
            crash_multiplier: None,
            start_time: None,
            crash_time: None,
            source,
            points: PointBuffer::new(settings.max_points),
            particles: ParticleSystem::new(seed),
            geometry: GeometryMapping::new(viewport, settings.padding),
            max_multiplier: settings.max_multiplier,
            particle_count: settings.particle_count,
        }
    }

    pub fn max_multiplier(&self) -> f64 {
        self.max_multiplier
    }

    /// External target, when driven by pushed values
    pub fn target_multiplier(&self) -> Option<f64> {
        self.source.target()
    }

    /// Time since the round started (0 before the start instant)
    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        self.start_time
            .map(|start| (now_ms - start).max(0.0))
            .unwrap_or(0.0)
    }

    /// Collapse progress in [0, 1], or `None` outside the crashed phase
    pub fn collapse_progress(&self, now_ms: f64) -> Option<f64> {
        if self.phase != Phase::Crashed {
            return None;
        }
        let since = now_ms - self.crash_time?;
        Some((since / COLLAPSE_DURATION_MS).clamp(0.0, 1.0))
    }

    /// Start a new round at `now_ms`.
    ///
    /// Clears every buffer and anchors the curve at the bottom-left content
    /// corner. Returns `false` (and changes nothing) if already running.
    pub fn begin(&mut self, now_ms: f64) -> bool {
        if self.phase == Phase::Running {
            return false;
        }
        self.clear();
        self.phase = Phase::Running;
        self.start_time = Some(now_ms);
        self.points.push(Point::new(self.geometry.origin(), 1.0, 0.0));
        true
    }

    /// Push an external target. Returns `false` when ignored.
    pub fn set_external(&mut self, value: f64, immediate: bool) -> bool {
        if !self.source.is_external() || self.phase == Phase::Crashed {
            return false;
        }
        let Some(value) = sanitize_multiplier(value) else {
            return false;
        };
        self.source.set_target(value);
        if immediate {
            self.current_multiplier = value;
        }
        true
    }

    /// End the round with crash value `value` (or the current multiplier when
    /// absent or not finite) and burst particles out of the curve head.
    ///
    /// The displayed multiplier and the head stay where they are, so a crash
    /// value far from the shown one causes no visible jump. Only a running
    /// round can crash.
    pub fn crash(&mut self, value: Option<f64>, now_ms: f64) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        let crash_at = value
            .and_then(sanitize_multiplier)
            .unwrap_or(self.current_multiplier);

        self.phase = Phase::Crashed;
        self.crash_multiplier = Some(crash_at);
        self.crash_time = Some(now_ms);

        let head = self
            .points
            .head()
            .map(|p| p.pos)
            .unwrap_or_else(|| self.geometry.origin());
        self.particles.explode(head, self.particle_count);
        true
    }

    /// Map the current multiplier and record it in the point buffer
    pub fn sample(&mut self, now_ms: f64) -> SampleOutcome {
        let point = Point::new(
            self.geometry
                .position(self.current_multiplier, self.max_multiplier),
            self.current_multiplier,
            self.elapsed_ms(now_ms),
        );
        self.points.sample(point)
    }

    /// Switch to a new viewport, carrying buffered points along
    pub fn resize(&mut self, viewport: Viewport) {
        let old = self.geometry;
        let new = GeometryMapping::new(viewport, old.padding);
        if new == old {
            return;
        }
        self.points.rescale(&old, &new);
        self.geometry = new;
    }

    /// Drop all round state (back to Idle)
    pub fn clear(&mut self) {
        self.phase = Phase::Idle;
        self.current_multiplier = 1.0;
        self.crash_multiplier = None;
        self.start_time = None;
        self.crash_time = None;
        self.source.reset();
        self.points.clear();
        self.particles.clear();
    }
}
