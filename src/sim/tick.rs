//! Per-frame simulation steps
//!
//! A frame runs in a fixed order: value update, then point sampling (both in
//! [`advance`]), then drawing, then [`integrate_particles`] for the crashed
//! phase only.

use super::points::SampleOutcome;
use super::state::{GraphState, Phase};

/// Update the multiplier from its source and sample the curve head.
///
/// Only a running round moves; in any other phase this is a no-op.
pub fn advance(state: &mut GraphState, now_ms: f64) -> Option<SampleOutcome> {
    if state.phase != Phase::Running {
        return None;
    }

    let elapsed = state.elapsed_ms(now_ms);
    state.current_multiplier = state.source.next(state.current_multiplier, elapsed);

    let outcome = state.sample(now_ms);

    log::trace!(
        "frame t={:.0}ms m={:.4} points={}",
        elapsed,
        state.current_multiplier,
        state.points.len()
    );
    Some(outcome)
}

/// Step the explosion one frame. Particles only move after a crash.
pub fn integrate_particles(state: &mut GraphState) {
    if state.phase == Phase::Crashed {
        state.particles.step();
    }
}
