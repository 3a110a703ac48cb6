//! Multiplier value sources
//!
//! Internal growth is a closed-form function of elapsed time. External mode
//! eases the displayed value toward the last pushed target so that network
//! updates never make the curve jump.

use serde::{Deserialize, Serialize};

use crate::consts::SMOOTHING_EPSILON;

/// `(1 + rate)^elapsed_ms`, exactly 1.0 at (or before) time zero
pub fn growth_multiplier(rate: f64, elapsed_ms: f64) -> f64 {
    if elapsed_ms <= 0.0 {
        return 1.0;
    }
    (1.0 + rate).powf(elapsed_ms)
}

/// One exponential smoothing step toward `target`
pub fn smooth_toward(current: f64, target: f64, factor: f64) -> f64 {
    let delta = target - current;
    if delta.abs() > SMOOTHING_EPSILON {
        current + delta * factor
    } else {
        target
    }
}

/// Where the current multiplier comes from each frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ValueSource {
    /// Deterministic exponential growth from the round start
    Growth { rate: f64 },
    /// Smoothed convergence toward an externally pushed target
    External { smoothing: f64, target: f64 },
}

impl ValueSource {
    pub fn growth(rate: f64) -> Self {
        ValueSource::Growth { rate }
    }

    pub fn external(smoothing: f64) -> Self {
        ValueSource::External {
            smoothing,
            target: 1.0,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, ValueSource::External { .. })
    }

    /// Pending external target, if any
    pub fn target(&self) -> Option<f64> {
        match *self {
            ValueSource::External { target, .. } => Some(target),
            ValueSource::Growth { .. } => None,
        }
    }

    /// Replace the external target (ignored for internal growth)
    pub fn set_target(&mut self, value: f64) {
        if let ValueSource::External { target, .. } = self {
            *target = value;
        }
    }

    /// Back to the start-of-round target
    pub fn reset(&mut self) {
        self.set_target(1.0);
    }

    /// Next multiplier given the current one and the time since round start
    pub fn next(&self, current: f64, elapsed_ms: f64) -> f64 {
        let value = match *self {
            ValueSource::Growth { rate } => growth_multiplier(rate, elapsed_ms),
            ValueSource::External { smoothing, target } => {
                smooth_toward(current, target, smoothing)
            }
        };
        value.max(1.0)
    }
}
