//! Crash Graph - live multiplier curve animation engine
//!
//! Core modules:
//! - `sim`: Frame-by-frame animation state (value source, point buffer, particles)
//! - `renderer`: 2D drawing passes over an abstract surface
//! - `controller`: Round lifecycle (start/crash/stop/reset) and frame scheduling
//! - `platform`: Clocks, schedulers and surfaces for tests, native and browser hosts
//! - `settings`: Validated engine configuration

pub mod controller;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use controller::{Clock, CrashComplete, CrashGraph, FrameHandle, Scheduler};
pub use error::GraphError;
pub use settings::{Padding, Settings};
pub use sim::Phase;

/// Engine constants
pub mod consts {
    /// Smoothing snaps to the target once the gap falls below this
    pub const SMOOTHING_EPSILON: f64 = 1e-4;
    /// Minimum multiplier gain before a new point is appended instead of amending the head
    pub const POINT_THRESHOLD: f64 = 0.005;

    /// Duration of the post-crash collapse animation (ms)
    pub const COLLAPSE_DURATION_MS: f64 = 1000.0;
    /// Fraction of the content height the oldest point falls during collapse
    pub const COLLAPSE_DEPTH: f64 = 0.6;

    /// Minimum interval between applied resizes (ms)
    pub const RESIZE_DEBOUNCE_MS: f64 = 16.0;
    /// Content area never shrinks below this (logical px)
    pub const MIN_GRAPH_SIZE: f64 = 1.0;

    /// Particle gravity (px/frame²)
    pub const PARTICLE_GRAVITY: f64 = 0.2;
    /// Particle velocity damping per frame
    pub const PARTICLE_DRAG: f64 = 0.98;

    /// Glow pulse angular speed (radians per ms)
    pub const GLOW_PULSE_RATE: f64 = 0.005;
    /// Glow pulse amplitude as a fraction of the glow radius
    pub const GLOW_PULSE_AMOUNT: f64 = 0.2;
}

/// Format a multiplier the way it is shown to players ("2.35x")
pub fn format_multiplier(value: f64) -> String {
    format!("{value:.2}x")
}

/// Cubic ease-out: fast start, gentle landing
#[inline]
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Clamp a possibly non-finite multiplier to the valid range, or `None` if unusable
#[inline]
pub fn sanitize_multiplier(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value.max(1.0))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_multiplier() {
        assert_eq!(format_multiplier(1.0), "1.00x");
        assert_eq!(format_multiplier(2.356), "2.36x");
        assert_eq!(format_multiplier(10.0), "10.00x");
    }

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(2.0), 1.0);
        // Ease-out is ahead of linear in the middle
        assert!(ease_out_cubic(0.5) > 0.5);
    }

    #[test]
    fn test_sanitize_multiplier() {
        assert_eq!(sanitize_multiplier(0.5), Some(1.0));
        assert_eq!(sanitize_multiplier(3.45), Some(3.45));
        assert_eq!(sanitize_multiplier(f64::NAN), None);
        assert_eq!(sanitize_multiplier(f64::INFINITY), None);
    }
}
