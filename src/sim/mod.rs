//! Animation simulation module
//!
//! Everything that changes from frame to frame lives here. This module is
//! host-agnostic:
//! - Time is passed in as milliseconds, never read from a clock
//! - Particle randomness comes from a seeded RNG
//! - No drawing or platform dependencies

pub mod geometry;
pub mod particles;
pub mod points;
pub mod source;
pub mod state;
pub mod tick;

pub use geometry::{GeometryMapping, Viewport, normalized_progress, vertical_progress};
pub use particles::{Particle, ParticleSystem};
pub use points::{Point, PointBuffer, SampleOutcome};
pub use source::{ValueSource, growth_multiplier, smooth_toward};
pub use state::{GraphState, Phase};
pub use tick::{advance, integrate_particles};
