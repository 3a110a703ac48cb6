//! Graph settings
//!
//! Fixed for the lifetime of a graph. Every option is enumerated here and
//! passes through [`Settings::validated`] exactly once, at construction.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::renderer::Color;

/// Space reserved around the content area (logical px)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            top: 60.0,
            right: 40.0,
            bottom: 30.0,
            left: 30.0,
        }
    }
}

impl Padding {
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    fn validated(self) -> Self {
        let side = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            top: side(self.top),
            right: side(self.right),
            bottom: side(self.bottom),
            left: side(self.left),
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Value source ===
    /// Per-millisecond exponential growth base (internal mode)
    pub growth_rate: f64,
    /// Drive the multiplier from pushed values instead of the growth formula
    pub external_mode: bool,
    /// Fraction of the remaining gap closed per frame in external mode
    pub smoothing: f64,

    // === Buffers ===
    /// Maximum buffered curve points
    pub max_points: usize,
    /// Number of head points drawn as a fading trail
    pub trail_length: usize,
    /// Particles spawned on crash
    pub particle_count: usize,
    /// RNG seed for particle spawning (None = seeded from the clock)
    pub seed: Option<u64>,

    // === Appearance ===
    pub grow_color: Color,
    pub crash_color: Color,
    pub background_color: Color,
    /// Head glow radius (logical px)
    pub glow_size: f64,
    /// Curve stroke width (logical px)
    pub line_width: f64,
    /// Draw the background grid and multiplier guides
    pub grid_lines: bool,
    /// Display ceiling: the curve saturates visually at this multiplier
    pub max_multiplier: f64,
    pub padding: Padding,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            growth_rate: 0.0001,
            external_mode: false,
            smoothing: 0.15,

            max_points: 120,
            trail_length: 8,
            particle_count: 35,
            seed: None,

            grow_color: Color::rgb(0x00, 0xff, 0x88),
            crash_color: Color::rgb(0xff, 0x33, 0x66),
            background_color: Color::rgb(0x1a, 0x1a, 0x2e),
            glow_size: 20.0,
            line_width: 3.0,
            grid_lines: true,
            max_multiplier: 10.0,
            padding: Padding::default(),
        }
    }
}

impl Settings {
    /// Settings for a graph driven by pushed values
    pub fn external() -> Self {
        Self {
            external_mode: true,
            ..Self::default()
        }
    }

    /// Parse settings from JSON (missing keys take defaults), then validate
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.validated())
    }

    /// Clamp every option into its usable range.
    ///
    /// Non-finite numbers fall back to the default for that option.
    pub fn validated(self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };

        let validated = Self {
            growth_rate: finite_or(self.growth_rate, defaults.growth_rate).max(0.0),
            external_mode: self.external_mode,
            smoothing: finite_or(self.smoothing, defaults.smoothing).clamp(0.01, 1.0),

            max_points: self.max_points.max(2),
            trail_length: self.trail_length,
            particle_count: self.particle_count,
            seed: self.seed,

            grow_color: self.grow_color,
            crash_color: self.crash_color,
            background_color: self.background_color,
            glow_size: positive_or(self.glow_size, defaults.glow_size),
            line_width: positive_or(self.line_width, defaults.line_width),
            grid_lines: self.grid_lines,
            max_multiplier: finite_or(self.max_multiplier, defaults.max_multiplier).max(1.01),
            padding: self.padding.validated(),
        };

        if validated != self {
            log::warn!("Settings adjusted during validation");
        }
        validated
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}
