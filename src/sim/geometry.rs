//! Multiplier to surface coordinate mapping
//!
//! The content area is the viewport minus padding. A multiplier maps to:
//! - x: linearly across the content width by normalized progress
//! - y: up the content height along a piecewise curve (gentle quadratic
//!   lift-off below the knee, then a straight climb that meets it with the
//!   same slope)
//!
//! Progress saturates at the display ceiling, so the head pins to the
//! top-right corner for any multiplier at or above `max_multiplier`.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::MIN_GRAPH_SIZE;
use crate::settings::Padding;

/// Normalized progress where the vertical curve switches from quadratic to linear
pub const VERTICAL_KNEE: f64 = 0.4;
/// Vertical progress reached at the knee
pub const VERTICAL_KNEE_HEIGHT: f64 = 0.25;

/// Viewport size in logical pixels plus the device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
        let sane = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        Self {
            width: sane(width),
            height: sane(height),
            pixel_ratio,
        }
    }
}

/// Padding and content-area dimensions for one viewport size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryMapping {
    pub padding: Padding,
    pub display_width: f64,
    pub display_height: f64,
    pub pixel_ratio: f64,
    /// Content width (never below `MIN_GRAPH_SIZE`)
    pub graph_width: f64,
    /// Content height (never below `MIN_GRAPH_SIZE`)
    pub graph_height: f64,
}

impl GeometryMapping {
    pub fn new(viewport: Viewport, padding: Padding) -> Self {
        let graph_width = (viewport.width - padding.left - padding.right).max(MIN_GRAPH_SIZE);
        let graph_height = (viewport.height - padding.top - padding.bottom).max(MIN_GRAPH_SIZE);
        Self {
            padding,
            display_width: viewport.width,
            display_height: viewport.height,
            pixel_ratio: viewport.pixel_ratio,
            graph_width,
            graph_height,
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.display_width,
            height: self.display_height,
            pixel_ratio: self.pixel_ratio,
        }
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.padding.left
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.padding.top
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.padding.left + self.graph_width
    }

    /// Content-area floor (largest y a curve point may take)
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.padding.top + self.graph_height
    }

    /// Bottom-left content corner, where every round starts
    pub fn origin(&self) -> DVec2 {
        DVec2::new(self.left(), self.bottom())
    }

    /// Map a multiplier to its surface position
    pub fn position(&self, multiplier: f64, max_multiplier: f64) -> DVec2 {
        let t = normalized_progress(multiplier, max_multiplier);
        DVec2::new(
            self.left() + t * self.graph_width,
            self.bottom() - vertical_progress(t) * self.graph_height,
        )
    }

    /// Vertical position of a multiplier (used for grid guides)
    pub fn y_for(&self, multiplier: f64, max_multiplier: f64) -> f64 {
        self.position(multiplier, max_multiplier).y
    }

    /// Carry a point drawn under `from` into this geometry, preserving its
    /// relative place inside the content area.
    pub fn rescale_from(&self, point: DVec2, from: &GeometryMapping) -> DVec2 {
        let sx = self.graph_width / from.graph_width;
        let sy = self.graph_height / from.graph_height;
        DVec2::new(
            self.left() + (point.x - from.left()) * sx,
            self.top() + (point.y - from.top()) * sy,
        )
    }
}

/// `min((m - 1) / (max - 1), 1)`, floored at 0
pub fn normalized_progress(multiplier: f64, max_multiplier: f64) -> f64 {
    let span = (max_multiplier - 1.0).max(f64::EPSILON);
    ((multiplier - 1.0) / span).clamp(0.0, 1.0)
}

/// Piecewise vertical curve over normalized progress.
///
/// Quadratic up to the knee, linear after it. Both pieces share the slope
/// `2 * KNEE_HEIGHT / KNEE` at the join, so the curve has no visible corner.
pub fn vertical_progress(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t <= VERTICAL_KNEE {
        let u = t / VERTICAL_KNEE;
        VERTICAL_KNEE_HEIGHT * u * u
    } else {
        let u = (t - VERTICAL_KNEE) / (1.0 - VERTICAL_KNEE);
        VERTICAL_KNEE_HEIGHT + (1.0 - VERTICAL_KNEE_HEIGHT) * u
    }
}
