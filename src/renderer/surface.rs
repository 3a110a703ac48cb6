//! Drawing surface abstraction
//!
//! The renderer speaks to the host through [`Surface`], a small immediate-mode
//! 2D API (paths, gradients, text, shadows). Coordinates are logical pixels;
//! the surface owns any device pixel scaling.

use glam::DVec2;

use super::color::Color;

/// A color stop inside a gradient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient (0-1)
    pub offset: f64,
    pub color: Color,
}

impl GradientStop {
    pub const fn new(offset: f64, color: Color) -> Self {
        Self { offset, color }
    }
}

/// How a fill or stroke is colored
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Linear {
        start: DVec2,
        end: DVec2,
        stops: Vec<GradientStop>,
    },
    Radial {
        center: DVec2,
        inner_radius: f64,
        outer_radius: f64,
        stops: Vec<GradientStop>,
    },
}

impl Paint {
    /// Top-to-bottom two-stop gradient
    pub fn vertical(top: f64, bottom: f64, from: Color, to: Color) -> Self {
        Paint::Linear {
            start: DVec2::new(0.0, top),
            end: DVec2::new(0.0, bottom),
            stops: vec![GradientStop::new(0.0, from), GradientStop::new(1.0, to)],
        }
    }

    /// Radial falloff from `color` at the center to transparent at `radius`
    pub fn glow(center: DVec2, radius: f64, color: Color) -> Self {
        Paint::Radial {
            center,
            inner_radius: 0.0,
            outer_radius: radius,
            stops: vec![
                GradientStop::new(0.0, color),
                GradientStop::new(1.0, color.with_alpha(0.0)),
            ],
        }
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Paint::Solid(color)
    }
}

/// Horizontal text anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Font and anchoring for `fill_text` (text is vertically centered)
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// CSS font shorthand, e.g. `bold 48px monospace`
    pub font: String,
    pub align: TextAlign,
}

impl TextStyle {
    pub fn new(font: impl Into<String>, align: TextAlign) -> Self {
        Self {
            font: font.into(),
            align,
        }
    }
}

/// Named groups of draw calls, in back-to-front order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background,
    Grid,
    Fill,
    Curve,
    Glow,
    Trail,
    Label,
    Particles,
}

/// Immediate-mode 2D drawing target
pub trait Surface {
    /// Resize the backing store for a new viewport (logical size + pixel ratio)
    fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64);

    /// Erase a rectangle to transparent
    fn clear(&mut self, width: f64, height: f64);
    fn fill_rect(&mut self, origin: DVec2, size: DVec2, paint: &Paint);

    fn begin_path(&mut self);
    fn move_to(&mut self, point: DVec2);
    fn line_to(&mut self, point: DVec2);
    fn quadratic_to(&mut self, control: DVec2, end: DVec2);
    /// Add a full circle as a closed subpath
    fn circle(&mut self, center: DVec2, radius: f64);
    fn close_path(&mut self);
    fn fill(&mut self, paint: &Paint);
    fn stroke(&mut self, paint: &Paint, width: f64);

    fn fill_text(&mut self, text: &str, at: DVec2, style: &TextStyle, paint: &Paint);

    /// Global opacity for subsequent draws
    fn set_alpha(&mut self, alpha: f64);
    /// Blurred shadow behind subsequent draws (blur 0 disables)
    fn set_shadow(&mut self, color: Color, blur: f64);
    /// Dash pattern for subsequent strokes (empty = solid)
    fn set_line_dash(&mut self, segments: &[f64]);

    /// Push alpha/shadow/dash state
    fn save(&mut self);
    /// Pop alpha/shadow/dash state
    fn restore(&mut self);

    /// Marks the start of a layer; hosts may ignore it
    fn begin_layer(&mut self, _layer: Layer) {}
}
