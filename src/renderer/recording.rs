//! Command-recording surface
//!
//! Stores every draw call instead of rasterizing it. Used by headless hosts
//! and by tests that assert on what a frame drew.

use glam::DVec2;

use super::color::Color;
use super::surface::{Layer, Paint, Surface, TextStyle};

/// One recorded surface call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Resize { width: f64, height: f64, pixel_ratio: f64 },
    Clear { width: f64, height: f64 },
    FillRect { origin: DVec2, size: DVec2, paint: Paint },
    BeginPath,
    MoveTo(DVec2),
    LineTo(DVec2),
    QuadraticTo { control: DVec2, end: DVec2 },
    Circle { center: DVec2, radius: f64 },
    ClosePath,
    Fill(Paint),
    Stroke { paint: Paint, width: f64 },
    Text { text: String, at: DVec2, style: TextStyle, paint: Paint },
    Alpha(f64),
    Shadow { color: Color, blur: f64 },
    LineDash(Vec<f64>),
    Save,
    Restore,
    Layer(Layer),
}

/// Surface that records instead of drawing
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
    /// Last logical size passed to `resize`
    pub size: DVec2,
    pub pixel_ratio: f64,
    depth: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Layers in the order they were started
    pub fn layers(&self) -> Vec<Layer> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Layer(layer) => Some(*layer),
                _ => None,
            })
            .collect()
    }

    /// Commands recorded between the start of `layer` and the next layer
    pub fn layer_commands(&self, layer: Layer) -> Vec<&DrawCommand> {
        self.commands
            .iter()
            .skip_while(|c| **c != DrawCommand::Layer(layer))
            .skip(1)
            .take_while(|c| !matches!(c, DrawCommand::Layer(_)))
            .collect()
    }

    /// All text drawn
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Current save/restore nesting (0 when balanced)
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) {
        self.size = DVec2::new(width, height);
        self.pixel_ratio = pixel_ratio;
        self.commands.push(DrawCommand::Resize {
            width,
            height,
            pixel_ratio,
        });
    }

    fn clear(&mut self, width: f64, height: f64) {
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn fill_rect(&mut self, origin: DVec2, size: DVec2, paint: &Paint) {
        self.commands.push(DrawCommand::FillRect {
            origin,
            size,
            paint: paint.clone(),
        });
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, point: DVec2) {
        self.commands.push(DrawCommand::MoveTo(point));
    }

    fn line_to(&mut self, point: DVec2) {
        self.commands.push(DrawCommand::LineTo(point));
    }

    fn quadratic_to(&mut self, control: DVec2, end: DVec2) {
        self.commands.push(DrawCommand::QuadraticTo { control, end });
    }

    fn circle(&mut self, center: DVec2, radius: f64) {
        self.commands.push(DrawCommand::Circle { center, radius });
    }

    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }

    fn fill(&mut self, paint: &Paint) {
        self.commands.push(DrawCommand::Fill(paint.clone()));
    }

    fn stroke(&mut self, paint: &Paint, width: f64) {
        self.commands.push(DrawCommand::Stroke {
            paint: paint.clone(),
            width,
        });
    }

    fn fill_text(&mut self, text: &str, at: DVec2, style: &TextStyle, paint: &Paint) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            at,
            style: style.clone(),
            paint: paint.clone(),
        });
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.commands.push(DrawCommand::Alpha(alpha));
    }

    fn set_shadow(&mut self, color: Color, blur: f64) {
        self.commands.push(DrawCommand::Shadow { color, blur });
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        self.commands.push(DrawCommand::LineDash(segments.to_vec()));
    }

    fn save(&mut self) {
        self.depth += 1;
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.commands.push(DrawCommand::Restore);
    }

    fn begin_layer(&mut self, layer: Layer) {
        self.commands.push(DrawCommand::Layer(layer));
    }
}
