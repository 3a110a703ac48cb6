//! Frame drawing passes
//!
//! A frame is drawn back to front: background, grid, fill, curve, glow,
//! trail, label, then (after a crash) particles. The renderer owns the
//! surface; nothing else draws on it.

use glam::DVec2;

use super::color::Color;
use super::path::{PathSegment, collapse, smooth_path, trace};
use super::surface::{Layer, Paint, Surface, TextAlign, TextStyle};
use crate::consts::{GLOW_PULSE_AMOUNT, GLOW_PULSE_RATE};
use crate::format_multiplier;
use crate::settings::Settings;
use crate::sim::{GeometryMapping, GraphState, ParticleSystem, Phase, Viewport};

/// Grid cell counts across the content area
const GRID_COLUMNS: usize = 10;
const GRID_ROWS: usize = 8;
/// Multipliers that get a labelled dashed guide
const GRID_MARKERS: [f64; 3] = [2.0, 5.0, 10.0];

const GRID_LINE: Color = Color::rgba(0xff, 0xff, 0xff, 0x0d);
const GRID_GUIDE: Color = Color::rgba(0xff, 0xff, 0xff, 0x26);
const GRID_LABEL: Color = Color::rgba(0xff, 0xff, 0xff, 0x4d);

/// Fill opacity directly under the curve (fades to 0 at the floor)
const FILL_ALPHA: f64 = 0.25;
/// Glow opacity at the head center
const GLOW_ALPHA: f64 = 0.4;
/// Peak trail dot opacity (at the head)
const TRAIL_ALPHA: f64 = 0.5;
/// Label shadow blur (px)
const LABEL_GLOW: f64 = 25.0;

/// Appearance options the renderer reads every frame
#[derive(Debug, Clone)]
struct Style {
    grow_color: Color,
    crash_color: Color,
    background_color: Color,
    glow_size: f64,
    line_width: f64,
    trail_length: usize,
    grid_lines: bool,
    max_multiplier: f64,
}

/// Draws frames onto an owned surface
pub struct Renderer<S: Surface> {
    surface: S,
    style: Style,
}

impl<S: Surface> Renderer<S> {
    pub fn new(surface: S, settings: &Settings) -> Self {
        Self {
            surface,
            style: Style {
                grow_color: settings.grow_color,
                crash_color: settings.crash_color,
                background_color: settings.background_color,
                glow_size: settings.glow_size,
                line_width: settings.line_width,
                trail_length: settings.trail_length,
                grid_lines: settings.grid_lines,
                max_multiplier: settings.max_multiplier,
            },
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Resize the backing store for a new viewport
    pub fn resize(&mut self, viewport: Viewport) {
        self.surface
            .resize(viewport.width, viewport.height, viewport.pixel_ratio);
    }

    /// Curve color for a phase
    pub fn phase_color(&self, phase: Phase) -> Color {
        match phase {
            Phase::Crashed => self.style.crash_color,
            Phase::Idle | Phase::Running => self.style.grow_color,
        }
    }

    /// Draw everything except particles.
    ///
    /// In the crashed phase the curve is drawn through the collapse transform.
    pub fn draw_scene(&mut self, state: &GraphState, now_ms: f64) {
        let geometry = state.geometry;
        let color = self.phase_color(state.phase);

        let mut points = state.points.positions();
        if let Some(progress) = state.collapse_progress(now_ms) {
            points = collapse(&points, geometry.bottom(), geometry.graph_height, progress);
        }

        self.draw_background(&geometry);
        if self.style.grid_lines {
            self.draw_grid(&geometry);
        }

        if points.len() >= 2 {
            let path = smooth_path(&points);
            self.draw_fill(&geometry, &path, color);
            self.draw_curve(&path, color);
        }
        if let Some(&head) = points.last() {
            self.draw_glow(head, color, now_ms);
            self.draw_trail(&points, color);
        }

        self.draw_label(&geometry, state.current_multiplier, color);
    }

    /// Draw the live explosion (crashed phase only)
    pub fn draw_particles(&mut self, particles: &ParticleSystem) {
        if particles.is_empty() {
            return;
        }
        let paint = Paint::Solid(self.style.crash_color);
        let surface = &mut self.surface;

        surface.begin_layer(Layer::Particles);
        surface.save();
        for particle in particles.as_slice() {
            surface.set_alpha(particle.life.clamp(0.0, 1.0));
            surface.begin_path();
            surface.circle(particle.pos, particle.size * particle.life.max(0.0));
            surface.fill(&paint);
        }
        surface.restore();
    }

    fn draw_background(&mut self, geometry: &GeometryMapping) {
        let (w, h) = (geometry.display_width, geometry.display_height);
        let top = self.style.background_color;
        let bottom = top.mix(Color::rgb(0, 0, 0), 0.2);

        self.surface.begin_layer(Layer::Background);
        self.surface.clear(w, h);
        self.surface.fill_rect(
            DVec2::ZERO,
            DVec2::new(w, h),
            &Paint::vertical(0.0, h, top, bottom),
        );
    }

    fn draw_grid(&mut self, geometry: &GeometryMapping) {
        let surface = &mut self.surface;
        let (left, right) = (geometry.left(), geometry.right());
        let (top, bottom) = (geometry.top(), geometry.bottom());
        let line = Paint::Solid(GRID_LINE);

        surface.begin_layer(Layer::Grid);
        surface.begin_path();
        for i in 0..=GRID_COLUMNS {
            let x = left + geometry.graph_width * i as f64 / GRID_COLUMNS as f64;
            surface.move_to(DVec2::new(x, top));
            surface.line_to(DVec2::new(x, bottom));
        }
        for i in 0..=GRID_ROWS {
            let y = top + geometry.graph_height * i as f64 / GRID_ROWS as f64;
            surface.move_to(DVec2::new(left, y));
            surface.line_to(DVec2::new(right, y));
        }
        surface.stroke(&line, 1.0);

        let label_style = TextStyle::new("12px monospace", TextAlign::Right);
        let label_x = geometry.display_width - 6.0;
        surface.save();
        surface.set_line_dash(&[5.0, 5.0]);
        for marker in GRID_MARKERS {
            if marker > self.style.max_multiplier {
                continue;
            }
            let y = geometry.y_for(marker, self.style.max_multiplier);
            if y <= top || y >= bottom {
                continue;
            }
            surface.begin_path();
            surface.move_to(DVec2::new(left, y));
            surface.line_to(DVec2::new(right, y));
            surface.stroke(&Paint::Solid(GRID_GUIDE), 1.0);
            surface.fill_text(
                &format!("{marker}x"),
                DVec2::new(label_x, y),
                &label_style,
                &Paint::Solid(GRID_LABEL),
            );
        }
        surface.restore();
    }

    fn draw_fill(&mut self, geometry: &GeometryMapping, path: &[PathSegment], color: Color) {
        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            return;
        };
        let floor = geometry.bottom();
        let surface = &mut self.surface;

        surface.begin_layer(Layer::Fill);
        surface.begin_path();
        surface.move_to(DVec2::new(first.end().x, floor));
        surface.line_to(first.end());
        trace(surface, &path[1..]);
        surface.line_to(DVec2::new(last.end().x, floor));
        surface.close_path();
        surface.fill(&Paint::vertical(
            geometry.top(),
            floor,
            color.with_alpha(FILL_ALPHA),
            color.with_alpha(0.0),
        ));
    }

    fn draw_curve(&mut self, path: &[PathSegment], color: Color) {
        let surface = &mut self.surface;
        surface.begin_layer(Layer::Curve);
        surface.save();
        surface.set_shadow(color, self.style.glow_size * 0.5);
        surface.begin_path();
        trace(surface, path);
        surface.stroke(&Paint::Solid(color), self.style.line_width);
        surface.restore();
    }

    fn draw_glow(&mut self, head: DVec2, color: Color, now_ms: f64) {
        let pulse = 1.0 + GLOW_PULSE_AMOUNT * (now_ms * GLOW_PULSE_RATE).sin();
        let radius = self.style.glow_size * pulse;
        let surface = &mut self.surface;

        surface.begin_layer(Layer::Glow);
        surface.begin_path();
        surface.circle(head, radius);
        surface.fill(&Paint::glow(head, radius, color.with_alpha(GLOW_ALPHA)));

        surface.begin_path();
        surface.circle(head, self.style.line_width * 1.5);
        surface.fill(&Paint::Solid(color));
    }

    /// Dots over the newest points; alpha and radius grow linearly toward the head
    fn draw_trail(&mut self, points: &[DVec2], color: Color) {
        let count = self.style.trail_length.min(points.len());
        if count == 0 {
            return;
        }
        let trail = &points[points.len() - count..];
        let paint = Paint::Solid(color);
        let max_radius = self.style.line_width * 2.0;
        let surface = &mut self.surface;

        surface.begin_layer(Layer::Trail);
        surface.save();
        for (i, &point) in trail.iter().enumerate() {
            let recency = (i + 1) as f64 / count as f64;
            surface.set_alpha(recency * TRAIL_ALPHA);
            surface.begin_path();
            surface.circle(point, max_radius * recency);
            surface.fill(&paint);
        }
        surface.restore();
    }

    fn draw_label(&mut self, geometry: &GeometryMapping, multiplier: f64, color: Color) {
        let text = format_multiplier(multiplier);
        let size = (geometry.display_height * 0.15).clamp(24.0, 64.0);
        let style = TextStyle::new(format!("bold {size:.0}px monospace"), TextAlign::Center);
        let at = DVec2::new(
            geometry.display_width * 0.5,
            geometry.top() + geometry.graph_height * 0.5,
        );
        let paint = Paint::Solid(color);
        let surface = &mut self.surface;

        surface.begin_layer(Layer::Label);
        surface.save();
        surface.set_shadow(color, LABEL_GLOW);
        surface.fill_text(&text, at, &style, &paint);
        // Second pass without shadow keeps the glyphs crisp
        surface.set_shadow(Color::TRANSPARENT, 0.0);
        surface.fill_text(&text, at, &style, &paint);
        surface.restore();
    }
}
