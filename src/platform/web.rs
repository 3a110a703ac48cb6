//! Browser host: canvas surface, animation frames, performance clock
//!
//! [`CrashGraphHandle`] is the JS-facing object. It owns the graph behind an
//! `Rc<RefCell<_>>`; the frame and resize callbacks hold weak references so
//! dropping the handle releases everything.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::DVec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement, Performance, ResizeObserver,
    Window,
};

use crate::controller::{Clock, CrashGraph, FrameHandle, Scheduler};
use crate::error::GraphError;
use crate::renderer::{Color, GradientStop, Paint, Surface, TextStyle};
use crate::settings::Settings;
use crate::sim::Viewport;

type WebGraph = CrashGraph<CanvasSurface, AnimationFrameScheduler, PerformanceClock>;
type FrameCallback = Closure<dyn FnMut(f64)>;

/// Install the panic hook and console logger once the module loads
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"crash-graph: logger already initialized".into());
    }
}

fn window() -> Result<Window, GraphError> {
    web_sys::window().ok_or_else(|| GraphError::ContextUnavailable("no window".into()))
}

fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
}

impl From<GraphError> for JsValue {
    fn from(err: GraphError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

// ============================================================================
// Surface
// ============================================================================

/// `Surface` over a `<canvas>` 2D context
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Look up a canvas by element id and take its 2D context
    pub fn from_element_id(id: &str) -> Result<Self, GraphError> {
        let document = window()?
            .document()
            .ok_or_else(|| GraphError::ContextUnavailable("no document".into()))?;
        let element = document
            .get_element_by_id(id)
            .ok_or_else(|| GraphError::SurfaceNotFound { id: id.to_string() })?;
        let canvas = element
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| GraphError::NotACanvas { id: id.to_string() })?;
        Self::new(canvas)
    }

    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, GraphError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| GraphError::ContextUnavailable(format!("{e:?}")))?
            .ok_or_else(|| GraphError::ContextUnavailable("no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| GraphError::ContextUnavailable("not a 2d context".into()))?;
        Ok(Self { canvas, ctx })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Current layout size of the canvas (CSS pixels) with the device ratio
    pub fn viewport(&self) -> Viewport {
        let rect = self.canvas.get_bounding_client_rect();
        Viewport::new(rect.width(), rect.height(), device_pixel_ratio())
    }

    fn gradient(&self, paint: &Paint) -> Option<CanvasGradient> {
        let (gradient, stops) = match paint {
            Paint::Solid(_) => return None,
            Paint::Linear { start, end, stops } => (
                self.ctx.create_linear_gradient(start.x, start.y, end.x, end.y),
                stops,
            ),
            Paint::Radial {
                center,
                inner_radius,
                outer_radius,
                stops,
            } => (
                self.ctx
                    .create_radial_gradient(
                        center.x,
                        center.y,
                        inner_radius.max(0.0),
                        center.x,
                        center.y,
                        outer_radius.max(0.0),
                    )
                    .ok()?,
                stops,
            ),
        };
        add_stops(&gradient, stops);
        Some(gradient)
    }

    fn set_fill(&self, paint: &Paint) {
        match paint {
            Paint::Solid(color) => self.ctx.set_fill_style_str(&color.to_css()),
            _ => match self.gradient(paint) {
                Some(gradient) => self.ctx.set_fill_style_canvas_gradient(&gradient),
                None => log::warn!("Gradient rejected by canvas"),
            },
        }
    }

    fn set_stroke(&self, paint: &Paint) {
        match paint {
            Paint::Solid(color) => self.ctx.set_stroke_style_str(&color.to_css()),
            _ => match self.gradient(paint) {
                Some(gradient) => self.ctx.set_stroke_style_canvas_gradient(&gradient),
                None => log::warn!("Gradient rejected by canvas"),
            },
        }
    }
}

fn add_stops(gradient: &CanvasGradient, stops: &[GradientStop]) {
    for stop in stops {
        let offset = stop.offset.clamp(0.0, 1.0) as f32;
        if gradient.add_color_stop(offset, &stop.color.to_css()).is_err() {
            log::warn!("Bad gradient stop {offset} {}", stop.color);
        }
    }
}

impl Surface for CanvasSurface {
    fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) {
        // Backing store in device pixels, drawing in CSS pixels
        self.canvas.set_width((width * pixel_ratio).round() as u32);
        self.canvas.set_height((height * pixel_ratio).round() as u32);
        self.ctx
            .set_transform(pixel_ratio, 0.0, 0.0, pixel_ratio, 0.0, 0.0)
            .ok();
    }

    fn clear(&mut self, width: f64, height: f64) {
        self.ctx.clear_rect(0.0, 0.0, width, height);
    }

    fn fill_rect(&mut self, origin: DVec2, size: DVec2, paint: &Paint) {
        self.set_fill(paint);
        self.ctx.fill_rect(origin.x, origin.y, size.x, size.y);
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, point: DVec2) {
        self.ctx.move_to(point.x, point.y);
    }

    fn line_to(&mut self, point: DVec2) {
        self.ctx.line_to(point.x, point.y);
    }

    fn quadratic_to(&mut self, control: DVec2, end: DVec2) {
        self.ctx
            .quadratic_curve_to(control.x, control.y, end.x, end.y);
    }

    fn circle(&mut self, center: DVec2, radius: f64) {
        let radius = radius.max(0.0);
        self.ctx.move_to(center.x + radius, center.y);
        self.ctx
            .arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU)
            .ok();
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn fill(&mut self, paint: &Paint) {
        self.set_fill(paint);
        self.ctx.fill();
    }

    fn stroke(&mut self, paint: &Paint, width: f64) {
        self.set_stroke(paint);
        self.ctx.set_line_width(width);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        self.ctx.stroke();
    }

    fn fill_text(&mut self, text: &str, at: DVec2, style: &TextStyle, paint: &Paint) {
        self.set_fill(paint);
        self.ctx.set_font(&style.font);
        self.ctx.set_text_align(style.align.as_str());
        self.ctx.set_text_baseline("middle");
        self.ctx.fill_text(text, at.x, at.y).ok();
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha.clamp(0.0, 1.0));
    }

    fn set_shadow(&mut self, color: Color, blur: f64) {
        self.ctx.set_shadow_color(&color.to_css());
        self.ctx.set_shadow_blur(blur.max(0.0));
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        let dash: js_sys::Array = segments.iter().map(|&s| JsValue::from_f64(s)).collect();
        self.ctx.set_line_dash(&dash).ok();
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }
}

// ============================================================================
// Frames and time
// ============================================================================

/// `requestAnimationFrame`-backed scheduler.
///
/// The frame callback is bound after the graph exists, since it needs a
/// reference back to it.
pub struct AnimationFrameScheduler {
    window: Window,
    callback: Rc<RefCell<Option<FrameCallback>>>,
}

impl AnimationFrameScheduler {
    pub fn new() -> Result<Self, GraphError> {
        Ok(Self {
            window: window()?,
            callback: Rc::new(RefCell::new(None)),
        })
    }

    /// Set the function every requested frame runs
    pub fn bind(&self, callback: FrameCallback) {
        *self.callback.borrow_mut() = Some(callback);
    }
}

impl Scheduler for AnimationFrameScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let slot = self.callback.borrow();
        let Some(callback) = slot.as_ref() else {
            log::warn!("Frame requested before a callback was bound");
            return FrameHandle(0);
        };
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(id) => FrameHandle(id as u64),
            Err(e) => {
                log::warn!("requestAnimationFrame failed: {e:?}");
                FrameHandle(0)
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if handle.0 != 0 {
            self.window.cancel_animation_frame(handle.0 as i32).ok();
        }
    }
}

/// `performance.now()`, the same time base as animation frame timestamps
pub struct PerformanceClock {
    performance: Option<Performance>,
}

impl PerformanceClock {
    pub fn new() -> Self {
        Self {
            performance: web_sys::window().and_then(|w| w.performance()),
        }
    }
}

impl Default for PerformanceClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        match &self.performance {
            Some(performance) => performance.now(),
            None => js_sys::Date::now(),
        }
    }
}

// ============================================================================
// JS bindings
// ============================================================================

/// Crash graph bound to a page canvas
#[wasm_bindgen]
pub struct CrashGraphHandle {
    graph: Rc<RefCell<WebGraph>>,
    observer: Option<ResizeObserver>,
    _on_resize: Option<Closure<dyn FnMut(js_sys::Array)>>,
}

#[wasm_bindgen]
impl CrashGraphHandle {
    /// `new CrashGraphHandle("canvas-id", '{"external_mode": true}')`
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, settings_json: Option<String>) -> Result<CrashGraphHandle, JsValue> {
        let settings = match settings_json.as_deref() {
            Some(json) if !json.trim().is_empty() => Settings::from_json(json)?,
            _ => Settings::default(),
        };
        let surface = CanvasSurface::from_element_id(canvas_id)?;
        let viewport = surface.viewport();
        let canvas = surface.canvas().clone();
        let scheduler = AnimationFrameScheduler::new()?;
        let frame_slot = scheduler.callback.clone();

        let graph = Rc::new(RefCell::new(CrashGraph::new(
            surface,
            scheduler,
            PerformanceClock::new(),
            settings,
            viewport,
        )));

        let weak = Rc::downgrade(&graph);
        *frame_slot.borrow_mut() = Some(Closure::<dyn FnMut(_)>::new(move |time: f64| {
            let Some(graph) = weak.upgrade() else {
                return;
            };
            // The JS callback may call straight back into the handle
            let completed = graph.borrow_mut().on_frame(time);
            if let Some(completed) = completed {
                completed.notify();
            }
        }));

        let (observer, on_resize) = match observe_resize(&canvas, Rc::downgrade(&graph)) {
            Ok((observer, closure)) => (Some(observer), Some(closure)),
            Err(e) => {
                log::warn!("{e}; falling back to a fixed size");
                (None, None)
            }
        };

        log::info!("Crash graph attached to #{canvas_id}");
        Ok(CrashGraphHandle {
            graph,
            observer,
            _on_resize: on_resize,
        })
    }

    /// Begin a round, optionally at a given `performance.now()` timestamp
    pub fn start(&self, start_time: Option<f64>) {
        self.graph.borrow_mut().start(start_time);
    }

    #[wasm_bindgen(js_name = setExternalMultiplier)]
    pub fn set_external_multiplier(&self, value: f64, immediate: Option<bool>) -> bool {
        self.graph
            .borrow_mut()
            .set_external_multiplier(value, immediate.unwrap_or(false))
    }

    pub fn crash(&self, multiplier: Option<f64>) {
        self.graph.borrow_mut().crash(multiplier);
    }

    pub fn stop(&self) {
        self.graph.borrow_mut().stop();
    }

    pub fn reset(&self) {
        self.graph.borrow_mut().reset();
    }

    pub fn destroy(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        self._on_resize = None;
        self.graph.borrow_mut().destroy();
    }

    /// Register `fn(crashMultiplier)`, called once the crash animation ends
    #[wasm_bindgen(js_name = onCrashComplete)]
    pub fn on_crash_complete(&self, callback: js_sys::Function) {
        self.graph.borrow_mut().on_crash_complete(move |multiplier| {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_f64(multiplier)) {
                log::warn!("onCrashComplete threw: {e:?}");
            }
        });
    }

    #[wasm_bindgen(getter)]
    pub fn multiplier(&self) -> f64 {
        self.graph.borrow().current_multiplier()
    }

    #[wasm_bindgen(getter, js_name = crashMultiplier)]
    pub fn crash_multiplier(&self) -> Option<f64> {
        self.graph.borrow().crash_multiplier()
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.graph.borrow().is_running()
    }

    #[wasm_bindgen(getter, js_name = isCrashed)]
    pub fn is_crashed(&self) -> bool {
        self.graph.borrow().is_crashed()
    }
}

fn observe_resize(
    canvas: &HtmlCanvasElement,
    graph: Weak<RefCell<WebGraph>>,
) -> Result<(ResizeObserver, Closure<dyn FnMut(js_sys::Array)>), GraphError> {
    let target = canvas.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |_entries: js_sys::Array| {
        let Some(graph) = graph.upgrade() else {
            return;
        };
        let rect = target.get_bounding_client_rect();
        graph
            .borrow_mut()
            .resize(rect.width(), rect.height(), device_pixel_ratio());
    });

    let observer = ResizeObserver::new(closure.as_ref().unchecked_ref())
        .map_err(|e| GraphError::ResizeObserver(format!("{e:?}")))?;
    observer.observe(canvas);
    Ok((observer, closure))
}
