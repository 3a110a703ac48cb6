//! 2D rendering module
//!
//! Frames are drawn through the [`Surface`] trait, so the same passes run on a
//! browser canvas or a command recorder.

pub mod color;
pub mod layers;
pub mod path;
pub mod recording;
pub mod surface;

pub use color::Color;
pub use layers::Renderer;
pub use path::{PathSegment, collapse, smooth_path, trace};
pub use recording::{DrawCommand, RecordingSurface};
pub use surface::{GradientStop, Layer, Paint, Surface, TextAlign, TextStyle};
