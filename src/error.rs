//! Engine error types
//!
//! Only construction can fail. Once a graph exists, every operation either
//! completes or is a no-op.

use thiserror::Error;

/// Errors raised while building a graph or its host bindings
#[derive(Debug, Error)]
pub enum GraphError {
    /// No element with the requested id exists in the document
    #[error("Drawing surface \"{id}\" not found")]
    SurfaceNotFound {
        /// The requested element id
        id: String,
    },

    /// The element exists but is not a canvas
    #[error("Element \"{id}\" is not a canvas")]
    NotACanvas {
        /// The offending element id
        id: String,
    },

    /// The host refused to hand out a 2D drawing context
    #[error("2D drawing context unavailable: {0}")]
    ContextUnavailable(String),

    /// Viewport size notifications could not be set up
    #[error("Resize observer unavailable: {0}")]
    ResizeObserver(String),

    /// Settings JSON failed to parse
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),
}
