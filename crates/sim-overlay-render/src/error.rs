//! Rendering error types.

use thiserror::Error;

use crate::screenshot::ScreenshotError;

/// Errors that can occur during overlay rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The view index does not exist on this renderer.
    #[error("view {view} out of range ({views} views)")]
    ViewOutOfRange { view: usize, views: usize },

    /// A frame does not match the viewport it is drawn into.
    #[error("frame is {actual_width}x{actual_height}, viewport is {width}x{height}")]
    FrameSizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// The display surface went away.
    #[error("display closed")]
    DisplayClosed,

    /// Saving the canvas failed.
    #[error("screenshot failed: {0}")]
    Screenshot(#[from] ScreenshotError),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
