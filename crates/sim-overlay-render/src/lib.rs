//! Overlay rendering for sim-overlay.
//!
//! This crate provides:
//! - The [`OverlayRenderer`] trait the scene loop draws through
//! - [`ImageCanvas`], a headless renderer compositing views into an RGBA image
//! - Screenshot saving and BGRA frame conversion

pub mod canvas;
pub mod error;
pub mod overlay;
pub mod screenshot;

pub use canvas::{ImageCanvas, MARKER_SIZE, MARKER_THICKNESS, TRAIL_DOT_SIZE};
pub use error::{RenderError, RenderResult};
pub use overlay::{Marker, MarkerKind, OverlayRenderer};
pub use screenshot::{encode_png, frame_to_rgba, save_image, ScreenshotError};
