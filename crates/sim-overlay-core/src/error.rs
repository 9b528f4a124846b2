//! Error types for sim-overlay-core.

use thiserror::Error;

/// The main error type for core overlay operations.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// Camera parameters that cannot describe a pinhole camera.
    #[error("invalid camera parameters: width={width}, height={height}, fov={fov_degrees}")]
    InvalidCamera {
        width: u32,
        height: u32,
        fov_degrees: f32,
    },

    /// A resolution string that is not of the form `WxH`.
    #[error("invalid resolution '{0}', expected WIDTHxHEIGHT")]
    InvalidResolution(String),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Scenario options that are inconsistent.
    #[error("invalid scenario options: {0}")]
    InvalidOptions(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for core overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;
