//! Screenshot functionality for saving the composited overlay.

use image::{ImageBuffer, Rgba, RgbaImage};
use sim_overlay_core::Frame;
use std::path::Path;

/// Converts a BGRA camera frame into an RGBA image.
///
/// Returns `None` if the frame's buffer does not match its dimensions.
pub fn frame_to_rgba(frame: &Frame) -> Option<RgbaImage> {
    let mut rgba_data = frame.data().to_vec();
    for chunk in rgba_data.chunks_exact_mut(4) {
        chunk.swap(0, 2); // Swap B and R
    }
    ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(frame.width, frame.height, rgba_data)
}

/// Saves an RGBA image to a file.
///
/// The format follows the extension: `.png`, or `.jpg`/`.jpeg` (alpha dropped).
///
/// # Errors
/// Returns an error if the file cannot be written or format is unsupported.
pub fn save_image(filename: impl AsRef<Path>, img: &RgbaImage) -> Result<(), ScreenshotError> {
    let path = filename.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "png" => {
            img.save_with_format(path, image::ImageFormat::Png)?;
        }
        "jpg" | "jpeg" => {
            let rgb_img = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            rgb_img.save_with_format(path, image::ImageFormat::Jpeg)?;
        }
        _ => {
            return Err(ScreenshotError::UnsupportedFormat(extension));
        }
    }

    log::info!("Screenshot saved to {}", path.display());
    Ok(())
}

/// Encodes an RGBA image as PNG in memory.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, ScreenshotError> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Error type for screenshot operations.
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("Failed to save image: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}
