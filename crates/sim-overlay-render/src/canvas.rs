//! Headless overlay renderer backed by an in-memory RGBA image.

use std::path::Path;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use sim_overlay_core::Frame;

use crate::error::{RenderError, RenderResult};
use crate::overlay::{Marker, OverlayRenderer};
use crate::screenshot::{frame_to_rgba, save_image};

/// Side length of a marker square, in pixels.
pub const MARKER_SIZE: u32 = 20;

/// Stroke width of a marker square, in pixels.
pub const MARKER_THICKNESS: u32 = 3;

/// Side length of a filled trail dot, in pixels.
pub const TRAIL_DOT_SIZE: u32 = 4;

/// Composites camera views side by side into one image and draws markers
/// over them.
///
/// Labels are not rasterized; they are kept on the list returned by
/// [`drawn_markers`](Self::drawn_markers).
pub struct ImageCanvas {
    views: usize,
    width: u32,
    height: u32,
    image: RgbaImage,
    drawn: Vec<(usize, Marker)>,
    presented: u64,
    quit_requested: bool,
    quit_after: Option<u64>,
}

impl ImageCanvas {
    /// Creates a canvas with `views` viewports of `width` x `height`.
    #[must_use]
    pub fn new(views: usize, width: u32, height: u32) -> Self {
        let total_width = width.saturating_mul(u32::try_from(views).unwrap_or(u32::MAX));
        Self {
            views,
            width,
            height,
            image: RgbaImage::new(total_width, height),
            drawn: Vec::new(),
            presented: 0,
            quit_requested: false,
            quit_after: None,
        }
    }

    /// Requests quit once `frames` display frames have been presented.
    #[must_use]
    pub fn with_quit_after(mut self, frames: u64) -> Self {
        self.quit_after = Some(frames);
        self
    }

    /// Asks the scene loop to stop at its next poll.
    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    /// The composited image.
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Markers drawn since the last [`begin_frame`](OverlayRenderer::begin_frame),
    /// with their view index.
    #[must_use]
    pub fn drawn_markers(&self) -> &[(usize, Marker)] {
        &self.drawn
    }

    /// Number of presented display frames.
    #[must_use]
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Saves the current composite as PNG or JPEG.
    pub fn save(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        save_image(path, &self.image)?;
        Ok(())
    }

    fn check_view(&self, view: usize) -> RenderResult<()> {
        if view >= self.views {
            return Err(RenderError::ViewOutOfRange {
                view,
                views: self.views,
            });
        }
        Ok(())
    }

    fn view_origin(&self, view: usize) -> i64 {
        i64::from(self.width) * i64::try_from(view).unwrap_or(i64::MAX)
    }

    fn draw_marker(&mut self, view: usize, marker: &Marker) {
        let origin = self.view_origin(view);
        let color = Rgba(marker.kind.color());

        if marker.kind.is_dot() {
            let half = i64::from(TRAIL_DOT_SIZE / 2);
            let x = origin + i64::from(marker.pixel.x) - half;
            let y = i64::from(marker.pixel.y) - half;
            if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
                let rect = Rect::at(x, y).of_size(TRAIL_DOT_SIZE, TRAIL_DOT_SIZE);
                draw_filled_rect_mut(&mut self.image, rect, color);
            }
            return;
        }

        let half = i64::from(MARKER_SIZE / 2);

        for inset in 0..MARKER_THICKNESS {
            let size = MARKER_SIZE - 2 * inset;
            let x = origin + i64::from(marker.pixel.x) - half + i64::from(inset);
            let y = i64::from(marker.pixel.y) - half + i64::from(inset);
            let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
                continue;
            };
            // imageproc clips shapes that straddle the image border.
            draw_hollow_rect_mut(&mut self.image, Rect::at(x, y).of_size(size, size), color);
        }
    }
}

impl OverlayRenderer for ImageCanvas {
    fn views(&self) -> usize {
        self.views
    }

    fn begin_frame(&mut self) -> RenderResult<()> {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 255]);
        }
        self.drawn.clear();
        Ok(())
    }

    fn draw_view(
        &mut self,
        view: usize,
        frame: Option<&Frame>,
        markers: &[Marker],
    ) -> RenderResult<()> {
        self.check_view(view)?;

        let Some(frame) = frame else {
            return Ok(());
        };

        let mismatch = || RenderError::FrameSizeMismatch {
            width: self.width,
            height: self.height,
            actual_width: frame.width,
            actual_height: frame.height,
        };
        if frame.width != self.width || frame.height != self.height {
            return Err(mismatch());
        }
        let tile = frame_to_rgba(frame).ok_or_else(mismatch)?;
        let origin = self.view_origin(view);
        image::imageops::replace(&mut self.image, &tile, origin, 0);

        for marker in markers {
            self.draw_marker(view, marker);
            self.drawn.push((view, marker.clone()));
        }
        Ok(())
    }

    fn present(&mut self) -> RenderResult<()> {
        self.presented += 1;
        if self.quit_after.is_some_and(|n| self.presented >= n) {
            self.quit_requested = true;
        }
        log::trace!("presented frame {}", self.presented);
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        self.quit_requested
    }
}
