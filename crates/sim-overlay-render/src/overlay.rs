//! The seam between the scene loop and whatever draws the overlay.

use glam::IVec2;
use sim_overlay_core::Frame;

use crate::error::RenderResult;

/// What a marker annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// A junction landmark.
    Landmark,
    /// A tracked actor.
    Actor,
    /// A map spawn point.
    SpawnPoint,
    /// A past position of the ego actor.
    Trail,
}

impl MarkerKind {
    /// RGBA color used for this kind of marker.
    #[must_use]
    pub fn color(self) -> [u8; 4] {
        match self {
            MarkerKind::Landmark => [200, 0, 0, 255],
            MarkerKind::Actor => [0, 200, 255, 255],
            MarkerKind::SpawnPoint => [0, 0, 255, 255],
            MarkerKind::Trail => [255, 0, 0, 255],
        }
    }

    /// Whether this kind is drawn as a small dot instead of a full marker.
    #[must_use]
    pub fn is_dot(self) -> bool {
        matches!(self, MarkerKind::Trail)
    }
}

/// A labelled pixel to draw over a camera view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Pixel coordinate inside the view.
    pub pixel: IVec2,
    /// Text drawn at the marker.
    pub label: String,
    pub kind: MarkerKind,
}

impl Marker {
    pub fn new(pixel: IVec2, label: impl Into<String>, kind: MarkerKind) -> Self {
        Self {
            pixel,
            label: label.into(),
            kind,
        }
    }
}

/// A display surface made of side-by-side camera views.
///
/// The scene loop calls, once per iteration: [`begin_frame`](Self::begin_frame),
/// [`draw_view`](Self::draw_view) for each view, [`present`](Self::present),
/// and then [`poll_quit`](Self::poll_quit).
pub trait OverlayRenderer {
    /// Number of views this renderer lays out.
    fn views(&self) -> usize;

    /// Starts a new display frame.
    fn begin_frame(&mut self) -> RenderResult<()>;

    /// Draws one view. `frame` is `None` until the camera has delivered its
    /// first image; implementations must treat that as "nothing to show yet".
    fn draw_view(&mut self, view: usize, frame: Option<&Frame>, markers: &[Marker])
        -> RenderResult<()>;

    /// Makes the display frame visible.
    fn present(&mut self) -> RenderResult<()>;

    /// Non-blocking check for a user request to quit.
    fn poll_quit(&mut self) -> bool;
}
