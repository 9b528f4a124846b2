//! World-to-image projection.
//!
//! Points are moved into the camera's local frame with the inverse of the
//! camera pose, then re-expressed in the pinhole frame used by the
//! intrinsics:
//!
//! | pinhole axis | simulator axis |
//! |--------------|----------------|
//! | right (u)    | +y             |
//! | down (v)     | -z             |
//! | forward (depth) | +x          |
//!
//! Swapping a sign here mirrors or flips the whole overlay.

use glam::{IVec2, Vec3};

use crate::camera::Intrinsic;
use crate::pose::Pose;

/// Result of projecting a world point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectedPoint {
    /// Pixel coordinate, not yet checked against the viewport.
    Pixel(IVec2),
    /// The point is on or behind the image plane, or the projection is not finite.
    Invalid,
}

impl ProjectedPoint {
    /// Returns the pixel if the projection is valid.
    #[must_use]
    pub fn pixel(self) -> Option<IVec2> {
        match self {
            ProjectedPoint::Pixel(p) => Some(p),
            ProjectedPoint::Invalid => None,
        }
    }

    /// Returns true for a valid projection.
    #[must_use]
    pub fn is_valid(self) -> bool {
        matches!(self, ProjectedPoint::Pixel(_))
    }

    /// Returns the pixel if it is valid and lies in `[0, width) x [0, height)`.
    #[must_use]
    pub fn within(self, width: u32, height: u32) -> Option<IVec2> {
        let p = self.pixel()?;
        let inside = p.x >= 0
            && p.y >= 0
            && i64::from(p.x) < i64::from(width)
            && i64::from(p.y) < i64::from(height);
        inside.then_some(p)
    }
}

/// Converts a camera-local vector (simulator axes) into the pinhole frame.
#[inline]
fn to_pinhole(local: Vec3) -> Vec3 {
    Vec3::new(local.y, -local.z, local.x)
}

/// Projects `world_point` into the image of a camera at `camera_pose`.
///
/// Returns [`ProjectedPoint::Invalid`] when the point's forward component is
/// not strictly positive. Pixels are rounded to the nearest integer.
#[must_use]
pub fn project(world_point: Vec3, camera_pose: &Pose, intrinsic: &Intrinsic) -> ProjectedPoint {
    let local = camera_pose.inverse_matrix().transform_point3(world_point);
    let cam = to_pinhole(local);

    if cam.z.is_nan() || cam.z <= 0.0 {
        return ProjectedPoint::Invalid;
    }

    let img = intrinsic.to_matrix() * cam;
    let u = (img.x / img.z).round();
    let v = (img.y / img.z).round();

    // Anything beyond i32 range would saturate into a wrong pixel.
    #[allow(clippy::cast_precision_loss)]
    let limit = i32::MAX as f32;
    if !u.is_finite() || !v.is_finite() || u.abs() >= limit || v.abs() >= limit {
        return ProjectedPoint::Invalid;
    }

    ProjectedPoint::Pixel(IVec2::new(u as i32, v as i32))
}
