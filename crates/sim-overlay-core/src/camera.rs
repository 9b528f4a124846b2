//! Pinhole camera model (intrinsics plus a tracked world pose).

use glam::{Mat3, Vec3};

use crate::error::{OverlayError, Result};
use crate::pose::Pose;
use crate::projection::{project, ProjectedPoint};

/// Pinhole camera intrinsics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsic {
    /// Focal length along x, in pixels.
    pub focal_x: f32,
    /// Focal length along y, in pixels.
    pub focal_y: f32,
    /// Principal point x, in pixels.
    pub principal_x: f32,
    /// Principal point y, in pixels.
    pub principal_y: f32,
}

impl Intrinsic {
    /// Builds the intrinsics for a sensor of the given resolution and
    /// horizontal field of view.
    ///
    /// `focal = width / (2 * tan(fov / 2))` for both axes and the principal
    /// point sits at the image centre.
    pub fn build(width: u32, height: u32, fov_degrees: f32) -> Result<Self> {
        if width == 0
            || height == 0
            || !fov_degrees.is_finite()
            || fov_degrees <= 0.0
            || fov_degrees >= 180.0
        {
            return Err(OverlayError::InvalidCamera {
                width,
                height,
                fov_degrees,
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (width as f32, height as f32);
        let focal = w / (2.0 * (fov_degrees.to_radians() / 2.0).tan());

        Ok(Self {
            focal_x: focal,
            focal_y: focal,
            principal_x: w / 2.0,
            principal_y: h / 2.0,
        })
    }

    /// Returns the 3x3 intrinsic matrix `K`.
    #[must_use]
    pub fn to_matrix(&self) -> Mat3 {
        Mat3::from_cols(
            Vec3::new(self.focal_x, 0.0, 0.0),
            Vec3::new(0.0, self.focal_y, 0.0),
            Vec3::new(self.principal_x, self.principal_y, 1.0),
        )
    }
}

/// A camera sensor: resolution, field of view, derived intrinsics, and its
/// current world pose.
#[derive(Debug, Clone)]
pub struct CameraModel {
    width: u32,
    height: u32,
    fov_degrees: f32,
    intrinsic: Intrinsic,
    pose: Pose,
}

impl CameraModel {
    /// Creates a camera model at the identity pose.
    pub fn new(width: u32, height: u32, fov_degrees: f32) -> Result<Self> {
        let intrinsic = Intrinsic::build(width, height, fov_degrees)?;
        Ok(Self {
            width,
            height,
            fov_degrees,
            intrinsic,
            pose: Pose::default(),
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Horizontal field of view in degrees.
    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    /// Returns the intrinsics.
    pub fn intrinsic(&self) -> &Intrinsic {
        &self.intrinsic
    }

    /// Changes the field of view, recomputing the intrinsics.
    pub fn set_fov(&mut self, fov_degrees: f32) -> Result<()> {
        self.intrinsic = Intrinsic::build(self.width, self.height, fov_degrees)?;
        self.fov_degrees = fov_degrees;
        Ok(())
    }

    /// Returns the current world pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Sets the current world pose.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Projects a world point through this camera.
    pub fn project(&self, world_point: Vec3) -> ProjectedPoint {
        project(world_point, &self.pose, &self.intrinsic)
    }

    /// Projects a world point and keeps it only if it lands inside the image.
    pub fn project_visible(&self, world_point: Vec3) -> Option<glam::IVec2> {
        self.project(world_point).within(self.width, self.height)
    }
}
