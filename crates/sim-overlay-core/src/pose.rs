//! World-space placement of cameras and actors.
//!
//! Poses follow the simulator's left-handed convention: x forward, y right,
//! z up, with rotations given in degrees.

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Orientation as pitch, yaw and roll in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotation {
    /// Rotation about the right axis. Negative values look down.
    pub pitch: f32,
    /// Rotation about the up axis.
    pub yaw: f32,
    /// Rotation about the forward axis.
    pub roll: f32,
}

impl Rotation {
    /// Creates a rotation from pitch, yaw and roll in degrees.
    #[must_use]
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Creates a rotation with only a pitch component.
    #[must_use]
    pub fn from_pitch(pitch: f32) -> Self {
        Self {
            pitch,
            ..Default::default()
        }
    }

    /// Returns the local-to-world rotation matrix.
    ///
    /// The columns are the forward, right and up axes expressed in world space.
    #[must_use]
    pub fn to_matrix(&self) -> Mat3 {
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        let (sr, cr) = self.roll.to_radians().sin_cos();

        Mat3::from_cols(
            Vec3::new(cp * cy, cp * sy, sp),
            Vec3::new(cy * sp * sr - sy * cr, sy * sp * sr + cy * cr, -cp * sr),
            Vec3::new(-cy * sp * cr - sy * sr, -sy * sp * cr + cy * sr, cp * cr),
        )
    }

    /// Returns the unit forward vector in world space.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.to_matrix().x_axis
    }
}

/// A position plus orientation in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    /// Location in world space (metres).
    pub location: Vec3,
    /// Orientation.
    pub rotation: Rotation,
}

impl Pose {
    /// Creates a new pose.
    #[must_use]
    pub fn new(location: Vec3, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    /// Creates a pose at a location with zero rotation.
    #[must_use]
    pub fn from_location(location: Vec3) -> Self {
        Self {
            location,
            ..Default::default()
        }
    }

    /// Returns the local-to-world transform.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        let r = self.rotation.to_matrix();
        Mat4::from_cols(
            r.x_axis.extend(0.0),
            r.y_axis.extend(0.0),
            r.z_axis.extend(0.0),
            self.location.extend(1.0),
        )
    }

    /// Returns the world-to-local transform.
    ///
    /// Computed as the rigid inverse (transposed rotation, rotated negated
    /// translation) rather than a general 4x4 inverse.
    #[must_use]
    pub fn inverse_matrix(&self) -> Mat4 {
        let rt = self.rotation.to_matrix().transpose();
        let translation = -(rt * self.location);
        Mat4::from_cols(
            rt.x_axis.extend(0.0),
            rt.y_axis.extend(0.0),
            rt.z_axis.extend(0.0),
            translation.extend(1.0),
        )
    }

    /// Maps a point given in this pose's local frame into world space.
    #[must_use]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.to_matrix().transform_point3(local)
    }

    /// Returns true if every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.location.is_finite()
            && self.rotation.pitch.is_finite()
            && self.rotation.yaw.is_finite()
            && self.rotation.roll.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rotation() {
        let m = Rotation::default().to_matrix();
        assert!((m.x_axis - Vec3::X).length() < 1e-6);
        assert!((m.y_axis - Vec3::Y).length() < 1e-6);
        assert!((m.z_axis - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_pitch_down_looks_at_ground() {
        let r = Rotation::from_pitch(-90.0);
        assert!((r.forward() - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_yaw_turns_right() {
        let r = Rotation::new(0.0, 90.0, 0.0);
        assert!((r.forward() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_inverse_matrix() {
        let pose = Pose::new(
            Vec3::new(12.0, -4.0, 3.5),
            Rotation::new(-15.0, 37.0, 5.0),
        );
        let round_trip = pose.inverse_matrix() * pose.to_matrix();
        assert!(round_trip.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn test_transform_point() {
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Rotation::new(0.0, 90.0, 0.0));
        let world = pose.transform_point(Vec3::new(2.0, 0.0, 0.0));
        assert!((world - Vec3::new(1.0, 4.0, 3.0)).length() < 1e-5);
    }
}
