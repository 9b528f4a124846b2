//! Core abstractions for sim-overlay.
//!
//! This crate provides the numerical and data types behind the scene overlay:
//! - [`CameraModel`] and [`Intrinsic`] for the pinhole camera
//! - [`project`] for mapping world points into a camera's image plane
//! - [`JunctionAggregator`] for deriving stable junction landmarks from road topology
//! - [`SensorFrameBuffer`] for handing asynchronously delivered frames to the render loop
//! - [`ControlWindow`] and [`ScenarioClock`] for the per-tick scenario rules
//! - [`ScenarioOptions`] for scenario configuration

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Pixel coordinates are rounded from f32 on purpose
#![allow(clippy::cast_possible_truncation)]

pub mod camera;
pub mod clock;
pub mod control;
pub mod error;
pub mod frame;
pub mod junction;
pub mod options;
pub mod pose;
pub mod projection;

pub use camera::{CameraModel, Intrinsic};
pub use clock::ScenarioClock;
pub use control::{ControlTarget, ControlWindow, VehicleControl};
pub use error::{OverlayError, Result};
pub use frame::{Frame, SensorFrameBuffer};
pub use junction::{Junction, JunctionAggregator, JunctionId, TopologySegment, Waypoint};
pub use options::{
    parse_resolution, CameraMount, CameraRig, ConnectionOptions, FollowOptions, ScenarioOptions,
    SteppingMode,
};
pub use pose::{Pose, Rotation};
pub use projection::{project, ProjectedPoint};

// Re-export glam types for convenience
pub use glam::{IVec2, Mat3, Mat4, Vec3};
