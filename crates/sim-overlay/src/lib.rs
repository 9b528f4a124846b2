//! sim-overlay: real-time scene overlay for a stepped driving simulator.
//!
//! The scene loop spawns an ego vehicle (and optionally NPC traffic), mounts
//! one or more RGB cameras, and on every simulation step projects road
//! junction landmarks into each camera's image and draws them over the latest
//! sensor frame.
//!
//! # Quick Start
//!
//! ```no_run
//! use sim_overlay::*;
//!
//! fn run<S: Simulator>(sim: S) -> Result<()> {
//!     let options = ScenarioOptions::default().with_resolution("1280x720")?;
//!     let canvas = ImageCanvas::new(options.cameras.len(), options.width, options.height);
//!
//!     let report = run_scenario(sim, canvas, options)?;
//!     println!("{} iterations, {:.1}s", report.iterations, report.elapsed);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`Simulator`] is the seam to the driving simulator.
//! - [`OverlayRenderer`] is the seam to the display.
//! - [`SceneLoop`] owns both and walks `Initializing -> Running ->
//!   Terminating -> Stopped`, releasing every created resource through a
//!   [`ResourceLedger`] on the way out.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Type names such as SceneLoop and SceneError repeat their module name
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod ledger;
pub mod motion_log;
pub mod scene;
pub mod simulator;
pub mod spawn;

pub use error::{Result, SceneError, SimError, SimResult};
pub use ledger::{ReleaseSummary, ResourceLedger};
pub use motion_log::{MotionLog, MotionSample, MOTION_LOG_HEADER};
pub use scene::{Landmark, ScenarioReport, SceneLoop, ScenePhase, SceneView, Termination};
pub use simulator::{ActorId, CameraSpec, Simulator, WorldSettings};
pub use spawn::spawn_with_retry;

// Re-export core types
pub use sim_overlay_core::{
    parse_resolution, project, CameraModel, CameraMount, CameraRig, ConnectionOptions,
    ControlTarget, ControlWindow, FollowOptions, Frame, Intrinsic, Junction, JunctionAggregator,
    JunctionId, OverlayError, Pose, ProjectedPoint, Rotation, ScenarioClock, ScenarioOptions,
    SensorFrameBuffer, SteppingMode, TopologySegment, VehicleControl, Waypoint,
};
pub use sim_overlay_core::{IVec2, Mat3, Mat4, Vec3};

// Re-export render types
pub use sim_overlay_render::{
    ImageCanvas, Marker, MarkerKind, OverlayRenderer, RenderError, RenderResult,
};

/// Runs one scenario to completion.
///
/// Initializes logging (if nothing else has), drives a [`SceneLoop`] until the
/// duration elapses, the renderer asks to quit, or an error occurs, and
/// releases everything it created before returning.
pub fn run_scenario<S, R>(sim: S, renderer: R, options: ScenarioOptions) -> Result<ScenarioReport>
where
    S: Simulator,
    R: OverlayRenderer,
{
    let _ = env_logger::try_init();
    log::info!(
        "starting scenario: {}x{}, {} cameras, {}s",
        options.width,
        options.height,
        options.cameras.len(),
        options.total_duration
    );

    let mut scene = SceneLoop::new(sim, renderer, options);
    scene.run()
}
