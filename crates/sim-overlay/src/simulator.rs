//! The simulator seam.
//!
//! Everything the scene loop needs from the driving simulator goes through
//! [`Simulator`]. Implementations wrap a real client connection; tests use a
//! scripted world.

use std::fmt;

use glam::Vec3;
use sim_overlay_core::{Pose, SensorFrameBuffer, TopologySegment, VehicleControl};

use crate::error::SimResult;

/// Identifier of an actor (vehicle or sensor) in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Simulator-wide settings that a scenario may override.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldSettings {
    /// Whether the world only advances when the client ticks it.
    pub synchronous_mode: bool,
    /// Simulated seconds per tick, or `None` for variable time steps.
    pub fixed_delta_seconds: Option<f64>,
}

/// Attributes of an RGB camera sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSpec {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Horizontal field of view in degrees.
    pub fov_degrees: f32,
}

/// Client-side view of a running simulation.
///
/// All calls are made from the scene loop's thread. Sensor frames are the
/// exception: the simulator publishes them into the [`SensorFrameBuffer`]
/// handed to [`spawn_camera`](Self::spawn_camera) from its own context.
pub trait Simulator {
    /// Reads the current world settings.
    fn settings(&self) -> SimResult<WorldSettings>;

    /// Applies world settings.
    fn apply_settings(&mut self, settings: &WorldSettings) -> SimResult<()>;

    /// Advances the world by one fixed step (synchronous mode) and returns
    /// the simulated seconds since session start of the resulting snapshot.
    fn tick(&mut self) -> SimResult<f64>;

    /// Blocks until the simulator's next tick (asynchronous mode) and returns
    /// the simulated seconds since session start of that tick's snapshot.
    ///
    /// The returned time must belong to the tick that was waited on, not to
    /// whatever tick is current when the caller looks again.
    fn wait_for_tick(&mut self) -> SimResult<f64>;

    /// Lane topology of the loaded map.
    fn topology(&self) -> SimResult<Vec<TopologySegment>>;

    /// Recommended spawn points of the loaded map.
    fn spawn_points(&self) -> SimResult<Vec<Pose>>;

    /// Tries to spawn a vehicle. Returns `Ok(None)` if the spot is occupied.
    fn try_spawn_vehicle(&mut self, blueprint: &str, pose: &Pose) -> SimResult<Option<ActorId>>;

    /// Spawns an RGB camera, optionally attached to `parent` (in which case
    /// `pose` is relative to the parent), and starts delivering frames into
    /// `sink`.
    fn spawn_camera(
        &mut self,
        spec: &CameraSpec,
        pose: &Pose,
        parent: Option<ActorId>,
        sink: SensorFrameBuffer,
    ) -> SimResult<ActorId>;

    /// Current world pose of an actor.
    fn actor_pose(&self, actor: ActorId) -> SimResult<Pose>;

    /// Current world velocity of an actor, in m/s.
    fn actor_velocity(&self, actor: ActorId) -> SimResult<Vec3>;

    /// Teleports an actor.
    fn set_actor_pose(&mut self, actor: ActorId, pose: &Pose) -> SimResult<()>;

    /// Hands a vehicle to (or takes it back from) the traffic manager.
    fn set_autopilot(&mut self, actor: ActorId, enabled: bool) -> SimResult<()>;

    /// Applies manual control to a vehicle for the next step.
    fn apply_control(&mut self, actor: ActorId, control: &VehicleControl) -> SimResult<()>;

    /// Stops a sensor's frame delivery.
    fn stop_sensor(&mut self, sensor: ActorId) -> SimResult<()>;

    /// Destroys an actor.
    fn destroy_actor(&mut self, actor: ActorId) -> SimResult<()>;

    /// Returns true while the actor exists.
    fn is_alive(&self, actor: ActorId) -> bool;
}
