//! Configuration options for an overlay scenario.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::camera::Intrinsic;
use crate::control::{ControlTarget, ControlWindow};
use crate::error::{OverlayError, Result};
use crate::pose::{Pose, Rotation};

/// Where to reach the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Simulator host address.
    pub host: String,
    /// Simulator RPC port.
    pub port: u16,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 2000,
        }
    }
}

/// How the simulation advances each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SteppingMode {
    /// Synchronous mode: the loop commands one fixed step per iteration.
    FixedStep {
        /// Simulated seconds per step.
        delta_seconds: f64,
    },
    /// The simulator runs on its own clock; the loop waits for each tick.
    Asynchronous,
}

impl Default for SteppingMode {
    fn default() -> Self {
        SteppingMode::FixedStep {
            delta_seconds: 0.05,
        }
    }
}

/// Height and pitch held by a camera following the ego actor from above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowOptions {
    /// Camera height above the world origin, in metres.
    pub height: f32,
    /// Camera pitch in degrees (-90 looks straight down).
    pub pitch: f32,
}

impl Default for FollowOptions {
    fn default() -> Self {
        Self {
            height: 90.0,
            pitch: -90.0,
        }
    }
}

impl FollowOptions {
    /// Camera pose above `target`: same x/y, fixed height and pitch, no yaw.
    #[must_use]
    pub fn pose_above(&self, target: glam::Vec3) -> Pose {
        Pose::new(
            glam::Vec3::new(target.x, target.y, self.height),
            Rotation::from_pitch(self.pitch),
        )
    }
}

/// How a camera is placed in the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraMount {
    /// Tracks the ego actor horizontally using [`FollowOptions`].
    Follow,
    /// Rigidly attached to the ego actor at a local offset.
    Attached {
        /// Offset in the ego actor's frame.
        offset: Pose,
    },
    /// Static camera at a world pose.
    Fixed {
        /// World pose.
        pose: Pose,
    },
}

/// One camera of the scenario and the viewport it renders into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    /// Display name, used in logs.
    pub name: String,
    /// Placement.
    pub mount: CameraMount,
    /// Field of view override; the scenario's default is used otherwise.
    #[serde(default)]
    pub fov_degrees: Option<f32>,
}

impl CameraRig {
    /// The top-down camera following the ego actor.
    #[must_use]
    pub fn drone() -> Self {
        Self {
            name: "drone".to_string(),
            mount: CameraMount::Follow,
            fov_degrees: None,
        }
    }

    /// A chase camera behind and above the ego actor.
    #[must_use]
    pub fn chase() -> Self {
        Self {
            name: "ego".to_string(),
            mount: CameraMount::Attached {
                offset: Pose::new(glam::Vec3::new(-6.0, 0.0, 2.4), Rotation::from_pitch(-15.0)),
            },
            fov_degrees: None,
        }
    }
}

/// Options for one overlay scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOptions {
    /// Simulator connection.
    pub connection: ConnectionOptions,

    /// Width of each camera image, in pixels.
    pub width: u32,

    /// Height of each camera image, in pixels.
    pub height: u32,

    /// Default horizontal field of view for cameras, in degrees.
    pub fov_degrees: f32,

    /// Stepping mode.
    pub stepping: SteppingMode,

    /// Scenario length in simulated seconds.
    pub total_duration: f64,

    /// Windowed brake/throttle rule, if any.
    pub control: Option<ControlWindow>,

    /// Actors that receive the control rule.
    pub control_targets: BTreeSet<ControlTarget>,

    /// Parameters for [`CameraMount::Follow`] cameras.
    pub follow: FollowOptions,

    /// Cameras, one viewport each, laid out left to right.
    pub cameras: Vec<CameraRig>,

    /// Metres added to each junction centroid's height before projection.
    pub landmark_lift: f32,

    /// Blueprint used for the ego actor.
    pub ego_blueprint: String,

    /// Blueprint used for NPCs.
    pub npc_blueprint: String,

    /// Number of NPCs to spawn.
    pub npc_count: usize,

    /// Whether NPC locations are projected alongside the landmarks.
    pub track_npcs: bool,

    /// Seconds of ego trajectory drawn as a trail; 0 disables the trail.
    pub trail_seconds: f64,

    /// Whether the map's spawn points are drawn, labelled by index.
    pub show_spawn_points: bool,

    /// Metres added to each spawn point's height before projection.
    pub spawn_point_lift: f32,

    /// Maximum number of spawn points tried per actor.
    pub spawn_tries: usize,

    /// Seed for shuffling spawn points; random when unset.
    pub seed: Option<u64>,

    /// Where to write the ego motion log at teardown.
    pub motion_log: Option<PathBuf>,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            connection: ConnectionOptions::default(),
            width: 1280,
            height: 720,
            fov_degrees: 90.0,
            stepping: SteppingMode::default(),
            total_duration: 45.0,
            control: None,
            control_targets: BTreeSet::new(),
            follow: FollowOptions::default(),
            cameras: vec![CameraRig::drone()],
            landmark_lift: 1.0,
            ego_blueprint: "vehicle.tesla.model3".to_string(),
            npc_blueprint: "vehicle.audi.a2".to_string(),
            npc_count: 0,
            track_npcs: false,
            trail_seconds: 0.0,
            show_spawn_points: false,
            spawn_point_lift: 3.0,
            spawn_tries: 40,
            seed: None,
            motion_log: None,
        }
    }
}

impl ScenarioOptions {
    /// Parses options from a JSON string. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Loads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Sets the resolution from a `WxH` string.
    pub fn with_resolution(mut self, res: &str) -> Result<Self> {
        let (width, height) = parse_resolution(res)?;
        self.width = width;
        self.height = height;
        Ok(self)
    }

    /// Field of view for a given rig.
    pub fn fov_for(&self, rig: &CameraRig) -> f32 {
        rig.fov_degrees.unwrap_or(self.fov_degrees)
    }

    /// Checks that the options describe a runnable scenario.
    pub fn validate(&self) -> Result<()> {
        if self.cameras.is_empty() {
            return Err(OverlayError::InvalidOptions(
                "at least one camera is required".to_string(),
            ));
        }
        for rig in &self.cameras {
            Intrinsic::build(self.width, self.height, self.fov_for(rig))?;
        }
        if !(self.total_duration.is_finite() && self.total_duration > 0.0) {
            return Err(OverlayError::InvalidOptions(format!(
                "total_duration must be positive, got {}",
                self.total_duration
            )));
        }
        if let SteppingMode::FixedStep { delta_seconds } = self.stepping {
            if !(delta_seconds.is_finite() && delta_seconds > 0.0) {
                return Err(OverlayError::InvalidOptions(format!(
                    "fixed step must be positive, got {delta_seconds}"
                )));
            }
        }
        if let Some(window) = &self.control {
            if window.red_end < window.red_start {
                return Err(OverlayError::InvalidOptions(format!(
                    "control window ends ({}) before it starts ({})",
                    window.red_end, window.red_start
                )));
            }
        }
        if !(self.trail_seconds.is_finite() && self.trail_seconds >= 0.0) {
            return Err(OverlayError::InvalidOptions(format!(
                "trail_seconds must be zero or positive, got {}",
                self.trail_seconds
            )));
        }
        if self.spawn_tries == 0 {
            return Err(OverlayError::InvalidOptions(
                "spawn_tries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses a resolution of the form `1280x720`.
pub fn parse_resolution(res: &str) -> Result<(u32, u32)> {
    let invalid = || OverlayError::InvalidResolution(res.to_string());
    let (w, h) = res.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}
