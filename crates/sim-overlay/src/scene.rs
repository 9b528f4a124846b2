//! The scene loop: stepping, camera follow, projection, drawing, teardown.

use std::collections::VecDeque;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sim_overlay_core::{
    CameraModel, CameraMount, CameraRig, ControlTarget, JunctionAggregator, JunctionId,
    ScenarioClock, ScenarioOptions, SensorFrameBuffer, SteppingMode,
};
use sim_overlay_render::{Marker, MarkerKind, OverlayRenderer};

use crate::error::{Result, SceneError, SimError, SimResult};
use crate::ledger::ResourceLedger;
use crate::motion_log::MotionLog;
use crate::simulator::{ActorId, CameraSpec, Simulator, WorldSettings};
use crate::spawn::spawn_with_retry;

/// Lifecycle phase of a [`SceneLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePhase {
    /// Options checked, nothing created yet (or setup in progress).
    Initializing,
    /// Iterating.
    Running,
    /// A stop condition was hit; resources are about to be released.
    Terminating,
    /// Everything has been released. Terminal.
    Stopped,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Scenario time reached `total_duration`.
    DurationElapsed,
    /// The renderer reported a quit request.
    QuitRequested,
    /// Setup or an iteration failed.
    Fault,
}

/// Summary returned by [`SceneLoop::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioReport {
    /// Completed Running iterations.
    pub iterations: u64,
    /// Scenario time at the last iteration, in seconds.
    pub elapsed: f64,
    /// Why the loop stopped.
    pub termination: Termination,
    /// Number of junction landmarks.
    pub landmarks: usize,
    /// Number of NPCs that were actually spawned.
    pub npcs: usize,
}

/// A junction landmark ready for projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    /// Junction identity.
    pub id: JunctionId,
    /// Centroid raised by the configured lift.
    pub position: Vec3,
}

/// One camera with its model, sensor and frame buffer.
#[derive(Debug)]
pub struct SceneView {
    /// Configuration of the camera.
    pub rig: CameraRig,
    /// Simulator id of the camera sensor.
    pub sensor: ActorId,
    /// Projection model; its pose is refreshed every tick.
    pub camera: CameraModel,
    /// Latest delivered frame.
    pub buffer: SensorFrameBuffer,
}

/// A world point tracked on the overlay this tick.
struct TrackedPoint {
    position: Vec3,
    label: String,
    kind: MarkerKind,
}

/// Drives one overlay scenario.
///
/// Create it with [`SceneLoop::new`] and call [`run`](Self::run), or drive it
/// manually with [`setup`](Self::setup), [`step`](Self::step) and
/// [`teardown`](Self::teardown). Teardown also runs on drop.
pub struct SceneLoop<S: Simulator, R: OverlayRenderer> {
    sim: S,
    renderer: R,
    options: ScenarioOptions,
    phase: ScenePhase,
    termination: Option<Termination>,
    clock: ScenarioClock,
    landmarks: Vec<Landmark>,
    spawn_markers: Vec<Vec3>,
    trail: VecDeque<(f64, Vec3)>,
    views: Vec<SceneView>,
    ego: Option<ActorId>,
    npcs: Vec<ActorId>,
    ledger: ResourceLedger,
    motion: Option<MotionLog>,
    iterations: u64,
}

impl<S: Simulator, R: OverlayRenderer> SceneLoop<S, R> {
    /// Creates a loop in the `Initializing` phase. Nothing is touched in the
    /// simulator until [`setup`](Self::setup).
    pub fn new(sim: S, renderer: R, options: ScenarioOptions) -> Self {
        let motion = options.motion_log.as_ref().map(|_| MotionLog::new());
        Self {
            sim,
            renderer,
            options,
            phase: ScenePhase::Initializing,
            termination: None,
            clock: ScenarioClock::new(),
            landmarks: Vec::new(),
            spawn_markers: Vec::new(),
            trail: VecDeque::new(),
            views: Vec::new(),
            ego: None,
            npcs: Vec::new(),
            ledger: ResourceLedger::new(),
            motion,
            iterations: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    /// Why the loop stopped, once it has.
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Scenario time at the last iteration.
    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    /// Completed Running iterations.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Junction landmarks, in overlay label order.
    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Raised spawn-point positions shown on the overlay, labelled by index.
    pub fn spawn_markers(&self) -> &[Vec3] {
        &self.spawn_markers
    }

    /// Recent ego positions, oldest first.
    pub fn trail(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.trail.iter().map(|&(_, position)| position)
    }

    /// Camera views, in viewport order.
    pub fn views(&self) -> &[SceneView] {
        &self.views
    }

    /// The tracked ego actor, once spawned.
    pub fn ego(&self) -> Option<ActorId> {
        self.ego
    }

    /// Spawned NPCs.
    pub fn npcs(&self) -> &[ActorId] {
        &self.npcs
    }

    /// The recorded motion log, if enabled.
    pub fn motion_log(&self) -> Option<&MotionLog> {
        self.motion.as_ref()
    }

    pub fn simulator(&self) -> &S {
        &self.sim
    }

    pub fn simulator_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Runs setup, iterates until a stop condition, and tears down.
    ///
    /// Teardown happens on every path, including errors.
    pub fn run(&mut self) -> Result<ScenarioReport> {
        let result = self.run_until_stopped();
        if let Err(err) = &result {
            log::error!("scenario aborted: {err}");
            self.termination.get_or_insert(Termination::Fault);
            self.phase = ScenePhase::Terminating;
        }
        self.teardown();
        result.map(|()| self.report())
    }

    fn run_until_stopped(&mut self) -> Result<()> {
        if self.phase == ScenePhase::Initializing {
            self.setup()?;
        }
        while self.step()? == ScenePhase::Running {}
        Ok(())
    }

    /// Summary of the run so far.
    pub fn report(&self) -> ScenarioReport {
        ScenarioReport {
            iterations: self.iterations,
            elapsed: self.clock.elapsed(),
            termination: self.termination.unwrap_or(Termination::Fault),
            landmarks: self.landmarks.len(),
            npcs: self.npcs.len(),
        }
    }

    /// Creates everything the scenario needs and enters `Running`.
    ///
    /// Anything created before a failure is recorded and released by
    /// [`teardown`](Self::teardown).
    pub fn setup(&mut self) -> Result<()> {
        self.options.validate()?;
        let cameras = self.options.cameras.len();
        let views = self.renderer.views();
        if views < cameras {
            return Err(SceneError::NotEnoughViews { cameras, views });
        }

        if let SteppingMode::FixedStep { delta_seconds } = self.options.stepping {
            let original = self.sim.settings()?;
            self.ledger.record_settings(original);
            self.sim.apply_settings(&WorldSettings {
                synchronous_mode: true,
                fixed_delta_seconds: Some(delta_seconds),
            })?;
            log::info!("synchronous mode enabled, fixed step {delta_seconds}s");
        }

        self.build_landmarks()?;
        self.spawn_actors()?;
        self.spawn_cameras()?;

        self.phase = ScenePhase::Running;
        log::info!(
            "scenario running: {} landmarks, {} NPCs, {} cameras",
            self.landmarks.len(),
            self.npcs.len(),
            self.views.len()
        );
        Ok(())
    }

    fn build_landmarks(&mut self) -> Result<()> {
        let topology = self.sim.topology()?;
        let lift = Vec3::new(0.0, 0.0, self.options.landmark_lift);
        self.landmarks = JunctionAggregator::from_topology(&topology)
            .into_iter()
            .map(|j| Landmark {
                id: j.id,
                position: j.centroid + lift,
            })
            .collect();

        log::info!("total junctions: {}", self.landmarks.len());
        for (i, landmark) in self.landmarks.iter().enumerate() {
            log::debug!("{i} junction {} at {}", landmark.id, landmark.position);
        }
        Ok(())
    }

    fn spawn_actors(&mut self) -> Result<()> {
        let spawn_points = self.sim.spawn_points()?;
        if self.options.show_spawn_points {
            let lift = Vec3::new(0.0, 0.0, self.options.spawn_point_lift);
            self.spawn_markers = spawn_points.iter().map(|p| p.location + lift).collect();
            log::info!("total spawn points: {}", self.spawn_markers.len());
        }
        let tries = self.options.spawn_tries;
        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let targets = &self.options.control_targets;
        let manual_ego = self.options.control.is_some() && targets.contains(&ControlTarget::Ego);
        let manual_npcs = self.options.control.is_some() && targets.contains(&ControlTarget::Npcs);

        let blueprint = self.options.ego_blueprint.clone();
        let Some((ego, _)) =
            spawn_with_retry(&mut self.sim, &blueprint, &spawn_points, tries, &mut rng)?
        else {
            return Err(SceneError::EgoSpawnFailed { tries });
        };
        self.ledger.record_actor(ego);
        self.ego = Some(ego);
        self.sim.set_autopilot(ego, !manual_ego)?;

        let blueprint = self.options.npc_blueprint.clone();
        for i in 0..self.options.npc_count {
            match spawn_with_retry(&mut self.sim, &blueprint, &spawn_points, tries, &mut rng)? {
                Some((npc, _)) => {
                    self.ledger.record_actor(npc);
                    self.npcs.push(npc);
                    self.sim.set_autopilot(npc, !manual_npcs)?;
                }
                None => log::warn!("NPC {i} could not be placed, continuing without it"),
            }
        }
        Ok(())
    }

    fn spawn_cameras(&mut self) -> Result<()> {
        let ego = self.ego.ok_or(SceneError::NotSetUp)?;
        let ego_pose = self.sim.actor_pose(ego)?;

        for rig in self.options.cameras.clone() {
            let fov = self.options.fov_for(&rig);
            let mut camera = CameraModel::new(self.options.width, self.options.height, fov)?;
            let spec = CameraSpec {
                width: self.options.width,
                height: self.options.height,
                fov_degrees: fov,
            };

            let (pose, parent) = match rig.mount {
                CameraMount::Follow => (self.options.follow.pose_above(ego_pose.location), None),
                CameraMount::Attached { offset } => (offset, Some(ego)),
                CameraMount::Fixed { pose } => (pose, None),
            };

            let buffer = SensorFrameBuffer::new();
            let sensor = self.sim.spawn_camera(&spec, &pose, parent, buffer.clone())?;
            self.ledger.record_sensor(sensor, buffer.clone());

            camera.set_pose(match parent {
                Some(_) => self.sim.actor_pose(sensor)?,
                None => pose,
            });
            log::info!("camera '{}' spawned as {sensor}", rig.name);

            self.views.push(SceneView {
                rig,
                sensor,
                camera,
                buffer,
            });
        }
        Ok(())
    }

    /// Runs one iteration and returns the phase afterwards.
    ///
    /// Does nothing outside `Running`.
    pub fn step(&mut self) -> Result<ScenePhase> {
        if self.phase != ScenePhase::Running {
            return Ok(self.phase);
        }

        if self.renderer.poll_quit() {
            log::info!("quit requested");
            self.enter_terminating(Termination::QuitRequested);
            return Ok(self.phase);
        }

        let ego = self.ego.ok_or(SceneError::NotSetUp)?;

        // The clock is fed the acknowledged snapshot time, never a later query.
        let snapshot_seconds = match self.options.stepping {
            SteppingMode::FixedStep { .. } => self.sim.tick()?,
            SteppingMode::Asynchronous => self.sim.wait_for_tick()?,
        };
        let elapsed = self.clock.observe(snapshot_seconds);
        self.apply_control(elapsed)?;

        let ego_pose = self.sim.actor_pose(ego)?;
        if let Some(motion) = self.motion.as_mut() {
            motion.record(elapsed, &ego_pose, self.sim.actor_velocity(ego)?);
        }
        self.record_trail(elapsed, ego_pose.location);

        self.update_camera_poses(ego_pose.location)?;
        let points = self.tracked_points()?;
        self.draw(&points)?;

        self.iterations += 1;
        log::trace!("iteration {} at {elapsed:.3}s", self.iterations);

        if elapsed >= self.options.total_duration {
            log::info!("scenario finished after {elapsed:.3}s");
            self.enter_terminating(Termination::DurationElapsed);
        }
        Ok(self.phase)
    }

    fn apply_control(&mut self, elapsed: f64) -> Result<()> {
        let Some(window) = self.options.control else {
            return Ok(());
        };
        let control = window.command(elapsed);

        let targets = &self.options.control_targets;
        let mut actors = Vec::new();
        if targets.contains(&ControlTarget::Ego) {
            actors.extend(self.ego);
        }
        if targets.contains(&ControlTarget::Npcs) {
            actors.extend(self.npcs.iter().copied());
        }

        for actor in actors {
            if !self.sim.is_alive(actor) {
                log::debug!("skipping control for {actor}: no longer in the world");
                continue;
            }
            skip_missing(actor, self.sim.apply_control(actor, &control))?;
        }
        Ok(())
    }

    fn record_trail(&mut self, elapsed: f64, position: Vec3) {
        let window = self.options.trail_seconds;
        if window <= 0.0 {
            return;
        }
        self.trail.push_back((elapsed, position));
        while self
            .trail
            .front()
            .is_some_and(|&(time, _)| elapsed - time > window)
        {
            self.trail.pop_front();
        }
    }

    fn update_camera_poses(&mut self, target: Vec3) -> Result<()> {
        for view in &mut self.views {
            match view.rig.mount {
                CameraMount::Follow => {
                    let pose = self.options.follow.pose_above(target);
                    self.sim.set_actor_pose(view.sensor, &pose)?;
                    view.camera.set_pose(pose);
                }
                CameraMount::Attached { .. } => {
                    view.camera.set_pose(self.sim.actor_pose(view.sensor)?);
                }
                CameraMount::Fixed { .. } => {}
            }
        }
        Ok(())
    }

    fn tracked_points(&self) -> Result<Vec<TrackedPoint>> {
        let mut points: Vec<TrackedPoint> = self
            .landmarks
            .iter()
            .enumerate()
            .map(|(i, landmark)| TrackedPoint {
                position: landmark.position,
                label: i.to_string(),
                kind: MarkerKind::Landmark,
            })
            .collect();

        points.extend(
            self.spawn_markers
                .iter()
                .enumerate()
                .map(|(i, &position)| TrackedPoint {
                    position,
                    label: format!("sp{i}"),
                    kind: MarkerKind::SpawnPoint,
                }),
        );

        points.extend(self.trail.iter().map(|&(_, position)| TrackedPoint {
            position,
            label: String::new(),
            kind: MarkerKind::Trail,
        }));

        if self.options.track_npcs {
            for (i, &npc) in self.npcs.iter().enumerate() {
                if !self.sim.is_alive(npc) {
                    continue;
                }
                let Some(pose) = skip_missing(npc, self.sim.actor_pose(npc))? else {
                    continue;
                };
                points.push(TrackedPoint {
                    position: pose.location,
                    label: format!("npc{i}"),
                    kind: MarkerKind::Actor,
                });
            }
        }
        Ok(points)
    }

    fn draw(&mut self, points: &[TrackedPoint]) -> Result<()> {
        self.renderer.begin_frame()?;
        for (i, view) in self.views.iter().enumerate() {
            let markers: Vec<Marker> = points
                .iter()
                .filter_map(|p| {
                    view.camera
                        .project_visible(p.position)
                        .map(|pixel| Marker::new(pixel, p.label.clone(), p.kind))
                })
                .collect();
            let frame = view.buffer.read();
            self.renderer.draw_view(i, frame.as_deref(), &markers)?;
        }
        self.renderer.present()?;
        Ok(())
    }

    fn enter_terminating(&mut self, reason: Termination) {
        self.termination = Some(reason);
        self.phase = ScenePhase::Terminating;
    }

    /// Stops sensors, destroys actors, restores world settings, and writes
    /// the motion log. Safe to call at any time and any number of times.
    pub fn teardown(&mut self) {
        if self.phase == ScenePhase::Stopped {
            return;
        }
        if self.phase != ScenePhase::Terminating {
            self.termination.get_or_insert(Termination::Fault);
        }

        self.ledger.release(&mut self.sim);

        if let (Some(motion), Some(path)) = (self.motion.as_ref(), self.options.motion_log.as_ref())
        {
            if let Err(err) = motion.save(path) {
                log::warn!("failed to write motion log {}: {err}", path.display());
            }
        }

        self.phase = ScenePhase::Stopped;
        log::info!("scenario stopped ({:?})", self.termination);
    }
}

/// Turns "actor no longer exists" into `None` with a warning; every other
/// simulator error is returned.
fn skip_missing<T>(actor: ActorId, result: SimResult<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(SimError::UnknownActor(_)) => {
            log::warn!("actor {actor} vanished, dropping it from this tick");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

impl<S: Simulator, R: OverlayRenderer> Drop for SceneLoop<S, R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
