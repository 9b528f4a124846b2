//! A scripted in-process simulator for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use sim_overlay::*;

/// A camera sensor's delivery state.
struct Camera {
    spec: CameraSpec,
    sink: SensorFrameBuffer,
    delivering: bool,
}

struct Actor {
    blueprint: String,
    pose: Pose,
    /// Parent actor and the pose relative to it.
    parent: Option<(ActorId, Pose)>,
    camera: Option<Camera>,
}

/// Deterministic stand-in for a driving simulator.
///
/// Time starts at 1000 s so the scene clock has to subtract an origin.
/// Cameras deliver a solid frame on every tick except the first.
pub struct ScriptedWorld {
    pub time: f64,
    pub delta: f64,
    pub settings: WorldSettings,
    pub settings_history: Vec<WorldSettings>,
    pub topology: Vec<TopologySegment>,
    pub spawn_points: Vec<Pose>,
    /// Locations already taken by something outside the scenario.
    pub blocked: Vec<Vec3>,
    /// Vehicles drive along +x at this speed (m/s).
    pub vehicle_speed: f32,
    /// Cameras with a wider field of view are rejected.
    pub max_fov: Option<f32>,
    /// Ticks after which the connection drops.
    pub disconnect_after: Option<u64>,
    /// BGRA color of delivered frames.
    pub frame_color: [u8; 4],
    /// Seconds the world runs on, once, right after the first waited-on
    /// tick (asynchronous mode only).
    pub async_drift: Option<f64>,

    pub ticks: u64,
    pub waits: u64,
    pub controls: Vec<(ActorId, VehicleControl)>,
    pub autopilot: BTreeMap<ActorId, bool>,
    /// "stop #n" / "destroy #n" in call order.
    pub events: Vec<String>,
    /// Removed actors that `is_alive` still reports, as a lagging client
    /// cache would.
    pub stale: Vec<ActorId>,

    actors: BTreeMap<ActorId, Actor>,
    next_id: u32,
}

impl Default for ScriptedWorld {
    fn default() -> Self {
        Self {
            time: 1000.0,
            delta: 0.5,
            settings: WorldSettings::default(),
            settings_history: Vec::new(),
            topology: junction_topology(),
            spawn_points: vec![Pose::from_location(Vec3::new(0.0, 0.0, 0.3))],
            blocked: Vec::new(),
            vehicle_speed: 0.0,
            max_fov: None,
            disconnect_after: None,
            frame_color: [10, 20, 30, 255],
            async_drift: None,
            ticks: 0,
            waits: 0,
            controls: Vec::new(),
            autopilot: BTreeMap::new(),
            events: Vec::new(),
            stale: Vec::new(),
            actors: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// One junction (id 7) centred on (9, 0, 0), plus a plain road segment.
pub fn junction_topology() -> Vec<TopologySegment> {
    vec![
        TopologySegment::new(
            Waypoint::road(Vec3::new(-20.0, 0.0, 0.0)),
            Waypoint::road(Vec3::new(-10.0, 0.0, 0.0)),
        ),
        TopologySegment::new(
            Waypoint::in_junction(Vec3::new(8.0, 0.0, 0.0), 7),
            Waypoint::in_junction(Vec3::new(10.0, 0.0, 0.0), 7),
        ),
    ]
}

impl ScriptedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of actors that still exist.
    pub fn live_actors(&self) -> Vec<ActorId> {
        self.actors.keys().copied().collect()
    }

    /// Ids of live actors spawned from `blueprint`.
    pub fn actors_of(&self, blueprint: &str) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|(_, a)| a.blueprint == blueprint)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Removes an actor behind the scenario's back.
    pub fn kill(&mut self, actor: ActorId) {
        self.actors.remove(&actor);
    }

    /// Removes an actor while `is_alive` keeps reporting it.
    pub fn kill_unnoticed(&mut self, actor: ActorId) {
        self.actors.remove(&actor);
        self.stale.push(actor);
    }

    fn occupied(&self, location: Vec3) -> bool {
        self.blocked.iter().any(|b| b.distance(location) < 0.5)
            || self
                .actors
                .values()
                .any(|a| a.camera.is_none() && a.pose.location.distance(location) < 0.5)
    }

    fn world_pose(&self, actor: &Actor) -> Pose {
        match actor.parent.and_then(|(p, offset)| self.actors.get(&p).map(|a| (a, offset))) {
            Some((parent, offset)) => Pose::new(
                parent.pose.transform_point(offset.location),
                Rotation::new(
                    parent.pose.rotation.pitch + offset.rotation.pitch,
                    parent.pose.rotation.yaw + offset.rotation.yaw,
                    parent.pose.rotation.roll + offset.rotation.roll,
                ),
            ),
            None => actor.pose,
        }
    }

    fn advance(&mut self) -> SimResult<()> {
        if self.disconnect_after.is_some_and(|n| self.ticks >= n) {
            return Err(SimError::Disconnected("connection reset".to_string()));
        }
        self.ticks += 1;
        self.time += self.delta;

        let step = self.vehicle_speed * self.delta as f32;
        for actor in self.actors.values_mut() {
            if actor.camera.is_none() && actor.parent.is_none() {
                actor.pose.location.x += step;
            }
        }

        if self.ticks > 1 {
            for actor in self.actors.values() {
                if let Some(camera) = actor.camera.as_ref().filter(|c| c.delivering) {
                    let frame = Frame::filled(camera.spec.width, camera.spec.height, self.frame_color)
                        .with_capture(self.ticks, self.time);
                    camera.sink.publish(frame);
                }
            }
        }
        Ok(())
    }

    fn actor(&self, actor: ActorId) -> SimResult<&Actor> {
        self.actors.get(&actor).ok_or(SimError::UnknownActor(actor))
    }

    fn spawn(&mut self, actor: Actor) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        self.actors.insert(id, actor);
        id
    }
}

impl Simulator for ScriptedWorld {
    fn settings(&self) -> SimResult<WorldSettings> {
        Ok(self.settings)
    }

    fn apply_settings(&mut self, settings: &WorldSettings) -> SimResult<()> {
        self.settings = *settings;
        self.settings_history.push(*settings);
        Ok(())
    }

    fn tick(&mut self) -> SimResult<f64> {
        self.advance()?;
        Ok(self.time)
    }

    fn wait_for_tick(&mut self) -> SimResult<f64> {
        self.waits += 1;
        self.advance()?;
        let snapshot = self.time;
        // The free-running world moves on before the client looks again.
        self.time += self.async_drift.take().unwrap_or(0.0);
        Ok(snapshot)
    }

    fn topology(&self) -> SimResult<Vec<TopologySegment>> {
        Ok(self.topology.clone())
    }

    fn spawn_points(&self) -> SimResult<Vec<Pose>> {
        Ok(self.spawn_points.clone())
    }

    fn try_spawn_vehicle(&mut self, blueprint: &str, pose: &Pose) -> SimResult<Option<ActorId>> {
        if self.occupied(pose.location) {
            return Ok(None);
        }
        Ok(Some(self.spawn(Actor {
            blueprint: blueprint.to_string(),
            pose: *pose,
            parent: None,
            camera: None,
        })))
    }

    fn spawn_camera(
        &mut self,
        spec: &CameraSpec,
        pose: &Pose,
        parent: Option<ActorId>,
        sink: SensorFrameBuffer,
    ) -> SimResult<ActorId> {
        if self.max_fov.is_some_and(|max| spec.fov_degrees > max) {
            return Err(SimError::UnsupportedAttribute {
                name: "fov".to_string(),
                value: spec.fov_degrees.to_string(),
            });
        }
        if let Some(p) = parent {
            self.actor(p)?;
        }
        Ok(self.spawn(Actor {
            blueprint: "sensor.camera.rgb".to_string(),
            pose: *pose,
            parent: parent.map(|p| (p, *pose)),
            camera: Some(Camera {
                spec: *spec,
                sink,
                delivering: true,
            }),
        }))
    }

    fn actor_pose(&self, actor: ActorId) -> SimResult<Pose> {
        Ok(self.world_pose(self.actor(actor)?))
    }

    fn actor_velocity(&self, actor: ActorId) -> SimResult<Vec3> {
        let a = self.actor(actor)?;
        if a.camera.is_some() {
            return Ok(Vec3::ZERO);
        }
        Ok(Vec3::new(self.vehicle_speed, 0.0, 0.0))
    }

    fn set_actor_pose(&mut self, actor: ActorId, pose: &Pose) -> SimResult<()> {
        let a = self.actors.get_mut(&actor).ok_or(SimError::UnknownActor(actor))?;
        a.pose = *pose;
        Ok(())
    }

    fn set_autopilot(&mut self, actor: ActorId, enabled: bool) -> SimResult<()> {
        self.actor(actor)?;
        self.autopilot.insert(actor, enabled);
        Ok(())
    }

    fn apply_control(&mut self, actor: ActorId, control: &VehicleControl) -> SimResult<()> {
        self.actor(actor)?;
        self.controls.push((actor, *control));
        Ok(())
    }

    fn stop_sensor(&mut self, sensor: ActorId) -> SimResult<()> {
        let a = self.actors.get_mut(&sensor).ok_or(SimError::UnknownActor(sensor))?;
        if let Some(camera) = a.camera.as_mut() {
            camera.delivering = false;
        }
        self.events.push(format!("stop {sensor}"));
        Ok(())
    }

    fn destroy_actor(&mut self, actor: ActorId) -> SimResult<()> {
        self.actors.remove(&actor).ok_or(SimError::UnknownActor(actor))?;
        self.events.push(format!("destroy {actor}"));
        Ok(())
    }

    fn is_alive(&self, actor: ActorId) -> bool {
        self.actors.contains_key(&actor) || self.stale.contains(&actor)
    }
}

/// Small-image options with a fixed seed, 0.5 s steps and 20 s duration.
pub fn test_options() -> ScenarioOptions {
    ScenarioOptions {
        width: 200,
        height: 100,
        stepping: SteppingMode::FixedStep { delta_seconds: 0.5 },
        total_duration: 20.0,
        seed: Some(7),
        ..ScenarioOptions::default()
    }
}
