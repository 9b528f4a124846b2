//! Bookkeeping of everything a scenario created, so it can all be released.

use sim_overlay_core::SensorFrameBuffer;

use crate::simulator::{ActorId, Simulator, WorldSettings};

/// What a call to [`ResourceLedger::release`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseSummary {
    /// Sensors stopped.
    pub sensors_stopped: usize,
    /// Actors destroyed.
    pub actors_destroyed: usize,
    /// Whether world settings were restored.
    pub settings_restored: bool,
    /// Steps that failed and were skipped.
    pub failures: usize,
}

/// Records sensors, actors and the world-settings override of a scenario.
///
/// Release order: every sensor is stopped before any actor is destroyed,
/// actors are destroyed newest first, and the original settings are put back
/// last. Entries are drained as they are released, so releasing twice is a
/// no-op.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    sensors: Vec<(ActorId, SensorFrameBuffer)>,
    actors: Vec<ActorId>,
    original_settings: Option<WorldSettings>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a spawned vehicle.
    pub fn record_actor(&mut self, actor: ActorId) {
        self.actors.push(actor);
    }

    /// Records a spawned sensor and the buffer it publishes into.
    pub fn record_sensor(&mut self, sensor: ActorId, buffer: SensorFrameBuffer) {
        self.sensors.push((sensor, buffer));
        self.actors.push(sensor);
    }

    /// Records the settings in effect before the scenario changed them.
    ///
    /// Only the first call is kept, so nested overrides restore the true
    /// original.
    pub fn record_settings(&mut self, original: WorldSettings) {
        self.original_settings.get_or_insert(original);
    }

    /// Returns true if nothing is left to release.
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty() && self.actors.is_empty() && self.original_settings.is_none()
    }

    /// Number of live actors recorded (sensors included).
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Releases everything recorded. Failures are logged and skipped.
    pub fn release<S: Simulator + ?Sized>(&mut self, sim: &mut S) -> ReleaseSummary {
        let mut summary = ReleaseSummary::default();

        for (sensor, buffer) in self.sensors.drain(..) {
            buffer.stop();
            if !sim.is_alive(sensor) {
                continue;
            }
            match sim.stop_sensor(sensor) {
                Ok(()) => summary.sensors_stopped += 1,
                Err(err) => {
                    log::warn!("failed to stop sensor {sensor}: {err}");
                    summary.failures += 1;
                }
            }
        }

        while let Some(actor) = self.actors.pop() {
            if !sim.is_alive(actor) {
                log::debug!("actor {actor} already gone");
                continue;
            }
            match sim.destroy_actor(actor) {
                Ok(()) => summary.actors_destroyed += 1,
                Err(err) => {
                    log::warn!("failed to destroy actor {actor}: {err}");
                    summary.failures += 1;
                }
            }
        }

        if let Some(original) = self.original_settings.take() {
            match sim.apply_settings(&original) {
                Ok(()) => summary.settings_restored = true,
                Err(err) => {
                    log::warn!("failed to restore world settings: {err}");
                    summary.failures += 1;
                }
            }
        }

        if summary != ReleaseSummary::default() {
            log::info!(
                "released {} sensors, {} actors (settings restored: {}, failures: {})",
                summary.sensors_stopped,
                summary.actors_destroyed,
                summary.settings_restored,
                summary.failures
            );
        }
        summary
    }
}
