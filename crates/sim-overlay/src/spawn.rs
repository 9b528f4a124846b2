//! Spawning actors with retry over shuffled spawn points.

use rand::seq::SliceRandom;
use rand::Rng;
use sim_overlay_core::Pose;

use crate::error::{SimError, SimResult};
use crate::simulator::{ActorId, Simulator};

/// Tries up to `tries` randomly ordered `candidates` until the simulator
/// accepts the vehicle.
///
/// Occupied spots and non-fatal simulator errors move on to the next
/// candidate. Returns `Ok(None)` when every attempt failed; only a lost
/// connection is returned as an error.
pub fn spawn_with_retry<S, R>(
    sim: &mut S,
    blueprint: &str,
    candidates: &[Pose],
    tries: usize,
    rng: &mut R,
) -> SimResult<Option<(ActorId, Pose)>>
where
    S: Simulator + ?Sized,
    R: Rng + ?Sized,
{
    let mut order = candidates.to_vec();
    order.shuffle(rng);

    for pose in order.into_iter().take(tries) {
        match sim.try_spawn_vehicle(blueprint, &pose) {
            Ok(Some(actor)) => return Ok(Some((actor, pose))),
            Ok(None) => {}
            Err(err @ SimError::Disconnected(_)) => return Err(err),
            Err(err) => log::debug!("spawn of {blueprint} failed: {err}"),
        }
    }

    Ok(None)
}
