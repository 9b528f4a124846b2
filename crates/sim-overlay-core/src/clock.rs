//! Scenario-relative simulated time.

/// Converts the simulator's absolute elapsed time into time since the
/// scenario's first tick.
///
/// A simulator session may have been running before the scenario started, so
/// the first observed value becomes the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioClock {
    origin: Option<f64>,
    elapsed: f64,
}

impl ScenarioClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the simulator's reported time and returns the scenario-relative
    /// elapsed time.
    pub fn observe(&mut self, simulator_seconds: f64) -> f64 {
        let origin = *self.origin.get_or_insert(simulator_seconds);
        self.elapsed = simulator_seconds - origin;
        self.elapsed
    }

    /// The origin, once the first tick has been observed.
    pub fn origin(&self) -> Option<f64> {
        self.origin
    }

    /// Elapsed time at the last observation.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
