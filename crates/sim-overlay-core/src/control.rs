//! Time-windowed brake/throttle rule for scripted actors.

use serde::{Deserialize, Serialize};

/// Control values sent to a vehicle for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleControl {
    /// Throttle in `[0, 1]`.
    pub throttle: f32,
    /// Brake in `[0, 1]`.
    pub brake: f32,
    /// Steering in `[-1, 1]`.
    pub steer: f32,
}

impl VehicleControl {
    #[must_use]
    pub fn throttle(value: f32) -> Self {
        Self {
            throttle: value,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn brake(value: f32) -> Self {
        Self {
            brake: value,
            ..Default::default()
        }
    }
}

/// Which actors receive the windowed control rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlTarget {
    /// The tracked ego actor.
    Ego,
    /// Every spawned NPC.
    Npcs,
}

/// Brake while `red_start <= elapsed < red_end`, throttle otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlWindow {
    /// Start of the braking window, in scenario seconds (inclusive).
    pub red_start: f64,
    /// End of the braking window, in scenario seconds (exclusive).
    pub red_end: f64,
    /// Throttle applied outside the window.
    pub throttle: f32,
    /// Brake applied inside the window.
    pub brake: f32,
}

impl Default for ControlWindow {
    fn default() -> Self {
        Self {
            red_start: 10.0,
            red_end: 15.0,
            throttle: 0.7,
            brake: 1.0,
        }
    }
}

impl ControlWindow {
    /// Creates a window with the default throttle and brake values.
    #[must_use]
    pub fn new(red_start: f64, red_end: f64) -> Self {
        Self {
            red_start,
            red_end,
            ..Default::default()
        }
    }

    /// Returns true if `elapsed` falls inside the braking window.
    #[must_use]
    pub fn is_braking(&self, elapsed: f64) -> bool {
        (self.red_start..self.red_end).contains(&elapsed)
    }

    /// Returns the control for the given scenario time.
    #[must_use]
    pub fn command(&self, elapsed: f64) -> VehicleControl {
        if self.is_braking(elapsed) {
            VehicleControl::brake(self.brake)
        } else {
            VehicleControl::throttle(self.throttle)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_boundaries() {
        let window = ControlWindow::new(5.0, 10.0);

        assert_eq!(window.command(4.999), VehicleControl::throttle(0.7));
        assert_eq!(window.command(5.0), VehicleControl::brake(1.0));
        assert_eq!(window.command(9.999), VehicleControl::brake(1.0));
        assert_eq!(window.command(10.0), VehicleControl::throttle(0.7));
    }

    #[test]
    fn test_empty_window_never_brakes() {
        let window = ControlWindow::new(3.0, 3.0);
        assert!(!window.is_braking(3.0));
    }

    #[test]
    fn test_window_deserializes_with_defaults() {
        let window: ControlWindow = serde_json::from_str(r#"{"red_start": 1.0}"#).unwrap();
        assert_eq!(window.red_start, 1.0);
        assert_eq!(window.red_end, 15.0);
        assert_eq!(window.throttle, 0.7);
    }
}
