//! Per-tick motion samples of the tracked actor, written as CSV at teardown.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use glam::Vec3;
use sim_overlay_core::Pose;

/// Column header of the motion table.
pub const MOTION_LOG_HEADER: &str = "time,x,y,z,speed,yaw";

/// One recorded sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// Scenario-relative time, in seconds.
    pub time: f64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Velocity magnitude, in m/s.
    pub speed: f32,
    /// Heading in degrees.
    pub yaw: f32,
}

/// Accumulated motion samples.
#[derive(Debug, Clone, Default)]
pub struct MotionLog {
    samples: Vec<MotionSample>,
}

impl MotionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the actor's state at `time`.
    pub fn record(&mut self, time: f64, pose: &Pose, velocity: Vec3) {
        self.samples.push(MotionSample {
            time,
            x: pose.location.x,
            y: pose.location.y,
            z: pose.location.z,
            speed: velocity.length(),
            yaw: pose.rotation.yaw,
        });
    }

    pub fn samples(&self) -> &[MotionSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Writes the header and one row per sample.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "{MOTION_LOG_HEADER}")?;
        for s in &self.samples {
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                s.time, s.x, s.y, s.z, s.speed, s.yaw
            )?;
        }
        writer.flush()
    }

    /// Writes the table to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_csv(BufWriter::new(file))?;
        log::info!(
            "motion log with {} samples saved to {}",
            self.samples.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_overlay_core::Rotation;

    #[test]
    fn test_csv_layout() {
        let mut log = MotionLog::new();
        log.record(
            0.5,
            &Pose::new(Vec3::new(1.0, 2.0, 0.5), Rotation::new(0.0, 90.0, 0.0)),
            Vec3::new(3.0, 4.0, 0.0),
        );

        let mut out = Vec::new();
        log.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("time,x,y,z,speed,yaw"));
        assert_eq!(lines.next(), Some("0.5,1,2,0.5,5,90"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_log_has_header_only() {
        let mut out = Vec::new();
        MotionLog::new().write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "time,x,y,z,speed,yaw\n");
    }
}
