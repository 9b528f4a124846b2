//! Junction landmarks derived from road topology.
//!
//! Topology segments are scanned once; every endpoint that belongs to a
//! junction contributes its position to that junction's accumulator. The
//! landmark for a junction is the mean of its contributions. Junctions are
//! kept in first-seen order, which overlay labels rely on.

use std::collections::HashMap;

use glam::Vec3;

/// Stable identifier of a junction within a loaded map.
pub type JunctionId = i64;

/// A sampled point on a lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    /// World location of the sample.
    pub location: Vec3,
    /// Junction this waypoint belongs to, if any.
    pub junction: Option<JunctionId>,
}

impl Waypoint {
    /// A waypoint on an ordinary road segment.
    #[must_use]
    pub fn road(location: Vec3) -> Self {
        Self {
            location,
            junction: None,
        }
    }

    /// A waypoint inside the given junction.
    #[must_use]
    pub fn in_junction(location: Vec3, id: JunctionId) -> Self {
        Self {
            location,
            junction: Some(id),
        }
    }

    /// Returns true if this waypoint is part of a junction.
    #[must_use]
    pub fn is_junction(&self) -> bool {
        self.junction.is_some()
    }
}

/// One entry of the map topology: a lane segment between two waypoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopologySegment {
    pub start: Waypoint,
    pub end: Waypoint,
}

impl TopologySegment {
    #[must_use]
    pub fn new(start: Waypoint, end: Waypoint) -> Self {
        Self { start, end }
    }
}

/// A junction with the boundary points that contributed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    /// Junction identity.
    pub id: JunctionId,
    /// Contributing boundary positions, in the order they were seen.
    pub points: Vec<Vec3>,
    /// Arithmetic mean of `points`.
    pub centroid: Vec3,
}

/// Accumulates junction boundary points from topology segments.
#[derive(Debug, Default)]
pub struct JunctionAggregator {
    /// Accumulated points per junction, in first-seen order.
    groups: Vec<(JunctionId, Vec<Vec3>)>,
    /// Map from junction id to its position in `groups`.
    index: HashMap<JunctionId, usize>,
}

impl JunctionAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the junction list from a full topology in one pass.
    pub fn from_topology<'a, I>(segments: I) -> Vec<Junction>
    where
        I: IntoIterator<Item = &'a TopologySegment>,
    {
        let mut aggregator = Self::new();
        for segment in segments {
            aggregator.add_segment(segment);
        }
        aggregator.finish()
    }

    /// Adds both endpoints of a segment.
    pub fn add_segment(&mut self, segment: &TopologySegment) {
        self.add_waypoint(&segment.start);
        self.add_waypoint(&segment.end);
    }

    /// Adds a single waypoint; waypoints outside any junction are ignored.
    pub fn add_waypoint(&mut self, waypoint: &Waypoint) {
        let Some(id) = waypoint.junction else {
            return;
        };

        let slot = *self.index.entry(id).or_insert_with(|| {
            self.groups.push((id, Vec::new()));
            self.groups.len() - 1
        });
        self.groups[slot].1.push(waypoint.location);
    }

    /// Number of distinct junctions seen so far.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if no junction waypoint has been added.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Computes centroids and returns the junctions in first-seen order.
    pub fn finish(self) -> Vec<Junction> {
        self.groups
            .into_iter()
            .map(|(id, points)| {
                let centroid = mean(&points);
                Junction {
                    id,
                    points,
                    centroid,
                }
            })
            .collect()
    }
}

/// Elementwise mean, accumulated in f64. `points` is never empty here since
/// a junction only exists once a point has been pushed for it.
fn mean(points: &[Vec3]) -> Vec3 {
    let sum = points.iter().fold([0.0f64; 3], |acc, p| {
        [
            acc[0] + f64::from(p.x),
            acc[1] + f64::from(p.y),
            acc[2] + f64::from(p.z),
        ]
    });
    #[allow(clippy::cast_precision_loss)]
    let n = points.len().max(1) as f64;
    Vec3::new((sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32)
}
