//! Directed edges and angles between waypoints

use serde::{Deserialize, Serialize};

use crate::status::EdgeStatus;
use crate::waypoint::WaypointId;

/// Cost added per unit of physical edge length
pub const LENGTH_FACTOR: i64 = 10;

/// One direction of a physical connection.
///
/// The opposite direction is a separate `Edge` owned by the other waypoint's
/// angle, so the two can disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    status: EdgeStatus,
    length: i64,
}

impl Default for Edge {
    fn default() -> Self {
        Edge::new(1)
    }
}

impl Edge {
    /// New edge of the given length, status UNKNOWN
    pub fn new(length: i64) -> Self {
        Edge {
            status: EdgeStatus::Unknown,
            length,
        }
    }

    pub fn with_status(status: EdgeStatus, length: i64) -> Self {
        Edge { status, length }
    }

    pub fn status(&self) -> EdgeStatus {
        self.status
    }

    pub fn set_status(&mut self, status: EdgeStatus) {
        self.status = status;
    }

    pub fn length(&self) -> i64 {
        self.length
    }

    /// Traversal cost used by the shortest path search
    pub fn weight(&self) -> i64 {
        self.status.value() + LENGTH_FACTOR * self.length
    }
}

/// Outgoing link from a waypoint to one neighbor.
///
/// `bearing` is the absolute design-time bearing (degrees, [0, 360)) of the
/// line toward the neighbor and never changes after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Angle {
    target: usize,
    target_id: WaypointId,
    bearing: f64,
    pub(crate) edge: Edge,
}

impl Angle {
    pub(crate) fn new(target: usize, target_id: WaypointId, bearing: f64, edge: Edge) -> Self {
        Angle {
            target,
            target_id,
            bearing,
            edge,
        }
    }

    /// Index of the neighbor in the graph's waypoint table
    pub fn target(&self) -> usize {
        self.target
    }

    pub fn target_id(&self) -> WaypointId {
        self.target_id
    }

    pub fn bearing(&self) -> f64 {
        self.bearing
    }

    pub fn edge(&self) -> &Edge {
        &self.edge
    }

    pub fn edge_mut(&mut self) -> &mut Edge {
        &mut self.edge
    }
}

/// Circular distance between two bearings, folded to [0, 180]
pub fn bearing_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Fold a bearing into [0, 360).
///
/// `rem_euclid` of a tiny negative value rounds up to exactly 360.0, which
/// is taken as 0.
pub fn normalize_bearing(bearing: f64) -> f64 {
    let bearing = bearing.rem_euclid(360.0);
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Express a turn through the shorter arc: (180, 360) becomes (-180, 0)
pub fn shortest_turn(bearing: f64) -> f64 {
    let bearing = bearing.rem_euclid(360.0);
    if bearing > 180.0 {
        bearing - 360.0
    } else {
        bearing
    }
}
