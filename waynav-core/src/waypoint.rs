//! Waypoints: graph nodes with their outgoing angles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::edge::{bearing_distance, Angle, Edge};
use crate::error::{NavError, Result};
use crate::status::{EdgeStatus, WaypointStatus};

/// Waypoint identifier: a single uppercase ASCII letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WaypointId(char);

impl WaypointId {
    pub fn new(id: char) -> Result<Self> {
        if id.is_ascii_uppercase() {
            Ok(WaypointId(id))
        } else {
            Err(NavError::InvalidWaypointId(id.to_string()))
        }
    }

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl FromStr for WaypointId {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                WaypointId::new(c).map_err(|_| NavError::InvalidWaypointId(s.to_string()))
            }
            _ => Err(NavError::InvalidWaypointId(s.to_string())),
        }
    }
}

impl TryFrom<String> for WaypointId {
    type Error = NavError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<WaypointId> for String {
    fn from(id: WaypointId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Display for WaypointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check that a sensed bearing lies in [0, 360)
pub fn validate_bearing(value: f64) -> Result<f64> {
    if (0.0..360.0).contains(&value) {
        Ok(value)
    } else {
        Err(NavError::BearingOutOfRange(value))
    }
}

/// A node of the navigation graph.
///
/// Besides its belief status and outgoing angles, a waypoint carries the
/// bearing the vehicle arrived on (needed to turn relative sensor readings
/// into absolute bearings) and the scratch state of the last Dijkstra run.
#[derive(Debug, Clone)]
pub struct Waypoint {
    id: WaypointId,
    status: WaypointStatus,
    angles: Vec<Angle>,
    /// Bearing of the angle pointing back to where the vehicle came from
    incoming_bearing: f64,

    // Dijkstra scratch, rebuilt on every search
    pub(crate) dijkstra_weight: Option<i64>,
    pub(crate) dijkstra_visited: bool,
    pub(crate) predecessor: Option<usize>,
}

impl Waypoint {
    pub fn new(id: WaypointId) -> Self {
        Waypoint {
            id,
            status: WaypointStatus::Unknown,
            angles: Vec::new(),
            incoming_bearing: 0.0,
            dijkstra_weight: None,
            dijkstra_visited: false,
            predecessor: None,
        }
    }

    pub fn id(&self) -> WaypointId {
        self.id
    }

    pub fn status(&self) -> WaypointStatus {
        self.status
    }

    pub fn set_status(&mut self, status: WaypointStatus) {
        self.status = status;
    }

    pub fn angles(&self) -> &[Angle] {
        &self.angles
    }

    pub(crate) fn angles_mut(&mut self) -> &mut [Angle] {
        &mut self.angles
    }

    pub(crate) fn add_angle(&mut self, angle: Angle) {
        self.angles.push(angle);
    }

    pub fn incoming_bearing(&self) -> f64 {
        self.incoming_bearing
    }

    pub(crate) fn set_incoming_bearing_value(&mut self, bearing: f64) {
        self.incoming_bearing = bearing;
    }

    /// Tentative distance from the search origin, `None` if unreached
    pub fn dijkstra_weight(&self) -> Option<i64> {
        self.dijkstra_weight
    }

    pub fn dijkstra_visited(&self) -> bool {
        self.dijkstra_visited
    }

    /// Index of the previous waypoint on the shortest path, if any
    pub fn predecessor(&self) -> Option<usize> {
        self.predecessor
    }

    pub(crate) fn reset_dijkstra(&mut self) {
        self.dijkstra_weight = None;
        self.dijkstra_visited = false;
        self.predecessor = None;
    }

    /// Angles that can still be attempted: the neighbor is not (potentially)
    /// blocked and the edge is not (potentially) missing.
    ///
    /// `waypoints` is the table the angle targets index into.
    pub fn possible_angles<'a>(&'a self, waypoints: &[Waypoint]) -> Vec<&'a Angle> {
        self.angles
            .iter()
            .filter(|a| !waypoints[a.target()].status().is_blocked())
            .filter(|a| !a.edge().status().is_missing())
            .collect()
    }

    fn angle_index_toward(&self, neighbor: WaypointId) -> Result<usize> {
        self.angles
            .iter()
            .position(|a| a.target_id() == neighbor)
            .ok_or(NavError::MissingAngle {
                from: self.id,
                to: neighbor,
            })
    }

    pub fn angle_toward(&self, neighbor: WaypointId) -> Result<&Angle> {
        let index = self.angle_index_toward(neighbor)?;
        Ok(&self.angles[index])
    }

    pub fn edge_toward(&self, neighbor: WaypointId) -> Result<&Edge> {
        Ok(self.angle_toward(neighbor)?.edge())
    }

    pub fn edge_toward_mut(&mut self, neighbor: WaypointId) -> Result<&mut Edge> {
        let index = self.angle_index_toward(neighbor)?;
        Ok(self.angles[index].edge_mut())
    }

    /// Absolute bearing for a reading taken relative to the arrival heading
    pub fn absolute_bearing(&self, value: f64) -> f64 {
        (self.incoming_bearing - 180.0 + value).rem_euclid(360.0)
    }

    fn angle_index_for_sensed_bearing(&self, value: f64) -> Result<usize> {
        let bearing = self.absolute_bearing(value);
        let mut best: Option<(usize, f64)> = None;
        for (index, angle) in self.angles.iter().enumerate() {
            let distance = bearing_distance(angle.bearing(), bearing);
            // Strict comparison keeps the first of equally close angles
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
            .ok_or_else(|| NavError::Topology(format!("waypoint {} has no angles", self.id)))
    }

    /// Snap a sensed relative bearing onto the closest known angle
    pub fn angle_for_sensed_bearing(&self, value: f64) -> Result<&Angle> {
        let index = self.angle_index_for_sensed_bearing(value)?;
        Ok(&self.angles[index])
    }

    /// Apply a camera observation to the edge at the sensed bearing.
    ///
    /// The edge keeps a confirmed status. Returns the resolved angle so the
    /// caller can refine the neighbor's status as well, which lives in
    /// another waypoint.
    pub fn update_belief(&mut self, value: f64, sensed_edge_status: EdgeStatus) -> Result<&Angle> {
        validate_bearing(value)?;
        let index = self.angle_index_for_sensed_bearing(value)?;
        let edge = self.angles[index].edge_mut();
        edge.set_status(edge.status().refined(sensed_edge_status));
        Ok(&self.angles[index])
    }

    /// The vehicle travelled this edge: FREE unless a known obstruction
    pub fn confirm_edge_toward(&mut self, neighbor: WaypointId) -> Result<()> {
        let edge = self.edge_toward_mut(neighbor)?;
        if edge.status() != EdgeStatus::Obstructed {
            edge.set_status(EdgeStatus::Free);
        }
        Ok(())
    }

    pub fn mark_edge_missing(&mut self, neighbor: WaypointId) -> Result<()> {
        self.edge_toward_mut(neighbor)?.set_status(EdgeStatus::Missing);
        Ok(())
    }

    /// Record that the vehicle arrived here from `neighbor`
    pub fn set_incoming_bearing(&mut self, neighbor: WaypointId) -> Result<()> {
        self.incoming_bearing = self.angle_toward(neighbor)?.bearing();
        Ok(())
    }

    /// Bearing to turn through, relative to the arrival heading, to face
    /// `neighbor`. Inverse of [`Waypoint::absolute_bearing`].
    pub fn relative_bearing_toward(&self, neighbor: WaypointId) -> Result<f64> {
        let angle = self.angle_toward(neighbor)?;
        Ok((angle.bearing() - self.incoming_bearing + 180.0).rem_euclid(360.0))
    }
}
