//! Static waypoint topology
//!
//! The topology is the design-time description of the course: which
//! waypoints exist, how they are connected and at which absolute bearing each
//! connection leaves a waypoint. It is loaded and validated once by the shell
//! and handed to [`Graph::new`](crate::Graph::new) by reference.
//!
//! Both the waypoint list and each neighbor list are ordered. The waypoint
//! order is the tie-break order of the shortest path search.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{NavError, Result};
use crate::waypoint::WaypointId;

/// One outgoing connection of a waypoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborConfig {
    pub id: WaypointId,
    /// Absolute bearing of the connection in degrees, [0, 360)
    pub bearing: f64,
    /// Physical length in course units
    #[serde(default = "default_length")]
    pub length: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointConfig {
    pub id: WaypointId,
    pub neighbors: Vec<NeighborConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Where the vehicle is placed. Not necessarily a physical waypoint.
    #[serde(default = "default_start")]
    pub start: WaypointId,

    /// Incoming bearing assumed at the start. 180 means the vehicle faces
    /// bearing 0.
    #[serde(default = "default_start_incoming_bearing")]
    pub start_incoming_bearing: f64,

    pub waypoints: Vec<WaypointConfig>,
}

fn default_length() -> i64 {
    1
}
fn default_start() -> WaypointId {
    WaypointId::new('X').expect("X is a valid waypoint id")
}
fn default_start_incoming_bearing() -> f64 {
    180.0
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self::canonical()
    }
}

impl TopologyConfig {
    /// The nine waypoint course: start X below S, S fanning out to H, G and
    /// F, and the far side I, C, A, B.
    ///
    /// ```text
    ///          C     I ──── A ──── B
    ///           \   / \    / \   /
    ///            H     G  /   F
    ///             \    | /   /
    ///              ─── S ───
    ///                  |
    ///                  X
    /// ```
    pub fn canonical() -> Self {
        let table: &[(char, &[(char, f64)])] = &[
            ('X', &[('S', 0.0)]),
            ('S', &[('G', 30.0), ('F', 60.0), ('X', 180.0), ('H', 300.0)]),
            ('H', &[('I', 0.0), ('S', 120.0), ('C', 330.0)]),
            ('G', &[('A', 30.0), ('S', 210.0), ('I', 330.0)]),
            ('F', &[('B', 60.0), ('S', 240.0), ('A', 330.0)]),
            ('I', &[('A', 90.0), ('G', 150.0), ('H', 180.0), ('C', 300.0)]),
            ('A', &[('B', 90.0), ('F', 150.0), ('G', 210.0), ('I', 270.0)]),
            ('C', &[('I', 120.0), ('H', 150.0)]),
            ('B', &[('F', 240.0), ('A', 270.0)]),
        ];
        Self::from_table(table).expect("canonical topology uses valid ids")
    }

    /// Build a topology with unit lengths from `(id, [(neighbor, bearing)])`
    /// rows. The first row is the start.
    pub fn from_table(table: &[(char, &[(char, f64)])]) -> Result<Self> {
        let mut waypoints = Vec::with_capacity(table.len());
        for (id, neighbors) in table {
            let neighbors = neighbors
                .iter()
                .map(|(n, bearing)| {
                    Ok(NeighborConfig {
                        id: WaypointId::new(*n)?,
                        bearing: *bearing,
                        length: default_length(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            waypoints.push(WaypointConfig {
                id: WaypointId::new(*id)?,
                neighbors,
            });
        }
        let start = waypoints
            .first()
            .map(|w| w.id)
            .ok_or_else(|| NavError::Topology("no waypoints".to_string()))?;
        Ok(TopologyConfig {
            start,
            start_incoming_bearing: default_start_incoming_bearing(),
            waypoints,
        })
    }

    pub fn position(&self, id: WaypointId) -> Option<usize> {
        self.waypoints.iter().position(|w| w.id == id)
    }

    pub fn waypoint(&self, id: WaypointId) -> Option<&WaypointConfig> {
        self.waypoints.iter().find(|w| w.id == id)
    }

    /// Check the topology is usable by the graph.
    ///
    /// Every connection must exist in both directions, since arriving over an
    /// edge confirms both of its directional edges.
    pub fn validate(&self) -> Result<()> {
        if self.waypoints.is_empty() {
            return Err(NavError::Topology("no waypoints".to_string()));
        }

        let mut seen = HashSet::new();
        for waypoint in &self.waypoints {
            if !seen.insert(waypoint.id) {
                return Err(NavError::Topology(format!(
                    "waypoint {} is defined twice",
                    waypoint.id
                )));
            }
        }

        if !seen.contains(&self.start) {
            return Err(NavError::Topology(format!(
                "start waypoint {} is not defined",
                self.start
            )));
        }
        if !(0.0..360.0).contains(&self.start_incoming_bearing) {
            return Err(NavError::Topology(format!(
                "start incoming bearing {} is not in [0, 360)",
                self.start_incoming_bearing
            )));
        }

        for waypoint in &self.waypoints {
            let mut neighbors = HashSet::new();
            for neighbor in &waypoint.neighbors {
                if neighbor.id == waypoint.id {
                    return Err(NavError::Topology(format!(
                        "waypoint {} links to itself",
                        waypoint.id
                    )));
                }
                if !neighbors.insert(neighbor.id) {
                    return Err(NavError::Topology(format!(
                        "waypoint {} lists neighbor {} twice",
                        waypoint.id, neighbor.id
                    )));
                }
                if !(0.0..360.0).contains(&neighbor.bearing) {
                    return Err(NavError::Topology(format!(
                        "bearing {} from {} to {} is not in [0, 360)",
                        neighbor.bearing, waypoint.id, neighbor.id
                    )));
                }
                let other = self.waypoint(neighbor.id).ok_or_else(|| {
                    NavError::Topology(format!(
                        "waypoint {} links to undefined waypoint {}",
                        waypoint.id, neighbor.id
                    ))
                })?;
                if !other.neighbors.iter().any(|n| n.id == waypoint.id) {
                    return Err(NavError::Topology(format!(
                        "connection {} -> {} has no reverse direction",
                        waypoint.id, neighbor.id
                    )));
                }
            }
        }
        Ok(())
    }
}
