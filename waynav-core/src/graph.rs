//! Waypoint graph with dynamic shortest path replanning
//!
//! The graph is the vehicle's belief about the course. It is updated from
//! three sources:
//! - physical evidence (arriving at a waypoint, detecting a cone or an
//!   obstacle) which sets confirmed statuses,
//! - camera observations which set `Potentially*` statuses,
//! - exhaustive point scans, after which unseen edges are marked missing.
//!
//! At every waypoint the shortest path from the current waypoint to the target
//! is recomputed with Dijkstra's algorithm over the edges that can still be
//! attempted.
//!
//! # Recovery
//!
//! Camera beliefs are unreliable. When the target cannot be reached, every
//! potentially blocked waypoint and every camera-derived edge status is reset
//! to UNKNOWN and the search is retried once. If that fails too, the target is
//! unreachable on confirmed information alone and [`NavError::NoPathLeft`] is
//! returned.

use log::{debug, info, warn};

use crate::edge::{Angle, Edge};
use crate::error::{NavError, Result};
use crate::status::{EdgeStatus, WaypointStatus};
use crate::topology::TopologyConfig;
use crate::waypoint::{validate_bearing, Waypoint, WaypointId};

/// Belief state of the whole course and the vehicle's place in it
#[derive(Debug, Clone)]
pub struct Graph {
    /// Fixed table in topology order, also the search tie-break order
    waypoints: Vec<Waypoint>,
    current: usize,
    previous: Option<usize>,
    target: Option<usize>,
    /// Path from current (exclusive) to target (inclusive)
    shortest_path: Vec<usize>,
    /// Set once the belief reset has been spent within a search call
    recovery_attempted: bool,
}

impl Graph {
    /// Build the graph from a topology.
    ///
    /// Every waypoint starts UNKNOWN except the start, which is FREE.
    pub fn new(topology: &TopologyConfig) -> Result<Self> {
        topology.validate()?;

        let mut waypoints: Vec<Waypoint> = topology
            .waypoints
            .iter()
            .map(|w| Waypoint::new(w.id))
            .collect();

        for (index, config) in topology.waypoints.iter().enumerate() {
            for neighbor in &config.neighbors {
                let target = topology
                    .position(neighbor.id)
                    .ok_or(NavError::UnknownWaypoint(neighbor.id))?;
                waypoints[index].add_angle(Angle::new(
                    target,
                    neighbor.id,
                    neighbor.bearing,
                    Edge::new(neighbor.length),
                ));
            }
        }

        let current = topology
            .position(topology.start)
            .ok_or(NavError::UnknownWaypoint(topology.start))?;
        waypoints[current].set_status(WaypointStatus::Free);
        waypoints[current].set_incoming_bearing_value(topology.start_incoming_bearing);

        Ok(Graph {
            waypoints,
            current,
            previous: None,
            target: None,
            shortest_path: Vec::new(),
            recovery_attempted: false,
        })
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    fn index_of(&self, id: WaypointId) -> Result<usize> {
        self.waypoints
            .iter()
            .position(|w| w.id() == id)
            .ok_or(NavError::UnknownWaypoint(id))
    }

    pub fn waypoint(&self, id: WaypointId) -> Result<&Waypoint> {
        let index = self.index_of(id)?;
        Ok(&self.waypoints[index])
    }

    pub fn waypoint_mut(&mut self, id: WaypointId) -> Result<&mut Waypoint> {
        let index = self.index_of(id)?;
        Ok(&mut self.waypoints[index])
    }

    pub fn current(&self) -> &Waypoint {
        &self.waypoints[self.current]
    }

    pub fn previous(&self) -> Option<&Waypoint> {
        self.previous.map(|i| &self.waypoints[i])
    }

    pub fn target(&self) -> Option<&Waypoint> {
        self.target.map(|i| &self.waypoints[i])
    }

    /// Path computed by the last search, next hop first
    pub fn shortest_path(&self) -> Vec<WaypointId> {
        self.shortest_path
            .iter()
            .map(|&i| self.waypoints[i].id())
            .collect()
    }

    pub fn recovery_attempted(&self) -> bool {
        self.recovery_attempted
    }

    // -------------------------------------------------------------------------
    // Target and movement
    // -------------------------------------------------------------------------

    pub fn set_target(&mut self, id: WaypointId) -> Result<()> {
        self.target = Some(self.index_of(id)?);
        Ok(())
    }

    pub fn reached_target(&self) -> bool {
        self.target == Some(self.current)
    }

    /// Next hop on the shortest path from the current waypoint to the target
    pub fn next_best_waypoint(&mut self) -> Result<WaypointId> {
        self.recompute_shortest_path()?;
        let next = self.shortest_path[0];
        Ok(self.waypoints[next].id())
    }

    /// Move the vehicle onto `to`
    pub fn advance(&mut self, to: WaypointId) -> Result<()> {
        let to = self.index_of(to)?;
        let from = self.waypoints[self.current].id();
        self.waypoints[to].set_incoming_bearing(from)?;
        self.previous = Some(self.current);
        self.current = to;
        Ok(())
    }

    /// Move the vehicle back to the previous waypoint
    pub fn retreat(&mut self) -> Result<()> {
        let Some(previous) = self.previous else {
            return Err(NavError::Topology(format!(
                "cannot retreat from start waypoint {}",
                self.current().id()
            )));
        };
        let from = self.waypoints[self.current].id();
        self.waypoints[previous].set_incoming_bearing(from)?;
        self.previous = Some(self.current);
        self.current = previous;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Belief updates
    // -------------------------------------------------------------------------

    pub fn mark_current_free(&mut self) {
        self.waypoints[self.current].set_status(WaypointStatus::Free);
    }

    /// A cone stands on the current waypoint
    pub fn mark_current_blocked(&mut self) {
        self.waypoints[self.current].set_status(WaypointStatus::Blocked);
    }

    /// Apply a camera observation taken at `value` degrees relative to the
    /// arrival heading at the current waypoint.
    ///
    /// Confirmed statuses of the neighbor and of the edge are kept. Returns
    /// the neighbor the reading was resolved to.
    pub fn update_belief(
        &mut self,
        value: f64,
        sensed_waypoint_status: WaypointStatus,
        sensed_edge_status: EdgeStatus,
    ) -> Result<WaypointId> {
        validate_bearing(value)?;
        let angle = self.waypoints[self.current].update_belief(value, sensed_edge_status)?;
        let (target, target_id) = (angle.target(), angle.target_id());

        let status = self.waypoints[target]
            .status()
            .refined(sensed_waypoint_status);
        self.waypoints[target].set_status(status);
        debug!(
            "Belief toward {}: waypoint {}, edge {}",
            target_id,
            status,
            self.waypoints[self.current].edge_toward(target_id)?.status()
        );
        Ok(target_id)
    }

    fn current_and_previous(&self) -> Result<(WaypointId, WaypointId)> {
        let previous = self.previous.ok_or_else(|| {
            NavError::Topology(format!(
                "waypoint {} has no previous waypoint",
                self.current().id()
            ))
        })?;
        Ok((
            self.waypoints[self.current].id(),
            self.waypoints[previous].id(),
        ))
    }

    /// The vehicle travelled between previous and current: confirm both
    /// directions
    pub fn confirm_edge_between_current_and_previous(&mut self) -> Result<()> {
        let (current, previous) = self.current_and_previous()?;
        self.waypoint_mut(current)?.confirm_edge_toward(previous)?;
        self.waypoint_mut(previous)?.confirm_edge_toward(current)?;
        Ok(())
    }

    pub fn mark_obstacle_between_current_and_previous(&mut self) -> Result<()> {
        let (current, previous) = self.current_and_previous()?;
        self.waypoint_mut(current)?
            .edge_toward_mut(previous)?
            .set_status(EdgeStatus::Obstructed);
        self.waypoint_mut(previous)?
            .edge_toward_mut(current)?
            .set_status(EdgeStatus::Obstructed);
        Ok(())
    }

    /// After a full point scan, edges that were never seen do not exist
    pub fn finalize_unscanned_angles_at_current(&mut self) -> Result<()> {
        let current = self.waypoints[self.current].id();
        let unscanned: Vec<WaypointId> = self.waypoints[self.current]
            .angles()
            .iter()
            .filter(|a| a.edge().status() == EdgeStatus::Unknown)
            .map(|a| a.target_id())
            .collect();
        for neighbor in unscanned {
            debug!("Edge {} -> {} not seen during scan, missing", current, neighbor);
            self.waypoint_mut(neighbor)?.mark_edge_missing(current)?;
            self.waypoint_mut(current)?.mark_edge_missing(neighbor)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Recompute the shortest path from the current waypoint to the target.
    ///
    /// Runs at most two searches: the second one after resetting camera
    /// beliefs, if the first found no path.
    pub fn recompute_shortest_path(&mut self) -> Result<()> {
        let target = self.target.ok_or(NavError::NoTarget)?;
        let target_id = self.waypoints[target].id();
        if target == self.current {
            return Err(NavError::AlreadyAtTarget(target_id));
        }

        self.recovery_attempted = false;
        loop {
            self.shortest_path.clear();
            self.dijkstra();
            if let Some(path) = self.reconstruct_path(target) {
                self.shortest_path = path;
                self.recovery_attempted = false;
                info!("Shortest path: {:?}", self.shortest_path());
                return Ok(());
            }
            if self.recovery_attempted {
                return Err(NavError::NoPathLeft(target_id));
            }
            warn!(
                "No path to target waypoint {} left, resetting object detection data",
                target_id
            );
            self.reset_object_detection_data();
            self.recovery_attempted = true;
        }
    }

    fn dijkstra(&mut self) {
        for waypoint in self.waypoints.iter_mut() {
            waypoint.reset_dijkstra();
        }
        self.waypoints[self.current].dijkstra_weight = Some(0);

        while let Some(node) = self.next_unvisited() {
            let weight = self.waypoints[node].dijkstra_weight.unwrap_or(0);
            let relaxations: Vec<(usize, i64)> = self.waypoints[node]
                .possible_angles(&self.waypoints)
                .iter()
                .map(|a| (a.target(), weight + a.edge().weight()))
                .collect();
            for (neighbor, candidate) in relaxations {
                let outgoing = &mut self.waypoints[neighbor];
                let better = outgoing.dijkstra_weight.map_or(true, |w| candidate < w);
                if better && !outgoing.dijkstra_visited {
                    outgoing.dijkstra_weight = Some(candidate);
                    outgoing.predecessor = Some(node);
                }
            }
            self.waypoints[node].dijkstra_visited = true;
        }
    }

    /// Unvisited, unblocked, reached waypoint with the smallest tentative
    /// weight. Ties go to the first in table order.
    fn next_unvisited(&self) -> Option<usize> {
        let mut best: Option<(usize, i64)> = None;
        for (index, waypoint) in self.waypoints.iter().enumerate() {
            if waypoint.dijkstra_visited || waypoint.status().is_blocked() {
                continue;
            }
            let Some(weight) = waypoint.dijkstra_weight else {
                continue;
            };
            if best.map_or(true, |(_, w)| weight < w) {
                best = Some((index, weight));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Walk predecessors back from the target. `None` if the chain breaks
    /// before reaching the current waypoint.
    fn reconstruct_path(&self, target: usize) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut node = target;
        while node != self.current {
            path.push(node);
            node = self.waypoints[node].predecessor?;
            if path.len() > self.waypoints.len() {
                return None;
            }
        }
        path.reverse();
        Some(path)
    }

    fn reset_object_detection_data(&mut self) {
        for waypoint in self.waypoints.iter_mut() {
            if waypoint.status() == WaypointStatus::PotentiallyBlocked {
                waypoint.set_status(WaypointStatus::Unknown);
            }
            for angle in waypoint.angles_mut() {
                if angle.edge().status().is_potential() {
                    angle.edge_mut().set_status(EdgeStatus::Unknown);
                }
            }
        }
    }
}
