//! Navigation Controller
//!
//! Event driven state machine between the vehicle and the [`Graph`]. Every
//! inbound event is handled to completion: the graph is updated, the shortest
//! path recomputed if needed, and at most one [`Command`] is emitted.
//!
//! # Modes
//!
//! - **Ideal path**: at every waypoint, turn straight toward the next hop with
//!   a `target_line_angle` command. Cheap, but relies on the configured
//!   bearings matching the course.
//! - **Point scanning**: at every waypoint, rotate in place (`scan_point`),
//!   collect one belief per line seen, then pick the next hop by its position
//!   in the scan (`target_line`).
//!
//! The controller starts in the configured mode and falls back to point
//! scanning when a cone is hit or the line is lost.
//!
//! # Event flow
//!
//! ```text
//! set_target ──► ping ──► pong ──► target_line_angle / scan_point
//!                                        │
//!          ┌─────────────────────────────┘
//!          ▼
//!   turned_to_target_line ──► follow_line ──► waypoint ──► next command
//!                                                   └────► target_reached
//! ```

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::edge::{normalize_bearing, shortest_turn};
use crate::error::Result;
use crate::graph::Graph;
use crate::io::{Command, Emitter, ObjectDetector};
use crate::waypoint::{validate_bearing, WaypointId};

/// Strategy for choosing the next line at a waypoint
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum NavigationMode {
    #[default]
    IdealPath,
    PointScanning,
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NavigationState {
    /// No target set
    Idle,
    /// Target set, waiting for `pong`
    AwaitingCommunicationCheck,
    NavigatingIdealPath,
    PointScanning,
    TargetReached,
    /// Terminal, all further events are ignored
    Stopped,
}

pub struct NavigationController<E, D> {
    graph: Graph,
    emitter: E,
    detector: D,
    mode: NavigationMode,
    state: NavigationState,
    link_verified: bool,
    /// Neighbors in the order the current point scan saw them
    scanned_neighbors: Vec<WaypointId>,
    /// Hop the vehicle has been told to turn toward
    pending_hop: Option<WaypointId>,
    /// Hop whose line the vehicle is following. The graph has already
    /// advanced onto it, the vehicle has not arrived yet.
    following: Option<WaypointId>,
    /// Degrees turned at the current waypoint since arrival
    turn_accumulator: f64,
}

impl<E: Emitter, D: ObjectDetector> NavigationController<E, D> {
    pub fn new(graph: Graph, emitter: E, detector: D, mode: NavigationMode) -> Self {
        Self {
            graph,
            emitter,
            detector,
            mode,
            state: NavigationState::Idle,
            link_verified: false,
            scanned_neighbors: Vec::new(),
            pending_hop: None,
            following: None,
            turn_accumulator: 0.0,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn mode(&self) -> NavigationMode {
        self.mode
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == NavigationState::Stopped
    }

    pub fn link_verified(&self) -> bool {
        self.link_verified
    }

    /// Skip the ping/pong check, for links that cannot answer
    pub fn assume_link_verified(&mut self) {
        self.link_verified = true;
    }

    pub fn pending_hop(&self) -> Option<WaypointId> {
        self.pending_hop
    }

    pub fn following(&self) -> Option<WaypointId> {
        self.following
    }

    pub fn scanned_neighbors(&self) -> &[WaypointId] {
        &self.scanned_neighbors
    }

    pub fn turn_accumulator(&self) -> f64 {
        self.turn_accumulator
    }

    fn send(&mut self, command: Command) {
        debug!("Emit {}", command);
        self.emitter.emit(command);
    }

    fn ignored(&self, event: &str) -> bool {
        if self.is_stopped() {
            warn!("Ignoring {} after stop", event);
            true
        } else {
            false
        }
    }

    fn switch_to_point_scanning(&mut self) {
        if self.mode != NavigationMode::PointScanning {
            info!("Switching to point scanning at {}", self.graph.current().id());
        }
        self.mode = NavigationMode::PointScanning;
        self.state = NavigationState::PointScanning;
    }

    // -------------------------------------------------------------------------
    // Movement commands
    // -------------------------------------------------------------------------

    /// Turn toward `hop` through the shorter arc, taking the part of the turn
    /// already done at this waypoint into account
    fn turn_toward(&mut self, hop: WaypointId) -> Result<()> {
        let relative = self.graph.current().relative_bearing_toward(hop)?;
        let turn = shortest_turn(relative - self.turn_accumulator);
        self.turn_accumulator += turn;
        self.pending_hop = Some(hop);
        self.send(Command::TargetLineAngle(turn));
        Ok(())
    }

    fn steer_ideal_path(&mut self) -> Result<()> {
        self.state = NavigationState::NavigatingIdealPath;
        let hop = self.graph.next_best_waypoint()?;
        info!("Next hop {} -> {}", self.graph.current().id(), hop);
        self.turn_toward(hop)
    }

    fn start_point_scan(&mut self) {
        self.state = NavigationState::PointScanning;
        self.scanned_neighbors.clear();
        self.send(Command::ScanPoint);
    }

    /// First command after a target is set and the link is verified
    fn start_moving(&mut self) -> Result<()> {
        if self.graph.reached_target() {
            return self.finish();
        }
        match self.mode {
            NavigationMode::IdealPath => self.steer_ideal_path(),
            NavigationMode::PointScanning => {
                self.start_point_scan();
                Ok(())
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        info!("Target {} reached", self.graph.current().id());
        self.state = NavigationState::TargetReached;
        self.pending_hop = None;
        self.send(Command::TargetReached);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Operator selected a destination.
    ///
    /// On an unknown or malformed id nothing changes.
    pub fn on_set_target(&mut self, id: &str) -> Result<()> {
        if self.ignored("set target") {
            return Ok(());
        }
        let id: WaypointId = id.parse()?;
        self.graph.waypoint(id)?;

        self.detector.start_up_process_detect(&mut self.graph);
        self.graph.set_target(id)?;
        self.pending_hop = None;
        self.scanned_neighbors.clear();
        info!("Target set to {}", id);

        if self.link_verified {
            self.start_moving()
        } else {
            self.state = NavigationState::AwaitingCommunicationCheck;
            self.send(Command::Ping);
            Ok(())
        }
    }

    pub fn on_pong(&mut self) -> Result<()> {
        if self.ignored("pong") {
            return Ok(());
        }
        self.link_verified = true;
        if self.state == NavigationState::AwaitingCommunicationCheck {
            info!("Communication check passed");
            self.start_moving()
        } else {
            debug!("Pong in state {}", self.state);
            Ok(())
        }
    }

    /// The vehicle arrived at the waypoint it was heading for
    pub fn on_waypoint(&mut self) -> Result<()> {
        if self.ignored("waypoint") {
            return Ok(());
        }
        let current = self.graph.current().id();
        info!("Arrived at {}", current);
        self.graph.mark_current_free();
        if self.graph.previous().is_some() {
            self.graph.confirm_edge_between_current_and_previous()?;
        }
        self.turn_accumulator = 0.0;
        self.pending_hop = None;
        self.following = None;

        if self.graph.reached_target() {
            return self.finish();
        }
        match self.mode {
            NavigationMode::IdealPath => self.steer_ideal_path(),
            NavigationMode::PointScanning => {
                self.start_point_scan();
                Ok(())
            }
        }
    }

    /// A line was seen during a point scan at `value` degrees from the
    /// heading the vehicle arrived on
    pub fn on_angle(&mut self, value: f64) -> Result<()> {
        if self.ignored("angle") {
            return Ok(());
        }
        validate_bearing(value)?;
        let sensed = normalize_bearing(value + self.turn_accumulator);
        let (waypoint_status, edge_status) = self.detector.detect();
        let neighbor = self
            .graph
            .update_belief(sensed, waypoint_status, edge_status)?;
        debug!(
            "Angle {} resolved to {}: waypoint {}, edge {}",
            value, neighbor, waypoint_status, edge_status
        );
        self.scanned_neighbors.push(neighbor);
        Ok(())
    }

    pub fn on_point_scanning_finished(&mut self) -> Result<()> {
        if self.ignored("point scanning finished") {
            return Ok(());
        }
        self.graph.finalize_unscanned_angles_at_current()?;
        let hop = self.graph.next_best_waypoint()?;
        let position = self.scanned_neighbors.iter().position(|&n| n == hop);
        self.scanned_neighbors.clear();

        match position {
            Some(index) => {
                info!("Next hop {} is line {} of the scan", hop, index);
                self.pending_hop = Some(hop);
                self.send(Command::TargetLine(index));
                Ok(())
            }
            None => {
                // Known from an earlier visit but not seen this time
                debug!("Next hop {} was not scanned, turning by bearing", hop);
                self.turn_toward(hop)
            }
        }
    }

    /// The vehicle faces the line toward the pending hop
    pub fn on_turned_to_target_line(&mut self) -> Result<()> {
        if self.ignored("turned to target line") {
            return Ok(());
        }
        let Some(hop) = self.pending_hop.take() else {
            match self.following {
                // Back on the line after a correction, the graph is already there
                Some(hop) => {
                    debug!("Back on the line toward {}", hop);
                    self.send(Command::FollowLine);
                }
                None => warn!("Turned to target line without a pending hop"),
            }
            return Ok(());
        };
        self.graph.advance(hop)?;
        self.following = Some(hop);
        self.turn_accumulator = 0.0;
        self.send(Command::FollowLine);
        Ok(())
    }

    /// A cone stands on the waypoint the vehicle is heading for. The vehicle
    /// drives back and reports `waypoint` on arrival.
    pub fn on_cone_detected(&mut self) -> Result<()> {
        if self.ignored("cone detected") {
            return Ok(());
        }
        warn!("Cone detected at {}", self.graph.current().id());
        self.graph.mark_current_blocked();
        self.graph.retreat()?;
        self.pending_hop = None;
        self.following = None;
        self.switch_to_point_scanning();
        Ok(())
    }

    pub fn on_obstacle_detected(&mut self) -> Result<()> {
        if self.ignored("obstacle detected") {
            return Ok(());
        }
        warn!(
            "Obstacle detected between {} and {}",
            self.graph.previous().map_or('-', |w| w.id().as_char()),
            self.graph.current().id()
        );
        self.graph.mark_obstacle_between_current_and_previous()
    }

    pub fn on_line_missing(&mut self) -> Result<()> {
        if self.ignored("line missing") {
            return Ok(());
        }
        if let Some(hop) = self.following {
            // Lost between two waypoints: no scan here, steer back onto the
            // line toward the hop already committed to
            warn!("Line toward {} missing, correcting", hop);
            if self.mode == NavigationMode::IdealPath {
                self.switch_to_point_scanning();
            }
            self.send(Command::TargetLineAngle(0.0));
            return Ok(());
        }
        match self.mode {
            NavigationMode::IdealPath => {
                warn!("Line missing at {}", self.graph.current().id());
                self.switch_to_point_scanning();
                self.start_point_scan();
                Ok(())
            }
            NavigationMode::PointScanning => {
                let hop = match self.pending_hop {
                    Some(hop) => hop,
                    None => self.graph.next_best_waypoint()?,
                };
                warn!("Line missing, correcting toward {}", hop);
                self.turn_toward(hop)
            }
        }
    }

    pub fn on_stop(&mut self) {
        info!("Stop");
        self.state = NavigationState::Stopped;
        self.pending_hop = None;
        self.following = None;
    }

    /// Target the controller is driving to, if any
    pub fn target(&self) -> Option<WaypointId> {
        self.graph.target().map(|w| w.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NavError;
    use crate::status::{EdgeStatus, WaypointStatus};
    use crate::topology::TopologyConfig;
    use std::collections::VecDeque;

    // =========================================================================
    // Test doubles
    // =========================================================================

    #[derive(Default)]
    struct RecordingEmitter {
        commands: Vec<String>,
    }

    impl Emitter for RecordingEmitter {
        fn emit(&mut self, command: Command) {
            self.commands.push(command.to_string());
        }
    }

    /// Replays queued beliefs, then falls back to potentially free
    #[derive(Default)]
    struct ScriptedDetector {
        beliefs: VecDeque<(WaypointStatus, EdgeStatus)>,
        start_up_calls: usize,
    }

    impl ScriptedDetector {
        fn with(beliefs: &[(WaypointStatus, EdgeStatus)]) -> Self {
            Self {
                beliefs: beliefs.iter().copied().collect(),
                start_up_calls: 0,
            }
        }
    }

    impl ObjectDetector for ScriptedDetector {
        fn detect(&mut self) -> (WaypointStatus, EdgeStatus) {
            self.beliefs
                .pop_front()
                .unwrap_or((WaypointStatus::PotentiallyFree, EdgeStatus::PotentiallyFree))
        }

        fn start_up_process_detect(&mut self, _graph: &mut Graph) {
            self.start_up_calls += 1;
        }
    }

    type Controller = NavigationController<RecordingEmitter, ScriptedDetector>;

    fn controller(mode: NavigationMode) -> Controller {
        controller_with(mode, ScriptedDetector::default())
    }

    fn controller_with(mode: NavigationMode, detector: ScriptedDetector) -> Controller {
        let graph = Graph::new(&TopologyConfig::canonical()).unwrap();
        NavigationController::new(graph, RecordingEmitter::default(), detector, mode)
    }

    fn id(c: char) -> WaypointId {
        WaypointId::new(c).unwrap()
    }

    fn commands(c: &Controller) -> Vec<&str> {
        c.emitter().commands.iter().map(String::as_str).collect()
    }

    fn last(c: &Controller) -> &str {
        c.emitter().commands.last().map(String::as_str).unwrap_or("")
    }

    fn edge(c: &Controller, from: char, to: char) -> EdgeStatus {
        c.graph()
            .waypoint(id(from))
            .unwrap()
            .edge_toward(id(to))
            .unwrap()
            .status()
    }

    fn status(c: &Controller, w: char) -> WaypointStatus {
        c.graph().waypoint(id(w)).unwrap().status()
    }

    // =========================================================================
    // Start up
    // =========================================================================

    #[test]
    fn test_set_target_waits_for_pong() {
        let mut c = controller(NavigationMode::IdealPath);
        assert_eq!(c.state(), NavigationState::Idle);
        c.on_set_target("A").unwrap();
        assert_eq!(c.state(), NavigationState::AwaitingCommunicationCheck);
        assert_eq!(commands(&c), vec!["ping"]);
        assert_eq!(c.detector().start_up_calls, 1);
        assert_eq!(c.target(), Some(id('A')));

        c.on_pong().unwrap();
        assert!(c.link_verified());
        assert_eq!(c.state(), NavigationState::NavigatingIdealPath);
        // Start faces bearing 0, S is straight ahead
        assert_eq!(commands(&c), vec!["ping", "target_line_angle:0"]);
        assert_eq!(c.pending_hop(), Some(id('S')));
    }

    #[test]
    fn test_set_target_rejects_bad_ids() {
        let mut c = controller(NavigationMode::IdealPath);
        assert_eq!(
            c.on_set_target("a"),
            Err(NavError::InvalidWaypointId("a".to_string()))
        );
        assert_eq!(
            c.on_set_target("AB"),
            Err(NavError::InvalidWaypointId("AB".to_string()))
        );
        assert_eq!(
            c.on_set_target("Z"),
            Err(NavError::UnknownWaypoint(id('Z')))
        );
        assert!(commands(&c).is_empty());
        assert_eq!(c.state(), NavigationState::Idle);
        assert_eq!(c.detector().start_up_calls, 0);
        assert_eq!(c.target(), None);
    }

    #[test]
    fn test_pong_without_target_only_verifies_link() {
        let mut c = controller(NavigationMode::IdealPath);
        c.on_pong().unwrap();
        assert!(c.link_verified());
        assert!(commands(&c).is_empty());

        c.on_set_target("A").unwrap();
        assert_eq!(commands(&c), vec!["target_line_angle:0"]);
    }

    #[test]
    fn test_target_at_start() {
        let mut c = controller(NavigationMode::IdealPath);
        c.on_pong().unwrap();
        c.on_set_target("X").unwrap();
        assert_eq!(commands(&c), vec!["target_reached"]);
        assert_eq!(c.state(), NavigationState::TargetReached);
    }

    // =========================================================================
    // Ideal path
    // =========================================================================

    #[test]
    fn test_ideal_path_to_a() {
        let mut c = controller(NavigationMode::IdealPath);
        c.on_set_target("A").unwrap();
        c.on_pong().unwrap();

        c.on_turned_to_target_line().unwrap();
        assert_eq!(c.graph().current().id(), id('S'));
        assert_eq!(last(&c), "follow_line");

        c.on_waypoint().unwrap();
        assert_eq!(status(&c, 'S'), WaypointStatus::Free);
        assert_eq!(edge(&c, 'X', 'S'), EdgeStatus::Free);
        assert_eq!(edge(&c, 'S', 'X'), EdgeStatus::Free);
        // Arrived facing 0, G lies at 30
        assert_eq!(last(&c), "target_line_angle:30");
        assert_eq!(c.turn_accumulator(), 30.0);

        c.on_turned_to_target_line().unwrap();
        assert_eq!(c.turn_accumulator(), 0.0);
        c.on_waypoint().unwrap();
        assert_eq!(c.graph().current().id(), id('G'));
        // Arrived facing 30, A lies at 30
        assert_eq!(last(&c), "target_line_angle:0");

        c.on_turned_to_target_line().unwrap();
        c.on_waypoint().unwrap();
        assert_eq!(c.state(), NavigationState::TargetReached);
        assert_eq!(
            commands(&c),
            vec![
                "ping",
                "target_line_angle:0",
                "follow_line",
                "target_line_angle:30",
                "follow_line",
                "target_line_angle:0",
                "follow_line",
                "target_reached",
            ]
        );
    }

    #[test]
    fn test_turns_take_the_shorter_arc() {
        let mut c = controller(NavigationMode::IdealPath);
        c.on_pong().unwrap();
        c.on_set_target("I").unwrap();
        c.on_turned_to_target_line().unwrap();
        c.on_waypoint().unwrap();
        // H at 300 is reached by turning 60 to the left
        assert_eq!(c.pending_hop(), Some(id('H')));
        assert_eq!(last(&c), "target_line_angle:-60");
        assert_eq!(c.turn_accumulator(), -60.0);
    }

    #[test]
    fn test_turned_without_pending_hop_is_ignored() {
        let mut c = controller(NavigationMode::IdealPath);
        c.on_turned_to_target_line().unwrap();
        assert!(commands(&c).is_empty());
        assert_eq!(c.graph().current().id(), id('X'));
    }

    #[test]
    fn test_line_missing_switches_to_point_scanning() {
        let mut c = controller(NavigationMode::IdealPath);
        c.on_pong().unwrap();
        c.on_set_target("A").unwrap();
        c.on_turned_to_target_line().unwrap();
        c.on_waypoint().unwrap();
        assert_eq!(last(&c), "target_line_angle:30");

        c.on_line_missing().unwrap();
        assert_eq!(c.mode(), NavigationMode::PointScanning);
        assert_eq!(c.state(), NavigationState::PointScanning);
        assert_eq!(last(&c), "scan_point");

        // The vehicle already turned 30, a line straight ahead is G
        c.on_angle(0.0).unwrap();
        assert_eq!(c.scanned_neighbors(), &[id('G')]);
        assert_eq!(status(&c, 'G'), WaypointStatus::PotentiallyFree);
        assert_eq!(edge(&c, 'S', 'G'), EdgeStatus::PotentiallyFree);
    }

    // =========================================================================
    // Point scanning
    // =========================================================================

    #[test]
    fn test_point_scanning_to_a() {
        let mut c = controller(NavigationMode::PointScanning);
        c.on_set_target("A").unwrap();
        c.on_pong().unwrap();
        assert_eq!(c.state(), NavigationState::PointScanning);
        assert_eq!(last(&c), "scan_point");

        c.on_angle(0.0).unwrap();
        c.on_point_scanning_finished().unwrap();
        assert_eq!(last(&c), "target_line:0");
        c.on_turned_to_target_line().unwrap();
        c.on_waypoint().unwrap();
        assert_eq!(last(&c), "scan_point");

        // Lines seen left to right: H, G, F
        for value in [300.0, 30.0, 60.0] {
            c.on_angle(value).unwrap();
        }
        assert_eq!(c.scanned_neighbors(), &[id('H'), id('G'), id('F')]);
        c.on_point_scanning_finished().unwrap();
        assert_eq!(c.pending_hop(), Some(id('G')));
        assert_eq!(last(&c), "target_line:1");
        assert!(c.scanned_neighbors().is_empty());
        // X was seen on the way in, so it is not missing
        assert_eq!(edge(&c, 'S', 'X'), EdgeStatus::Free);
    }

    #[test]
    fn test_point_scanning_records_detector_beliefs() {
        let detector = ScriptedDetector::with(&[
            (WaypointStatus::PotentiallyFree, EdgeStatus::PotentiallyFree),
            (WaypointStatus::PotentiallyBlocked, EdgeStatus::PotentiallyFree),
            (WaypointStatus::PotentiallyFree, EdgeStatus::PotentiallyObstructed),
            (WaypointStatus::PotentiallyFree, EdgeStatus::PotentiallyFree),
        ]);
        let mut c = controller_with(NavigationMode::PointScanning, detector);
        c.on_pong().unwrap();
        c.on_set_target("A").unwrap();
        c.on_angle(0.0).unwrap();
        c.on_point_scanning_finished().unwrap();
        c.on_turned_to_target_line().unwrap();
        c.on_waypoint().unwrap();

        c.on_angle(300.0).unwrap();
        c.on_angle(30.0).unwrap();
        assert_eq!(status(&c, 'G'), WaypointStatus::PotentiallyFree);
        assert_eq!(edge(&c, 'S', 'G'), EdgeStatus::PotentiallyObstructed);
        assert_eq!(status(&c, 'H'), WaypointStatus::PotentiallyBlocked);

        c.on_angle(60.0).unwrap();
        c.on_point_scanning_finished().unwrap();
        // F's line is cheaper than G's obstructed one
        assert_eq!(c.pending_hop(), Some(id('F')));
        assert_eq!(last(&c), "target_line:2");
    }

    #[test]
    fn test_unscanned_hop_falls_back_to_bearing() {
        let mut c = controller(NavigationMode::IdealPath);
        c.on_pong().unwrap();
        c.on_set_target("A").unwrap();
        c.on_turned_to_target_line().unwrap();
        c.on_waypoint().unwrap();
        c.on_line_missing().unwrap();
        c.graph_mut()
            .waypoint_mut(id('S'))
            .unwrap()
            .edge_toward_mut(id('G'))
            .unwrap()
            .set_status(EdgeStatus::Free);

        // Already turned 30: F is 30 further right, H 90 to the left
        c.on_angle(30.0).unwrap();
        c.on_angle(270.0).unwrap();
        assert_eq!(c.scanned_neighbors(), &[id('F'), id('H')]);
        c.on_point_scanning_finished().unwrap();
        assert_eq!(c.pending_hop(), Some(id('G')));
        // Facing G already
        assert_eq!(last(&c), "target_line_angle:0");
    }

    #[test]
    fn test_line_missing_while_scanning_corrects_toward_hop() {
        let mut c = controller(NavigationMode::PointScanning);
        c.on_pong().unwrap();
        c.on_set_target("A").unwrap();
        c.on_angle(0.0).unwrap();
        c.on_point_scanning_finished().unwrap();
        c.on_turned_to_target_line().unwrap();
        c.on_waypoint().unwrap();
        for value in [300.0, 30.0, 60.0] {
            c.on_angle(value).unwrap();
        }
        c.on_point_scanning_finished().unwrap();
        assert_eq!(last(&c), "target_line:1");

        c.on_line_missing().unwrap();
        assert_eq!(last(&c), "target_line_angle:30");
        assert_eq!(c.pending_hop(), Some(id('G')));
        // Second correction only covers what is left
        c.on_line_missing().unwrap();
        assert_eq!(last(&c), "target_line_angle:0");
    }

    #[test]
    fn test_line_missing_between_waypoints_keeps_graph_position() {
        let mut c = controller(NavigationMode::PointScanning);
        c.on_pong().unwrap();
        c.on_set_target("A").unwrap();
        c.on_angle(0.0).unwrap();
        c.on_point_scanning_finished().unwrap();
        assert_eq!(last(&c), "target_line:0");
        c.on_turned_to_target_line().unwrap();
        assert_eq!(c.following(), Some(id('S')));
        assert_eq!(c.graph().current().id(), id('S'));

        c.on_line_missing().unwrap();
        assert_eq!(last(&c), "target_line_angle:0");
        assert_eq!(c.pending_hop(), None);
        assert_eq!(c.graph().current().id(), id('S'));

        c.on_turned_to_target_line().unwrap();
        assert_eq!(last(&c), "follow_line");
        assert_eq!(c.graph().current().id(), id('S'));
        assert_eq!(c.graph().previous().unwrap().id(), id('X'));

        c.on_waypoint().unwrap();
        assert_eq!(c.following(), None);
        assert_eq!(c.graph().current().id(), id('S'));
        assert_eq!(edge(&c, 'X', 'S'), EdgeStatus::Free);
        assert_eq!(last(&c), "scan_point");
    }

    #[test]
    fn test_line_missing_while_following_in_ideal_path() {
        let mut c = controller(NavigationMode::IdealPath);
        c.on_pong().unwrap();
        c.on_set_target("A").unwrap();
        c.on_turned_to_target_line().unwrap();
        assert_eq!(last(&c), "follow_line");

        c.on_line_missing().unwrap();
        assert_eq!(c.mode(), NavigationMode::PointScanning);
        assert_eq!(last(&c), "target_line_angle:0");
        assert_eq!(c.graph().current().id(), id('S'));

        c.on_turned_to_target_line().unwrap();
        c.on_waypoint().unwrap();
        assert_eq!(c.graph().current().id(), id('S'));
        assert_eq!(last(&c), "scan_point");
    }

    #[test]
    fn test_angle_folding_to_full_circle_is_accepted() {
        let mut c = controller(NavigationMode::IdealPath);
        c.on_pong().unwrap();
        c.on_set_target("I").unwrap();
        c.on_turned_to_target_line().unwrap();
        c.on_waypoint().unwrap();
        assert_eq!(c.turn_accumulator(), -60.0);
        c.on_line_missing().unwrap();
        assert_eq!(last(&c), "scan_point");

        // -60 + 59.99999999999999 folds to straight ahead, nearest is G
        c.on_angle(59.99999999999999).unwrap();
        assert_eq!(c.scanned_neighbors(), &[id('G')]);
        assert_eq!(edge(&c, 'S', 'G'), EdgeStatus::PotentiallyFree);
    }

    #[test]
    fn test_angle_out_of_range() {
        let mut c = controller(NavigationMode::PointScanning);
        c.on_pong().unwrap();
        c.on_set_target("A").unwrap();
        assert_eq!(
            c.on_angle(360.0),
            Err(NavError::BearingOutOfRange(360.0))
        );
        assert!(c.scanned_neighbors().is_empty());
        c.on_angle(359.999).unwrap();
        assert_eq!(c.scanned_neighbors(), &[id('S')]);
    }

    #[test]
    fn test_empty_scan_at_start_leaves_no_path() {
        let mut c = controller(NavigationMode::PointScanning);
        c.on_pong().unwrap();
        c.on_set_target("A").unwrap();
        assert_eq!(
            c.on_point_scanning_finished(),
            Err(NavError::NoPathLeft(id('A')))
        );
        assert_eq!(edge(&c, 'X', 'S'), EdgeStatus::Missing);
        assert_eq!(edge(&c, 'S', 'X'), EdgeStatus::Missing);
    }

    // =========================================================================
    // Cones, obstacles and stop
    // =========================================================================

    #[test]
    fn test_cone_blocks_waypoint_and_retreats() {
        let mut c = controller(NavigationMode::IdealPath);
        c.on_pong().unwrap();
        c.on_set_target("A").unwrap();
        c.on_turned_to_target_line().unwrap();
        c.on_waypoint().unwrap();
        c.on_turned_to_target_line().unwrap();
        assert_eq!(c.graph().current().id(), id('G'));
        let emitted = commands(&c).len();

        c.on_cone_detected().unwrap();
        assert_eq!(status(&c, 'G'), WaypointStatus::Blocked);
        assert_eq!(c.graph().current().id(), id('S'));
        assert_eq!(c.mode(), NavigationMode::PointScanning);
        assert_eq!(commands(&c).len(), emitted);

        // Back at S: scan and avoid G
        c.on_waypoint().unwrap();
        assert_eq!(last(&c), "scan_point");
        assert_eq!(status(&c, 'G'), WaypointStatus::Blocked);
        // Arrived from G, now facing 210
        for value in [90.0, 210.0, 330.0] {
            c.on_angle(value).unwrap();
        }
        assert_eq!(c.scanned_neighbors(), &[id('H'), id('F'), id('X')]);
        c.on_point_scanning_finished().unwrap();
        assert_eq!(c.pending_hop(), Some(id('F')));
        assert_eq!(last(&c), "target_line:1");
    }

    #[test]
    fn test_obstacle_marks_edge_only() {
        let mut c = controller(NavigationMode::IdealPath);
        c.on_pong().unwrap();
        c.on_set_target("A").unwrap();
        c.on_turned_to_target_line().unwrap();
        c.on_waypoint().unwrap();
        c.on_turned_to_target_line().unwrap();
        let emitted = commands(&c).len();

        c.on_obstacle_detected().unwrap();
        assert_eq!(edge(&c, 'S', 'G'), EdgeStatus::Obstructed);
        assert_eq!(edge(&c, 'G', 'S'), EdgeStatus::Obstructed);
        assert_eq!(status(&c, 'G'), WaypointStatus::Unknown);
        assert_eq!(c.graph().current().id(), id('G'));
        assert_eq!(commands(&c).len(), emitted);

        // Arriving anyway keeps the obstruction
        c.on_waypoint().unwrap();
        assert_eq!(edge(&c, 'S', 'G'), EdgeStatus::Obstructed);
    }

    #[test]
    fn test_stop_ignores_later_events() {
        let mut c = controller(NavigationMode::IdealPath);
        c.on_pong().unwrap();
        c.on_set_target("A").unwrap();
        c.on_stop();
        assert!(c.is_stopped());
        let emitted = commands(&c).len();

        c.on_turned_to_target_line().unwrap();
        c.on_waypoint().unwrap();
        c.on_set_target("B").unwrap();
        c.on_angle(0.0).unwrap();
        assert_eq!(commands(&c).len(), emitted);
        assert_eq!(c.graph().current().id(), id('X'));
        assert_eq!(c.target(), Some(id('A')));
        assert_eq!(c.state(), NavigationState::Stopped);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(NavigationMode::IdealPath.to_string(), "ideal-path");
        assert_eq!(
            "point-scanning".parse::<NavigationMode>().unwrap(),
            NavigationMode::PointScanning
        );
        assert!("scan".parse::<NavigationMode>().is_err());
        assert_eq!(NavigationMode::default(), NavigationMode::IdealPath);
    }
}
