//! Error types for graph search and navigation

use thiserror::Error;

use crate::waypoint::WaypointId;

/// Errors raised by the waypoint graph and the navigation controller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavError {
    /// Waypoint id is not a single uppercase letter
    #[error("Invalid waypoint id {0:?}: expected a single uppercase letter")]
    InvalidWaypointId(String),

    /// Waypoint id is well formed but not part of the topology
    #[error("Waypoint with id {0} does not exist")]
    UnknownWaypoint(WaypointId),

    /// Sensed bearing outside of [0, 360)
    #[error("Bearing {0} is not in the range of [0, 360)")]
    BearingOutOfRange(f64),

    /// Status name not recognized
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// A path was requested before a target was set
    #[error("No target waypoint set")]
    NoTarget,

    /// A next hop was requested while standing on the target
    #[error("Already at target waypoint {0}")]
    AlreadyAtTarget(WaypointId),

    /// Target unreachable even after resetting all camera beliefs once
    #[error("No path left to target waypoint {0}")]
    NoPathLeft(WaypointId),

    /// Waypoint has no angle toward the given neighbor.
    ///
    /// Cannot happen with a validated topology; callers treat it as a defect.
    #[error("Waypoint {from} has no angle toward {to}")]
    MissingAngle { from: WaypointId, to: WaypointId },

    /// Topology configuration is inconsistent
    #[error("Invalid topology: {0}")]
    Topology(String),
}

pub type Result<T> = std::result::Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn id(c: char) -> WaypointId {
        WaypointId::new(c).unwrap()
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            NavError::UnknownWaypoint(id('Z')).to_string(),
            "Waypoint with id Z does not exist"
        );
        assert_eq!(
            NavError::BearingOutOfRange(360.0).to_string(),
            "Bearing 360 is not in the range of [0, 360)"
        );
        assert_eq!(
            NavError::MissingAngle {
                from: id('S'),
                to: id('A')
            }
            .to_string(),
            "Waypoint S has no angle toward A"
        );
    }
}
