//! Belief status of waypoints and edges
//!
//! Statuses come in two confidence levels. Confirmed statuses are established
//! by the vehicle itself (arriving at a node, hitting a cone or an obstacle,
//! or an exhaustive scan that found nothing). `Potentially*` statuses come from
//! the camera and may be overturned later, either by a confirmed status or by
//! the belief reset performed when no path is left.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{NavError, Result};

/// Cost of an edge that does not exist. Large enough that no realistic path
/// sum through confirmed edges ever reaches it.
pub const MISSING_COST: i64 = 9_999_999;

/// Cost of an edge the camera believes does not exist.
pub const POTENTIALLY_MISSING_COST: i64 = 9_999_998;

/// Belief about a waypoint
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum WaypointStatus {
    Unknown = 0,
    PotentiallyFree = 1,
    PotentiallyBlocked = 2,
    Free = 3,
    Blocked = 4,
}

impl Default for WaypointStatus {
    fn default() -> Self {
        WaypointStatus::Unknown
    }
}

impl WaypointStatus {
    /// Parse a status name such as `POTENTIALLY_BLOCKED`
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| NavError::InvalidStatus(format!("waypoint status {}", name)))
    }

    /// Numeric value of the status
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// FREE and BLOCKED are only ever set from physical evidence
    pub fn is_confirmed(&self) -> bool {
        matches!(self, WaypointStatus::Free | WaypointStatus::Blocked)
    }

    /// Blocked nodes, confirmed or not, are never visited by the search
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            WaypointStatus::Blocked | WaypointStatus::PotentiallyBlocked
        )
    }

    /// Status after a camera observation: the observation wins unless the
    /// current status is confirmed.
    pub fn refined(self, sensed: WaypointStatus) -> WaypointStatus {
        if self.is_confirmed() {
            self
        } else {
            sensed
        }
    }
}

/// Belief about a directed edge
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeStatus {
    Unknown,
    Obstructed,
    Free,
    Missing,
    PotentiallyObstructed,
    PotentiallyFree,
    PotentiallyMissing,
}

impl Default for EdgeStatus {
    fn default() -> Self {
        EdgeStatus::Unknown
    }
}

impl EdgeStatus {
    /// Parse a status name such as `POTENTIALLY_OBSTRUCTED`
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| NavError::InvalidStatus(format!("edge status {}", name)))
    }

    /// Base traversal cost of an edge in this status.
    ///
    /// An UNKNOWN edge costs at least 40 more than a FREE edge of the same length.
    pub fn value(&self) -> i64 {
        match self {
            EdgeStatus::Unknown => 140,
            EdgeStatus::Obstructed => 130,
            EdgeStatus::Free => 100,
            EdgeStatus::Missing => MISSING_COST,
            EdgeStatus::PotentiallyObstructed => 120,
            EdgeStatus::PotentiallyFree => 110,
            EdgeStatus::PotentiallyMissing => POTENTIALLY_MISSING_COST,
        }
    }

    /// FREE and OBSTRUCTED survive camera observations.
    ///
    /// MISSING is confirmed too, but only as far as the search is concerned:
    /// a camera observation may still overwrite it.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, EdgeStatus::Free | EdgeStatus::Obstructed)
    }

    /// Edges the search never relaxes
    pub fn is_missing(&self) -> bool {
        matches!(self, EdgeStatus::Missing | EdgeStatus::PotentiallyMissing)
    }

    /// Camera-derived statuses, reset to UNKNOWN during recovery
    pub fn is_potential(&self) -> bool {
        matches!(
            self,
            EdgeStatus::PotentiallyObstructed
                | EdgeStatus::PotentiallyFree
                | EdgeStatus::PotentiallyMissing
        )
    }

    /// Status after a camera observation
    pub fn refined(self, sensed: EdgeStatus) -> EdgeStatus {
        if self.is_confirmed() {
            self
        } else {
            sensed
        }
    }
}
