//! Object detectors usable without a camera.

use log::debug;
use std::collections::VecDeque;
use waynav_core::{EdgeStatus, ObjectDetector, Result, WaypointStatus};

/// Reports the same belief for every line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDetector {
    waypoint: WaypointStatus,
    edge: EdgeStatus,
}

impl Default for FixedDetector {
    fn default() -> Self {
        Self::new(WaypointStatus::PotentiallyFree, EdgeStatus::PotentiallyFree)
    }
}

impl FixedDetector {
    pub fn new(waypoint: WaypointStatus, edge: EdgeStatus) -> Self {
        Self { waypoint, edge }
    }

    /// Build from status names such as `POTENTIALLY_FREE`
    pub fn from_names(waypoint: &str, edge: &str) -> Result<Self> {
        Ok(Self::new(
            WaypointStatus::from_name(waypoint)?,
            EdgeStatus::from_name(edge)?,
        ))
    }
}

impl ObjectDetector for FixedDetector {
    fn detect(&mut self) -> (WaypointStatus, EdgeStatus) {
        (self.waypoint, self.edge)
    }
}

/// Replays a queue of beliefs, then falls back to a fixed one
#[derive(Debug, Clone, Default)]
pub struct ScriptedDetector {
    script: VecDeque<(WaypointStatus, EdgeStatus)>,
    fallback: FixedDetector,
}

impl ScriptedDetector {
    pub fn new(
        script: impl IntoIterator<Item = (WaypointStatus, EdgeStatus)>,
        fallback: FixedDetector,
    ) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback,
        }
    }

    /// Parse `WAYPOINT_STATUS/EDGE_STATUS` entries
    pub fn parse<'a>(entries: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut script = VecDeque::new();
        for entry in entries {
            let (waypoint, edge) = entry.split_once('/').unwrap_or((entry, "UNKNOWN"));
            script.push_back((
                WaypointStatus::from_name(waypoint.trim())?,
                EdgeStatus::from_name(edge.trim())?,
            ));
        }
        Ok(Self {
            script,
            fallback: FixedDetector::default(),
        })
    }

    pub fn with_fallback(mut self, fallback: FixedDetector) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl ObjectDetector for ScriptedDetector {
    fn detect(&mut self) -> (WaypointStatus, EdgeStatus) {
        match self.script.pop_front() {
            Some(belief) => belief,
            None => {
                debug!("Detector script exhausted");
                self.fallback.detect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waynav_core::NavError;

    #[test]
    fn test_fixed_detector_default() {
        let mut detector = FixedDetector::default();
        assert_eq!(
            detector.detect(),
            (WaypointStatus::PotentiallyFree, EdgeStatus::PotentiallyFree)
        );
    }

    #[test]
    fn test_fixed_detector_from_names() {
        let mut detector = FixedDetector::from_names("POTENTIALLY_BLOCKED", "MISSING").unwrap();
        assert_eq!(
            detector.detect(),
            (WaypointStatus::PotentiallyBlocked, EdgeStatus::Missing)
        );
        assert!(matches!(
            FixedDetector::from_names("CLEAR", "FREE"),
            Err(NavError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_scripted_detector_replays_then_falls_back() {
        let mut detector =
            ScriptedDetector::parse(["FREE/OBSTRUCTED", "POTENTIALLY_BLOCKED"]).unwrap();
        assert_eq!(detector.remaining(), 2);
        assert_eq!(
            detector.detect(),
            (WaypointStatus::Free, EdgeStatus::Obstructed)
        );
        assert_eq!(
            detector.detect(),
            (WaypointStatus::PotentiallyBlocked, EdgeStatus::Unknown)
        );
        assert_eq!(
            detector.detect(),
            (WaypointStatus::PotentiallyFree, EdgeStatus::PotentiallyFree)
        );
        assert_eq!(detector.remaining(), 0);
    }

    #[test]
    fn test_scripted_detector_rejects_bad_entries() {
        assert!(ScriptedDetector::parse(["FREE/SOMETIMES"]).is_err());
    }
}
