//! Inbound line protocol.
//!
//! The vehicle and the operator send one message per line:
//!
//! | Message                   | Event                                   |
//! |---------------------------|-----------------------------------------|
//! | `pong`                    | link check answered                     |
//! | `waypoint`                | arrived at the next waypoint            |
//! | `angle:<deg>`             | line seen during a point scan           |
//! | `point_scanning_finished` | point scan complete                     |
//! | `turned_to_target_line`   | facing the commanded line               |
//! | `cone_detected`           | cone on the waypoint ahead              |
//! | `obstacle_detected`       | obstacle on the current line            |
//! | `line_missing`            | commanded line not found                |
//! | `stop`                    | terminate                               |
//! | `target:<ID>`             | operator selected a destination         |
//!
//! Outbound commands are the `Display` form of [`waynav_core::Command`].

use std::str::FromStr;
use thiserror::Error;
use waynav_core::{Emitter, NavigationController, ObjectDetector};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Empty message")]
    Empty,

    #[error("Unknown message {0:?}")]
    UnknownMessage(String),

    #[error("Invalid angle {0:?}")]
    InvalidAngle(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Pong,
    Waypoint,
    Angle(f64),
    PointScanningFinished,
    TurnedToTargetLine,
    ConeDetected,
    ObstacleDetected,
    LineMissing,
    Stop,
    Target(String),
}

impl FromStr for Event {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }

        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            return match name.trim() {
                "angle" => value
                    .parse::<f64>()
                    .map(Event::Angle)
                    .map_err(|_| ProtocolError::InvalidAngle(value.to_string())),
                "target" => Ok(Event::Target(value.to_string())),
                _ => Err(ProtocolError::UnknownMessage(line.to_string())),
            };
        }

        match line {
            "pong" => Ok(Event::Pong),
            "waypoint" => Ok(Event::Waypoint),
            "point_scanning_finished" => Ok(Event::PointScanningFinished),
            "turned_to_target_line" => Ok(Event::TurnedToTargetLine),
            "cone_detected" => Ok(Event::ConeDetected),
            "obstacle_detected" => Ok(Event::ObstacleDetected),
            "line_missing" => Ok(Event::LineMissing),
            "stop" => Ok(Event::Stop),
            _ => Err(ProtocolError::UnknownMessage(line.to_string())),
        }
    }
}

impl Event {
    /// Hand the event to the matching controller handler
    pub fn dispatch<E: Emitter, D: ObjectDetector>(
        &self,
        controller: &mut NavigationController<E, D>,
    ) -> waynav_core::Result<()> {
        match self {
            Event::Pong => controller.on_pong(),
            Event::Waypoint => controller.on_waypoint(),
            Event::Angle(value) => controller.on_angle(*value),
            Event::PointScanningFinished => controller.on_point_scanning_finished(),
            Event::TurnedToTargetLine => controller.on_turned_to_target_line(),
            Event::ConeDetected => controller.on_cone_detected(),
            Event::ObstacleDetected => controller.on_obstacle_detected(),
            Event::LineMissing => controller.on_line_missing(),
            Event::Stop => {
                controller.on_stop();
                Ok(())
            }
            Event::Target(id) => controller.on_set_target(id),
        }
    }
}
