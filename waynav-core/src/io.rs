//! Collaborator traits for platform-independent navigation code.
//!
//! The core never touches a serial port or a camera. The navigation controller
//! talks to the outside world through two traits:
//!
//! - [`Emitter`] sends movement commands to the vehicle (fire-and-forget)
//! - [`ObjectDetector`] turns the current camera view into a belief pair
//!
//! Both are synchronous. The shell adapts its async reader and its device
//! writer to them, so the same controller runs against real hardware, a
//! simulator on stdin/stdout, or the test doubles in the unit tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use waynav_core::io::{Command, Emitter};
//!
//! struct Printer;
//!
//! impl Emitter for Printer {
//!     fn emit(&mut self, command: Command) {
//!         println!("{}", command);
//!     }
//! }
//! ```

use std::fmt;

use crate::graph::Graph;
use crate::status::{EdgeStatus, WaypointStatus};

// =============================================================================
// Outbound commands
// =============================================================================

/// Command sent to the vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Link check, answered with `pong`
    Ping,
    /// Turn onto the line at this position in the last point scan
    TargetLine(usize),
    /// Turn by this many degrees, negative is counterclockwise
    TargetLineAngle(f64),
    FollowLine,
    /// Rotate in place and report every line seen
    ScanPoint,
    TargetReached,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Ping => write!(f, "ping"),
            Command::TargetLine(index) => write!(f, "target_line:{}", index),
            // Adding zero folds -0 into 0
            Command::TargetLineAngle(degrees) => write!(f, "target_line_angle:{}", degrees + 0.0),
            Command::FollowLine => write!(f, "follow_line"),
            Command::ScanPoint => write!(f, "scan_point"),
            Command::TargetReached => write!(f, "target_reached"),
        }
    }
}

// =============================================================================
// Collaborator traits
// =============================================================================

/// Outbound command channel.
///
/// Sending must not block on the vehicle. Transport errors are the
/// implementation's concern; the controller observes no acknowledgment.
pub trait Emitter {
    fn emit(&mut self, command: Command);
}

/// Camera based belief source.
pub trait ObjectDetector {
    /// Belief about the neighbor waypoint and the edge currently in view
    fn detect(&mut self) -> (WaypointStatus, EdgeStatus);

    /// Populate the initial belief state once a target is set.
    ///
    /// The default leaves the graph as constructed.
    fn start_up_process_detect(&mut self, _graph: &mut Graph) {}
}

impl<E: Emitter + ?Sized> Emitter for &mut E {
    fn emit(&mut self, command: Command) {
        (**self).emit(command)
    }
}

impl<D: ObjectDetector + ?Sized> ObjectDetector for &mut D {
    fn detect(&mut self) -> (WaypointStatus, EdgeStatus) {
        (**self).detect()
    }

    fn start_up_process_detect(&mut self, graph: &mut Graph) {
        (**self).start_up_process_detect(graph)
    }
}
