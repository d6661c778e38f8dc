//! # Waynav Core
//!
//! Platform-independent waypoint navigation for a line following vehicle.
//!
//! This crate contains the belief graph, the shortest path replanning and the
//! navigation state machine with **zero I/O dependencies**. The vehicle link
//! and the camera are reached through the [`Emitter`] and [`ObjectDetector`]
//! traits, so the same logic runs against a serial device, a simulator or
//! the unit tests.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  waynav-core (platform-independent, no tokio/async deps)    │
//! │  ├── status/     (waypoint and edge beliefs)                │
//! │  ├── edge/       (directed edges, weights, bearings)        │
//! │  ├── waypoint/   (nodes, bearing resolution)                │
//! │  ├── topology/   (static course description)                │
//! │  ├── graph/      (Dijkstra search and recovery)             │
//! │  ├── controller/ (navigation state machine)                 │
//! │  └── io          (Emitter, ObjectDetector)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              ▲
//!                 ┌────────────┴────────────┐
//!                 │  waynav                 │
//!                 │  (serial link, CLI)     │
//!                 └─────────────────────────┘
//! ```
//!
//! ## Example: Planning a route
//!
//! ```rust
//! use waynav_core::{Graph, TopologyConfig, WaypointId};
//!
//! let mut graph = Graph::new(&TopologyConfig::canonical()).unwrap();
//! let a: WaypointId = "A".parse().unwrap();
//! graph.set_target(a).unwrap();
//!
//! // From the start every route goes through S
//! assert_eq!(graph.next_best_waypoint().unwrap().to_string(), "S");
//! ```
//!
//! ## Example: Driving the controller
//!
//! ```rust
//! use waynav_core::{
//!     Command, EdgeStatus, Emitter, Graph, NavigationController, NavigationMode,
//!     ObjectDetector, TopologyConfig, WaypointStatus,
//! };
//!
//! struct Log(Vec<String>);
//! impl Emitter for Log {
//!     fn emit(&mut self, command: Command) {
//!         self.0.push(command.to_string());
//!     }
//! }
//!
//! struct Camera;
//! impl ObjectDetector for Camera {
//!     fn detect(&mut self) -> (WaypointStatus, EdgeStatus) {
//!         (WaypointStatus::PotentiallyFree, EdgeStatus::PotentiallyFree)
//!     }
//! }
//!
//! let graph = Graph::new(&TopologyConfig::canonical()).unwrap();
//! let mut controller =
//!     NavigationController::new(graph, Log(Vec::new()), Camera, NavigationMode::IdealPath);
//! controller.on_set_target("A").unwrap();
//! controller.on_pong().unwrap();
//! assert_eq!(controller.emitter().0, vec!["ping", "target_line_angle:0"]);
//! ```

pub mod controller;
pub mod edge;
pub mod error;
pub mod graph;
pub mod io;
pub mod status;
pub mod topology;
pub mod waypoint;

// Re-export commonly used types
pub use controller::{NavigationController, NavigationMode, NavigationState};
pub use edge::{Angle, Edge};
pub use error::{NavError, Result};
pub use graph::Graph;
pub use io::{Command, Emitter, ObjectDetector};
pub use status::{EdgeStatus, WaypointStatus};
pub use topology::{NeighborConfig, TopologyConfig, WaypointConfig};
pub use waypoint::{Waypoint, WaypointId};
