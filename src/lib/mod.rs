//! # Waynav
//!
//! Waypoint navigation controller for a line following vehicle.
//!
//! This crate is the native shell around [`waynav_core`]:
//! - loads and validates the JSON configuration
//! - reads vehicle messages line by line from a serial device or stdin
//! - feeds them to the [`NavigationController`] one at a time
//! - writes the resulting commands back to the device or stdout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                        waynav                           │
//! │  ┌─────────────┐   ┌──────────────┐   ┌──────────────┐  │
//! │  │ config      │   │ protocol     │   │ link         │  │
//! │  │ (serde)     │   │ (line → Event│   │ (LineEmitter)│  │
//! │  └──────┬──────┘   └──────┬───────┘   └──────▲───────┘  │
//! │         ▼                 ▼                  │          │
//! │  ┌─────────────────────────────────────────────────────┐│
//! │  │  Session: tokio line loop, one event at a time      ││
//! │  │  └── waynav_core::NavigationController              ││
//! │  └─────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Command-Line Interface
//!
//! See [`Cli`] for all available options. Key options:
//!
//! - `-c, --config` - Configuration file (default: platform config dir)
//! - `-t, --target` - Target waypoint to drive to right away
//! - `-m, --mode` - `ideal-path` or `point-scanning`
//! - `-d, --device` - Vehicle link device, `-` for stdin/stdout
//! - `-v` - Increase verbosity (use multiple times)

use clap::Parser;
use log::{debug, error, info, warn};
use miette::{IntoDiagnostic, Result};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use waynav_core::{
    Emitter, Graph, NavError, NavigationController, NavigationMode, ObjectDetector, WaypointId,
};

pub mod config;
pub mod detector;
pub mod link;
pub mod protocol;

use config::{Config, STDIO_DEVICE};
use detector::{FixedDetector, ScriptedDetector};
use link::LineEmitter;
use protocol::{Event, ProtocolError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Clone, Debug)]
#[command(version, about)]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target waypoint, set on start up
    #[arg(short, long)]
    pub target: Option<String>,

    /// Navigation mode, overrides the configuration
    #[arg(short, long)]
    pub mode: Option<NavigationMode>,

    /// Vehicle link device, `-` for stdin/stdout. Overrides the configuration
    #[arg(short, long)]
    pub device: Option<String>,

    /// Start driving without the ping/pong link check
    #[arg(long, default_value_t = false)]
    pub skip_ping: bool,

    /// Beliefs reported for the first lines seen, as WAYPOINT_STATUS/EDGE_STATUS
    #[arg(long, value_delimiter = ',')]
    pub detections: Vec<String>,

    /// Waypoint belief reported once the detections are used up
    #[arg(long, default_value = "POTENTIALLY_FREE")]
    pub waypoint_belief: String,

    /// Edge belief reported once the detections are used up
    #[arg(long, default_value = "POTENTIALLY_FREE")]
    pub edge_belief: String,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The vehicle or the operator sent `stop`
    Stopped,
    /// The link closed
    EndOfInput,
    Interrupted,
    /// The target cannot be reached on confirmed information
    NoPathLeft(WaypointId),
}

pub struct Session<E, D> {
    controller: NavigationController<E, D>,
    handled: usize,
}

impl<E: Emitter, D: ObjectDetector> Session<E, D> {
    pub fn new(config: &Config, mode: NavigationMode, emitter: E, detector: D) -> Result<Self> {
        let graph = Graph::new(&config.topology).into_diagnostic()?;
        info!(
            "Session with {} waypoints, start {}, {}",
            graph.waypoints().len(),
            graph.current().id(),
            mode
        );
        Ok(Self {
            controller: NavigationController::new(graph, emitter, detector, mode),
            handled: 0,
        })
    }

    pub fn controller(&self) -> &NavigationController<E, D> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut NavigationController<E, D> {
        &mut self.controller
    }

    /// Number of events handed to the controller
    pub fn handled(&self) -> usize {
        self.handled
    }

    /// Set the first target, e.g. from the command line
    pub fn start(&mut self, target: &str) -> Result<Option<Outcome>> {
        self.apply(&Event::Target(target.to_string()), target)
    }

    /// Handle one inbound line. Returns the outcome once the session is over.
    pub fn handle_line(&mut self, line: &str) -> Result<Option<Outcome>> {
        let event = match line.parse::<Event>() {
            Ok(event) => event,
            Err(ProtocolError::Empty) => return Ok(None),
            Err(e) => {
                warn!("{}", e);
                return Ok(None);
            }
        };
        debug!("Received {:?}", event);
        self.apply(&event, line.trim())
    }

    fn apply(&mut self, event: &Event, line: &str) -> Result<Option<Outcome>> {
        self.handled += 1;
        match event.dispatch(&mut self.controller) {
            Ok(()) => {}
            Err(NavError::NoPathLeft(target)) => {
                error!("No path left to target {}", target);
                return Ok(Some(Outcome::NoPathLeft(target)));
            }
            Err(e @ NavError::MissingAngle { .. }) => {
                return Err(e).into_diagnostic();
            }
            Err(e) => warn!("Ignoring {}: {}", line, e),
        }
        if self.controller.is_stopped() {
            return Ok(Some(Outcome::Stopped));
        }
        Ok(None)
    }

    /// Handle lines until the session is over or the input ends
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, reader: R) -> Result<Outcome> {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await.into_diagnostic()? {
            if let Some(outcome) = self.handle_line(&line)? {
                return Ok(outcome);
            }
        }
        info!("End of input after {} events", self.handled);
        Ok(Outcome::EndOfInput)
    }
}

type DeviceReader = Box<dyn AsyncBufRead + Unpin + Send>;
type DeviceEmitter = LineEmitter<Box<dyn Write + Send>>;

fn open_link(device: &str) -> Result<(DeviceReader, DeviceEmitter)> {
    if device == STDIO_DEVICE {
        info!("Vehicle link on stdin/stdout");
        return Ok((
            Box::new(BufReader::new(tokio::io::stdin())),
            link::stdout(),
        ));
    }
    let path = PathBuf::from(device);
    let emitter = link::open_device(&path).into_diagnostic()?;
    let file = std::fs::File::open(&path).into_diagnostic()?;
    info!("Vehicle link on {}", path.display());
    Ok((
        Box::new(BufReader::new(tokio::fs::File::from_std(file))),
        emitter,
    ))
}

fn build_detector(args: &Cli) -> Result<ScriptedDetector> {
    let fallback =
        FixedDetector::from_names(&args.waypoint_belief, &args.edge_belief).into_diagnostic()?;
    let detector = ScriptedDetector::parse(args.detections.iter().map(String::as_str))
        .into_diagnostic()?
        .with_fallback(fallback);
    Ok(detector)
}

/// Load the configuration, open the link and run a session until it ends
pub async fn run(args: Cli) -> Result<Outcome> {
    let config = Config::load_or_default(args.config.as_deref()).into_diagnostic()?;
    let mode = args.mode.unwrap_or(config.navigation.mode);
    let device = args
        .device
        .clone()
        .unwrap_or_else(|| config.communication.device.clone());
    info!(
        "Expecting {} preconfigured at {} baud",
        device, config.communication.baud
    );
    debug!("Tolerances {:?}", config.tolerances);

    let (reader, emitter) = open_link(&device)?;
    let detector = build_detector(&args)?;
    let mut session = Session::new(&config, mode, emitter, detector)?;
    if args.skip_ping {
        session.controller_mut().assume_link_verified();
    }
    if let Some(target) = &args.target {
        if let Some(outcome) = session.start(target)? {
            return Ok(outcome);
        }
    }

    tokio::select! {
        outcome = session.run(reader) => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            Ok(Outcome::Interrupted)
        }
    }
}
