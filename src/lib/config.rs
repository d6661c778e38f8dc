//! Configuration file handling.
//!
//! The configuration is a single JSON document:
//!
//! ```json
//! {
//!   "communication": { "device": "/dev/ttyAMA1", "baud": 115200 },
//!   "tolerances": { "waypoint": 200, "obstacle": 100, "edge_x": 20, "edge_y": 20 },
//!   "navigation": { "mode": "ideal-path" },
//!   "topology": { "start": "X", "waypoints": [ ... ] }
//! }
//! ```
//!
//! Every section is optional. A missing section takes its default, a missing
//! topology is the nine waypoint course.
//!
//! `communication.baud` is not applied to the device: configure the serial
//! port before starting, e.g. with `stty`.
//!
//! Default path: `~/.config/waynav/waynav.json` (platform specific, see
//! [`get_project_dirs`]).

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use waynav_core::{NavError, NavigationMode, TopologyConfig};

pub const CONFIG_FILE_NAME: &str = "waynav.json";

/// Device value meaning stdin/stdout
pub const STDIO_DEVICE: &str = "-";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Topology(#[from] NavError),
}

pub fn get_project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "waynav", "waynav")
}

/// Location of the configuration file when none is given on the command line
pub fn default_config_path() -> Option<PathBuf> {
    get_project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationConfig {
    /// Serial device of the vehicle link, `-` for stdin/stdout
    pub device: String,
    /// Line speed the device is expected to run at. The port is opened as a
    /// plain file, so it must already be set to this speed (`stty -F <device>
    /// <baud> raw`); the value is only checked for zero and logged.
    pub baud: u32,
}

impl Default for CommunicationConfig {
    fn default() -> Self {
        Self {
            device: STDIO_DEVICE.to_string(),
            baud: 115_200,
        }
    }
}

/// Pixel tolerances of the camera detectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    pub waypoint: i32,
    pub obstacle: i32,
    pub edge_x: i32,
    pub edge_y: i32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            waypoint: 200,
            obstacle: 100,
            edge_x: 20,
            edge_y: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub mode: NavigationMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub communication: CommunicationConfig,
    pub tolerances: Tolerances,
    pub navigation: NavigationConfig,
    pub topology: TopologyConfig,
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Config =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
                path: path.to_owned(),
                source,
            })?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else the default file if it exists, else the
    /// built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            Some(path) => {
                debug!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                debug!("No home directory, using default configuration");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.communication.device.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "communication.device is empty".to_string(),
            ));
        }
        if self.communication.baud == 0 {
            return Err(ConfigError::Invalid("communication.baud is 0".to_string()));
        }
        let tolerances = [
            ("waypoint", self.tolerances.waypoint),
            ("obstacle", self.tolerances.obstacle),
            ("edge_x", self.tolerances.edge_x),
            ("edge_y", self.tolerances.edge_y),
        ];
        for (name, value) in tolerances {
            if value < 0 {
                return Err(ConfigError::Invalid(format!(
                    "tolerances.{} must not be negative, got {}",
                    name, value
                )));
            }
        }
        self.topology.validate()?;
        Ok(())
    }
}
