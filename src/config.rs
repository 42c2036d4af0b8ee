//! Launcher configuration
//!
//! Read from `$GAMEDECK_CONFIG` or `<config dir>/gamedeck/launcher.toml`. A
//! missing file is not an error: the launcher falls back to the defaults for
//! the board it was built for, so a fresh SD card still boots into the menu.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::topology::Connector;

pub const CONFIG_ENV: &str = "GAMEDECK_CONFIG";
const CONFIG_DIR: &str = "gamedeck";
const CONFIG_FILE: &str = "launcher.toml";

const DEFAULT_CATALOG_PATH: &str = "/boot/uboot/beaglesnes/games.xml";

/// Highest menu frame rate accepted
pub const MAX_FRAME_RATE: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Boards with known USB connector layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoardProfile {
    #[default]
    BeagleboneBlack,
    BeagleboardXm,
}

impl BoardProfile {
    /// udev `by-path` links for every connector a controller can sit behind
    pub fn connectors(self) -> Vec<Connector> {
        match self {
            // host port feeds player 1, the two hub ports below it feed
            // players 1 and 2
            BoardProfile::BeagleboneBlack => vec![
                Connector::new(
                    "/dev/input/by-path/platform-musb-hdrc.1.auto-usb-0:1:1.0-joystick",
                    0,
                ),
                Connector::new(
                    "/dev/input/by-path/platform-musb-hdrc.1.auto-usb-0:1.1:1.0-joystick",
                    0,
                ),
                Connector::new(
                    "/dev/input/by-path/platform-musb-hdrc.1.auto-usb-0:1.2:1.0-joystick",
                    1,
                ),
            ],
            BoardProfile::BeagleboardXm => vec![
                Connector::new("/dev/input/by-path/platform-ehci-omap.0-usb-0:2.2:1.0-joystick", 0),
                Connector::new("/dev/input/by-path/platform-ehci-omap.0-usb-0:2.4:1.0-joystick", 1),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub catalog_path: PathBuf,
    /// Menu frames per second
    pub frame_rate: u32,
    pub players: usize,
    pub board: BoardProfile,
    /// Overrides the board's connector list when set
    pub connectors: Option<Vec<Connector>>,
    /// Raw button codes on player 1's pad that launch the selected game
    pub select_button: Option<u32>,
    pub start_button: Option<u32>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            frame_rate: 40,
            players: 2,
            board: BoardProfile::default(),
            connectors: None,
            select_button: None,
            start_button: None,
        }
    }
}

impl LauncherConfig {
    /// Connectors to watch: the explicit list, or the board's layout
    pub fn connectors(&self) -> Vec<Connector> {
        self.connectors
            .clone()
            .unwrap_or_else(|| self.board.connectors())
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_FRAME_RATE).contains(&self.frame_rate) {
            return Err(ConfigError::Invalid(format!(
                "frame_rate must be between 1 and {}",
                MAX_FRAME_RATE
            )));
        }
        if self.players == 0 {
            return Err(ConfigError::Invalid("players must be at least 1".into()));
        }
        let connectors = self.connectors();
        if let Some(connector) = connectors.iter().find(|c| c.player >= self.players) {
            return Err(ConfigError::Invalid(format!(
                "connector {} feeds player {}, but only {} players are configured",
                connector.path.display(),
                connector.player + 1,
                self.players
            )));
        }
        Ok(())
    }

    /// Loads `path`, or the defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                info!("Loading launcher configuration from {}", path.display());
                Self::parse(path, &text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path())
    }
}

/// `$GAMEDECK_CONFIG`, else the per-user config directory, else the working
/// directory
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    let path = dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    debug!("Configuration path: {}", path.display());
    path
}
