//! Controller hot-plug monitor
//!
//! Tracks which physical connectors (the host USB port, individual hub
//! ports) have a controller behind them and which OS device currently backs
//! each logical player.
//!
//! # Architecture
//!
//! ```text
//! Connector paths ──► ConnectorProbe ──► presence table ──► DeviceSlot per player
//!  (stable key)       (readlink)         (per frame)         (unstable handle)
//!                                              │
//!                                    any transition?
//!                                              ▼
//!                                 DeviceSubsystem restart (once per poll)
//! ```
//!
//! Connector position is the stable identity; the OS device index is
//! re-resolved whenever the topology changes so the input dispatcher never
//! acts on a stale handle.

pub mod probe;
pub mod subsystem;

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

pub use probe::{ConnectorProbe, LinkProbe};
pub use subsystem::{DeviceSubsystem, GilrsSubsystem, SubsystemError};

/// OS-assigned device index (the `N` in `jsN`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceHandle(pub usize);

/// A physical connector and the logical player it feeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub path: PathBuf,
    pub player: usize,
}

impl Connector {
    pub fn new(path: impl Into<PathBuf>, player: usize) -> Self {
        Self {
            path: path.into(),
            player,
        }
    }
}

/// Logical player slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceSlot {
    present: bool,
    device: Option<DeviceHandle>,
}

impl DeviceSlot {
    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn device(&self) -> Option<DeviceHandle> {
        self.device
    }

    fn attach(&mut self, handle: DeviceHandle) {
        self.present = true;
        self.device = Some(handle);
    }

    fn detach(&mut self) {
        self.present = false;
        self.device = None;
    }
}

/// A connector changing state between two polls
#[derive(Debug, Clone)]
pub struct Transition {
    pub connector: usize,
    pub player: usize,
    pub plugged: bool,
    pub timestamp: DateTime<Local>,
}

/// Outcome of one detection pass
#[derive(Debug, Clone, Default)]
pub struct PollReport {
    pub transitions: Vec<Transition>,
    pub restarted: bool,
}

impl PollReport {
    pub fn changed(&self) -> bool {
        !self.transitions.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// The input backend could not be brought back after a topology change.
    /// All player slots read as empty until the next change.
    #[error("Input subsystem restart failed: {0}")]
    InputSubsystemRestartFailed(#[source] SubsystemError),

    #[error("Connector {path} feeds player {player}, but only {players} players exist")]
    InvalidConnector {
        path: String,
        player: usize,
        players: usize,
    },
}

/// Presence table over all connectors plus the player → device map
pub struct DeviceTopology<P: ConnectorProbe, D: DeviceSubsystem> {
    connectors: Vec<Connector>,
    plugged: Vec<bool>,
    slots: Vec<DeviceSlot>,
    probe: P,
    subsystem: D,
    restarts: usize,
    input_available: bool,
}

impl<P: ConnectorProbe, D: DeviceSubsystem> DeviceTopology<P, D> {
    pub fn new(
        connectors: Vec<Connector>,
        players: usize,
        probe: P,
        subsystem: D,
    ) -> Result<Self, TopologyError> {
        if let Some(bad) = connectors.iter().find(|c| c.player >= players) {
            return Err(TopologyError::InvalidConnector {
                path: bad.path.display().to_string(),
                player: bad.player,
                players,
            });
        }
        debug!(
            "Watching {} connectors for {} players",
            connectors.len(),
            players
        );

        Ok(Self {
            plugged: vec![false; connectors.len()],
            slots: vec![DeviceSlot::default(); players],
            connectors,
            probe,
            subsystem,
            restarts: 0,
            input_available: false,
        })
    }

    /// Forgets everything and runs a fresh detection pass.
    pub fn reset(&mut self) -> Result<PollReport, TopologyError> {
        info!("Resetting controller topology");
        self.plugged.fill(false);
        self.slots.fill(DeviceSlot::default());
        self.poll_once()
    }

    /// Probes every connector once and restarts the input backend if anything
    /// changed since the previous poll.
    pub fn poll_once(&mut self) -> Result<PollReport, TopologyError> {
        let mut report = PollReport::default();
        let mut identities = Vec::with_capacity(self.connectors.len());

        for (index, connector) in self.connectors.iter().enumerate() {
            let identity = self.probe.resolve(&connector.path);
            let plugged = identity.is_some();

            if plugged != self.plugged[index] {
                if plugged {
                    info!("Player {} controller has been plugged in", connector.player + 1);
                } else {
                    info!("Player {} controller has been unplugged", connector.player + 1);
                }
                self.plugged[index] = plugged;
                report.transitions.push(Transition {
                    connector: index,
                    player: connector.player,
                    plugged,
                    timestamp: Local::now(),
                });
            }
            identities.push(identity);
        }

        if !report.changed() {
            return Ok(report);
        }

        for transition in report.transitions.iter().filter(|t| !t.plugged) {
            self.slots[transition.player].detach();
        }
        for (connector, identity) in self.connectors.iter().zip(&identities) {
            let Some(identity) = identity else {
                continue;
            };
            match decode_device_handle(identity) {
                Some(handle) => {
                    debug!("Player {} mapped to device {}", connector.player + 1, handle.0);
                    self.slots[connector.player].attach(handle);
                }
                None => warn!(
                    "Cannot read a device index from '{}' ({})",
                    identity,
                    connector.path.display()
                ),
            }
        }

        self.restart_subsystem()?;
        report.restarted = true;
        Ok(report)
    }

    fn restart_subsystem(&mut self) -> Result<(), TopologyError> {
        self.restarts += 1;
        self.subsystem.shutdown_all();

        if !self.any_plugged() {
            info!("No controllers connected, input backend stays down");
            self.input_available = false;
            return Ok(());
        }

        if let Err(e) = self.subsystem.reinit() {
            error!("Controller input unavailable: {}", e);
            self.input_available = false;
            self.slots.fill(DeviceSlot::default());
            return Err(TopologyError::InputSubsystemRestartFailed(e));
        }

        for index in 0..self.slots.len() {
            match self.subsystem.open_device(index) {
                Ok(true) => debug!("Device {} opened", index),
                Ok(false) => debug!("No device at index {}", index),
                Err(e) => warn!("Failed to open device {}: {}", index, e),
            }
        }
        self.subsystem.enable_event_delivery();
        self.input_available = true;
        Ok(())
    }

    pub fn slots(&self) -> &[DeviceSlot] {
        &self.slots
    }

    pub fn slot(&self, player: usize) -> Option<&DeviceSlot> {
        self.slots.get(player)
    }

    pub fn is_present(&self, player: usize) -> bool {
        self.slot(player).is_some_and(DeviceSlot::is_present)
    }

    /// Logical player currently backed by `device`
    pub fn player_for_device(&self, device: DeviceHandle) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.device() == Some(device))
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn connector_plugged(&self, index: usize) -> bool {
        self.plugged.get(index).copied().unwrap_or(false)
    }

    pub fn any_plugged(&self) -> bool {
        self.plugged.iter().any(|plugged| *plugged)
    }

    /// Number of backend restart cycles so far
    pub fn restart_count(&self) -> usize {
        self.restarts
    }

    pub fn input_available(&self) -> bool {
        self.input_available
    }

    pub fn subsystem(&self) -> &D {
        &self.subsystem
    }

    pub fn subsystem_mut(&mut self) -> &mut D {
        &mut self.subsystem
    }
}

/// Reads the trailing device number of a resolved link, e.g. `../js1` → 1.
pub fn decode_device_handle(identity: &str) -> Option<DeviceHandle> {
    let digits_start = identity
        .char_indices()
        .rev()
        .take_while(|(_, ch)| ch.is_ascii_digit())
        .last()
        .map(|(index, _)| index)?;
    identity[digits_start..].parse().ok().map(DeviceHandle)
}
