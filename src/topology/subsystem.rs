//! Device subsystem control surface and its gilrs backend

use gilrs::{Event, GamepadId, Gilrs};
use tracing::{debug, error, info};

/// Errors raised while (re)acquiring input devices
#[derive(Debug, thiserror::Error)]
pub enum SubsystemError {
    /// The input backend could not be brought up
    #[error("Failed to initialize input backend: {0}")]
    InitializationError(String),

    /// A device was requested before the backend was initialized
    #[error("Input backend is not running")]
    NotRunning,
}

/// What [`DeviceTopology`](super::DeviceTopology) needs from the input layer
pub trait DeviceSubsystem {
    /// Closes every device and stops the backend.
    fn shutdown_all(&mut self);

    fn reinit(&mut self) -> Result<(), SubsystemError>;

    /// Opens the device with OS index `index`. `Ok(false)` means no device
    /// currently sits at that index.
    fn open_device(&mut self, index: usize) -> Result<bool, SubsystemError>;

    fn enable_event_delivery(&mut self);
}

/// gilrs-backed input subsystem
///
/// Dropping the `Gilrs` context is the shutdown; a fresh context is the
/// reinit. Opened gamepads are remembered by OS index so incoming events can
/// be traced back to a [`DeviceHandle`](super::DeviceHandle).
#[derive(Default)]
pub struct GilrsSubsystem {
    gilrs: Option<Gilrs>,
    opened: Vec<Option<GamepadId>>,
    events_enabled: bool,
}

impl GilrsSubsystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.gilrs.is_some()
    }

    /// Next pending device event, if delivery is enabled
    pub fn next_event(&mut self) -> Option<Event> {
        if !self.events_enabled {
            return None;
        }
        self.gilrs.as_mut()?.next_event()
    }

    /// OS index under which `id` was opened
    pub fn device_index(&self, id: GamepadId) -> Option<usize> {
        self.opened.iter().position(|opened| *opened == Some(id))
    }
}

impl DeviceSubsystem for GilrsSubsystem {
    fn shutdown_all(&mut self) {
        if self.gilrs.take().is_some() {
            info!("Input backend shut down");
        }
        self.opened.clear();
        self.events_enabled = false;
    }

    fn reinit(&mut self) -> Result<(), SubsystemError> {
        match Gilrs::new() {
            Ok(gilrs) => {
                info!("Input backend initialized");
                self.gilrs = Some(gilrs);
                Ok(())
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                Err(SubsystemError::InitializationError(e.to_string()))
            }
        }
    }

    fn open_device(&mut self, index: usize) -> Result<bool, SubsystemError> {
        let gilrs = self.gilrs.as_ref().ok_or(SubsystemError::NotRunning)?;
        let found = gilrs.gamepads().nth(index).map(|(id, gamepad)| {
            debug!("Opened gamepad {} '{}' as device {}", id, gamepad.name(), index);
            id
        });

        if self.opened.len() <= index {
            self.opened.resize(index + 1, None);
        }
        self.opened[index] = found;
        Ok(found.is_some())
    }

    fn enable_event_delivery(&mut self) {
        self.events_enabled = true;
    }
}
