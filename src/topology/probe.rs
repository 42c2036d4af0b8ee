use std::path::Path;

use tracing::trace;

/// Resolves a connector's well-known path to the identity of the device
/// currently behind it
///
/// `None` is the normal "nothing plugged in" answer, not an error.
pub trait ConnectorProbe {
    fn resolve(&self, path: &Path) -> Option<String>;
}

/// Probe for udev `by-path` links such as
/// `/dev/input/by-path/platform-...-joystick -> ../js0`
///
/// One non-blocking `readlink` per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkProbe;

impl ConnectorProbe for LinkProbe {
    fn resolve(&self, path: &Path) -> Option<String> {
        match std::fs::read_link(path) {
            Ok(target) => Some(target.to_string_lossy().into_owned()),
            Err(e) => {
                trace!("{} does not resolve: {}", path.display(), e);
                None
            }
        }
    }
}
