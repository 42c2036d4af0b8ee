//! Player 1 input dispatch for the launcher menu
//!
//! Only the device currently mapped to player 1 drives the menu; events from
//! any other pad are dropped. The caller resolves the event's device to a
//! player through [`DeviceTopology`](crate::topology::DeviceTopology) before
//! handing it over.

use gilrs::{Axis, Button, EventType};
use tracing::debug;

use crate::menu::Direction;

/// Stick deflection needed to count as a menu direction
const AXIS_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    /// Move or stop moving through the list
    Hold(Direction),
    /// Start the selected game
    Launch,
}

/// Translates player 1's pad events into menu commands
#[derive(Debug, Clone, Default)]
pub struct InputDispatcher {
    select_code: Option<u32>,
    start_code: Option<u32>,
}

impl InputDispatcher {
    /// `select_code`/`start_code` are raw button codes; when unset the mapped
    /// Select and Start buttons are used.
    pub fn new(select_code: Option<u32>, start_code: Option<u32>) -> Self {
        Self {
            select_code,
            start_code,
        }
    }

    pub fn dispatch(&self, player: Option<usize>, event: &EventType) -> Option<MenuCommand> {
        self.dispatch_input(player, PadInput::from_event(event)?)
    }

    fn dispatch_input(&self, player: Option<usize>, input: PadInput) -> Option<MenuCommand> {
        if player != Some(0) {
            return None;
        }

        match input {
            PadInput::Pressed(button, code) => {
                if self.is_launch_button(button, code) {
                    debug!("Launch requested with {:?}", button);
                    return Some(MenuCommand::Launch);
                }
                match button {
                    Button::DPadUp => Some(MenuCommand::Hold(Direction::Up)),
                    Button::DPadDown => Some(MenuCommand::Hold(Direction::Down)),
                    _ => None,
                }
            }
            PadInput::Released(Button::DPadUp | Button::DPadDown) => {
                Some(MenuCommand::Hold(Direction::Idle))
            }
            PadInput::Released(_) => None,
            PadInput::Vertical(value) => Some(MenuCommand::Hold(axis_direction(value))),
        }
    }

    fn is_launch_button(&self, button: Button, code: u32) -> bool {
        match (self.select_code, self.start_code) {
            (None, None) => matches!(button, Button::Select | Button::Start),
            (select, start) => Some(code) == select || Some(code) == start,
        }
    }
}

/// The parts of a gilrs event the menu cares about
#[derive(Debug, Clone, Copy, PartialEq)]
enum PadInput {
    Pressed(Button, u32),
    Released(Button),
    Vertical(f32),
}

impl PadInput {
    fn from_event(event: &EventType) -> Option<Self> {
        match *event {
            EventType::ButtonPressed(button, code) => Some(Self::Pressed(button, code.into_u32())),
            EventType::ButtonReleased(button, _) => Some(Self::Released(button)),
            EventType::AxisChanged(Axis::LeftStickY | Axis::DPadY, value, _) => {
                Some(Self::Vertical(value))
            }
            _ => None,
        }
    }
}

/// gilrs reports up as positive Y
fn axis_direction(value: f32) -> Direction {
    if value > AXIS_THRESHOLD {
        Direction::Up
    } else if value < -AXIS_THRESHOLD {
        Direction::Down
    } else {
        Direction::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_maps_to_direction() {
        assert_eq!(axis_direction(1.0), Direction::Up);
        assert_eq!(axis_direction(-0.9), Direction::Down);
        assert_eq!(axis_direction(0.1), Direction::Idle);
    }

    #[test]
    fn only_player_one_is_heard() {
        let dispatcher = InputDispatcher::default();
        let input = PadInput::Vertical(-1.0);
        assert_eq!(
            dispatcher.dispatch_input(Some(0), input),
            Some(MenuCommand::Hold(Direction::Down))
        );
        assert_eq!(dispatcher.dispatch_input(Some(1), input), None);
        assert_eq!(dispatcher.dispatch_input(None, input), None);
    }

    #[test]
    fn dpad_scrolls_until_released() {
        let dispatcher = InputDispatcher::default();
        assert_eq!(
            dispatcher.dispatch_input(Some(0), PadInput::Pressed(Button::DPadUp, 0)),
            Some(MenuCommand::Hold(Direction::Up))
        );
        assert_eq!(
            dispatcher.dispatch_input(Some(0), PadInput::Released(Button::DPadUp)),
            Some(MenuCommand::Hold(Direction::Idle))
        );
        assert_eq!(
            dispatcher.dispatch_input(Some(0), PadInput::Released(Button::South)),
            None
        );
    }

    #[test]
    fn start_launches() {
        let dispatcher = InputDispatcher::default();
        assert_eq!(
            dispatcher.dispatch_input(Some(0), PadInput::Pressed(Button::Start, 0)),
            Some(MenuCommand::Launch)
        );
    }

    #[test]
    fn default_launch_buttons() {
        let dispatcher = InputDispatcher::default();
        assert!(dispatcher.is_launch_button(Button::Start, 0));
        assert!(dispatcher.is_launch_button(Button::Select, 0));
        assert!(!dispatcher.is_launch_button(Button::South, 0));
    }

    #[test]
    fn configured_codes_replace_defaults() {
        let dispatcher = InputDispatcher::new(Some(8), Some(9));
        assert!(dispatcher.is_launch_button(Button::Unknown, 9));
        assert!(dispatcher.is_launch_button(Button::Unknown, 8));
        assert!(!dispatcher.is_launch_button(Button::Start, 3));
    }
}
