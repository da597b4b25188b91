//! Pointer button policy
//! Left drags the window, right closes it, everything else is ignored.

use log::debug;

/// `BTN_LEFT` from linux/input-event-codes.h
pub const BTN_LEFT: u32 = 0x110;
/// `BTN_RIGHT` from linux/input-event-codes.h
pub const BTN_RIGHT: u32 = 0x111;
/// `BTN_MIDDLE` from linux/input-event-codes.h
pub const BTN_MIDDLE: u32 = 0x112;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Mouse buttons the client distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u32),
}

impl From<u32> for MouseButton {
    fn from(code: u32) -> Self {
        match code {
            BTN_LEFT => MouseButton::Left,
            BTN_RIGHT => MouseButton::Right,
            BTN_MIDDLE => MouseButton::Middle,
            other => MouseButton::Other(other),
        }
    }
}

/// What a button event asks the session to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    /// Hand the drag to the compositor
    Move { serial: u32 },
    /// Tear down the window and stop
    Close,
    Ignore,
}

#[derive(Debug, Default)]
pub struct InputHandler {
    /// Presses seen so far
    presses: u64,
}

impl InputHandler {
    pub fn presses(&self) -> u64 {
        self.presses
    }

    pub fn on_button(&mut self, serial: u32, button: u32, state: ButtonState) -> PointerAction {
        if state != ButtonState::Pressed {
            return PointerAction::Ignore;
        }
        self.presses += 1;

        let action = match MouseButton::from(button) {
            MouseButton::Left => PointerAction::Move { serial },
            MouseButton::Right => PointerAction::Close,
            MouseButton::Middle | MouseButton::Other(_) => PointerAction::Ignore,
        };
        debug!("🖱️ Button {:#x} pressed -> {:?}", button, action);
        action
    }
}
