//! Keyboard as a secondary pad source
//!
//! Key events arrive through a [`KeyboardPort`] once per frame. A
//! [`KeyboardOverlay`] remembers which bound keys are held and ORs them into
//! the pad's channels after the pad has been refreshed, so a key can press a
//! channel but never release a press coming from the pad itself.

use crate::controller::{Channel, PadState};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Space,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Backspace,
    Delete,
    LeftCtrl,
    RightCtrl,
    LeftShift,
    RightShift,
    LeftCmd,
    RightCmd,
    LeftAlt,
    RightAlt,
    Enter,
    Escape,
    Tab,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
}

const LETTERS: [KeyCode; 26] = [
    KeyCode::A,
    KeyCode::B,
    KeyCode::C,
    KeyCode::D,
    KeyCode::E,
    KeyCode::F,
    KeyCode::G,
    KeyCode::H,
    KeyCode::I,
    KeyCode::J,
    KeyCode::K,
    KeyCode::L,
    KeyCode::M,
    KeyCode::N,
    KeyCode::O,
    KeyCode::P,
    KeyCode::Q,
    KeyCode::R,
    KeyCode::S,
    KeyCode::T,
    KeyCode::U,
    KeyCode::V,
    KeyCode::W,
    KeyCode::X,
    KeyCode::Y,
    KeyCode::Z,
];

const DIGITS: [KeyCode; 10] = [
    KeyCode::Num0,
    KeyCode::Num1,
    KeyCode::Num2,
    KeyCode::Num3,
    KeyCode::Num4,
    KeyCode::Num5,
    KeyCode::Num6,
    KeyCode::Num7,
    KeyCode::Num8,
    KeyCode::Num9,
];

#[derive(Debug, thiserror::Error)]
#[error("Unknown key name: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for KeyCode {
    type Err = UnknownKey;

    /// Single letters and digits, or a key name such as `space` or `pgup`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let mut chars = lower.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_lowercase() {
                return Ok(LETTERS[(c as u8 - b'a') as usize]);
            }
            if c.is_ascii_digit() {
                return Ok(DIGITS[(c as u8 - b'0') as usize]);
            }
        }
        let code = match lower.as_str() {
            "space" | "spc" => KeyCode::Space,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdown" => KeyCode::PageDown,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "backspace" | "bs" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "lctrl" => KeyCode::LeftCtrl,
            "rctrl" => KeyCode::RightCtrl,
            "lshift" => KeyCode::LeftShift,
            "rshift" => KeyCode::RightShift,
            "lcmd" => KeyCode::LeftCmd,
            "rcmd" => KeyCode::RightCmd,
            "lalt" => KeyCode::LeftAlt,
            "ralt" => KeyCode::RightAlt,
            "enter" | "return" => KeyCode::Enter,
            "escape" | "esc" => KeyCode::Escape,
            "tab" => KeyCode::Tab,
            _ => return Err(UnknownKey(s.to_string())),
        };
        Ok(code)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub pressed: bool,
}

/// Delivers discrete key press/release events, drained once per frame
pub trait KeyboardPort {
    fn fetch(&mut self, on_key: &mut dyn FnMut(KeyCode, bool));
}

/// Keyboard fed through a channel by any producer (a window, a terminal, a test)
#[derive(Debug)]
pub struct ChannelKeyboard {
    receiver: mpsc::Receiver<KeyEvent>,
    closed: bool,
}

pub fn channel(capacity: usize) -> (mpsc::Sender<KeyEvent>, ChannelKeyboard) {
    let (sender, receiver) = mpsc::channel(capacity);
    (
        sender,
        ChannelKeyboard {
            receiver,
            closed: false,
        },
    )
}

impl KeyboardPort for ChannelKeyboard {
    fn fetch(&mut self, on_key: &mut dyn FnMut(KeyCode, bool)) {
        loop {
            match self.receiver.try_recv() {
                Ok(KeyEvent { code, pressed }) => on_key(code, pressed),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    if !self.closed {
                        debug!("Keyboard channel closed");
                        self.closed = true;
                    }
                    break;
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub channel: Channel,
}

pub fn default_bindings() -> Vec<KeyBinding> {
    vec![
        KeyBinding {
            key: KeyCode::W,
            channel: Channel::Up,
        },
        KeyBinding {
            key: KeyCode::A,
            channel: Channel::Left,
        },
        KeyBinding {
            key: KeyCode::S,
            channel: Channel::Down,
        },
        KeyBinding {
            key: KeyCode::D,
            channel: Channel::Right,
        },
    ]
}

#[derive(Clone, Debug)]
pub struct KeyboardOverlay {
    bindings: Vec<KeyBinding>,
    held: HashSet<KeyCode>,
}

impl Default for KeyboardOverlay {
    fn default() -> Self {
        Self::new(default_bindings())
    }
}

impl KeyboardOverlay {
    pub fn new(bindings: Vec<KeyBinding>) -> Self {
        Self {
            bindings,
            held: HashSet::new(),
        }
    }

    pub fn handle(&mut self, code: KeyCode, pressed: bool) {
        if !self.bindings.iter().any(|binding| binding.key == code) {
            debug!("Key Event: {:?}, {}", code, if pressed { "On" } else { "Off" });
            return;
        }
        if pressed {
            self.held.insert(code);
        } else {
            self.held.remove(&code);
        }
    }

    pub fn poll(&mut self, port: &mut dyn KeyboardPort) {
        port.fetch(&mut |code, pressed| self.handle(code, pressed));
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    /// OR every bound key into its channel. Run after the pad refresh.
    pub fn apply(&self, pad: &mut PadState) {
        for binding in &self.bindings {
            pad.button_mut(binding.channel)
                .override_press(self.held.contains(&binding.key));
        }
    }
}
