//! Edge-aware button channels
//!
//! A [`ButtonState`] turns an instantaneous boolean sample into rising/falling
//! edge information by keeping the value of the previous update cycle.

use serde::{Deserialize, Serialize};

/// Named button channels of a pad, in declaration order.
///
/// The order matters: repeat candidates are evaluated in this order, so when
/// two channels are pressed in the same cycle the later one wins the repeat
/// cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    C,
    D,
    ShoulderL,
    ShoulderR,
    ThumbL,
    ThumbR,
    Menu,
    Options,
    Touch,
}

impl Channel {
    pub const COUNT: usize = 15;

    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::Up,
        Channel::Down,
        Channel::Left,
        Channel::Right,
        Channel::A,
        Channel::B,
        Channel::C,
        Channel::D,
        Channel::ShoulderL,
        Channel::ShoulderR,
        Channel::ThumbL,
        Channel::ThumbR,
        Channel::Menu,
        Channel::Options,
        Channel::Touch,
    ];

    /// Position of the channel in [`Channel::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One boolean input channel with one cycle of history.
#[derive(Clone, Copy, Debug, Default)]
pub struct ButtonState {
    pressed: bool,
    previous: bool,
    pub(crate) repeating: bool,
}

impl ButtonState {
    pub fn new(pressed: bool, previous: bool) -> Self {
        Self {
            pressed,
            previous,
            repeating: false,
        }
    }

    /// Shift the current sample into history and store the new raw sample.
    ///
    /// Must run exactly once per consuming cycle; a second call in the same
    /// cycle makes the first call's sample look like the previous frame.
    pub fn update(&mut self, raw_pressed: bool) {
        self.previous = self.pressed;
        self.pressed = raw_pressed;
    }

    /// OR a press from a secondary source into the channel. Never releases.
    pub fn override_press(&mut self, pressed: bool) {
        self.pressed |= pressed;
    }

    /// Overwrite the raw sample without touching the history.
    ///
    /// Used by backends filling a raw snapshot, which carries no edges.
    pub fn set_raw(&mut self, pressed: bool) {
        self.pressed = pressed;
    }

    pub fn pressed(&self) -> bool {
        self.pressed
    }

    pub fn previous(&self) -> bool {
        self.previous
    }

    /// Rising edge
    pub fn on(&self) -> bool {
        self.pressed && !self.previous
    }

    /// Falling edge
    pub fn release(&self) -> bool {
        !self.pressed && self.previous
    }

    pub fn repeat(&self) -> bool {
        self.on() || self.repeating
    }

    pub fn is_repeating(&self) -> bool {
        self.repeating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_default_is_idle() {
        let button = ButtonState::default();
        assert!(!button.pressed());
        assert!(!button.on());
        assert!(!button.release());
        assert!(!button.repeat());
    }

    #[test]
    fn test_edges_follow_raw_transitions() {
        let samples = [false, true, true, true, false, false, true, false];
        let mut button = ButtonState::default();
        let mut last = false;

        for raw in samples {
            button.update(raw);
            assert_eq!(button.on(), raw && !last, "on for raw={raw} last={last}");
            assert_eq!(button.release(), !raw && last, "release for raw={raw} last={last}");
            assert_eq!(button.pressed(), raw);
            last = raw;
        }
    }

    #[test]
    fn test_double_update_hides_edge() {
        let mut button = ButtonState::default();
        button.update(true);
        button.update(true);
        assert!(!button.on());
        assert!(button.pressed());
    }

    #[test]
    fn test_override_press_never_clears() {
        let mut button = ButtonState::default();
        button.update(true);
        button.override_press(true);
        button.override_press(false);
        assert!(button.pressed());
        assert!(button.on());

        let mut idle = ButtonState::default();
        idle.update(false);
        idle.override_press(false);
        assert!(!idle.pressed());
        idle.override_press(true);
        assert!(idle.pressed());
    }

    #[test]
    fn test_new_with_history() {
        let released = ButtonState::new(false, true);
        assert!(released.release());
        assert!(!released.on());
    }

    #[test]
    fn test_channel_indices_match_declaration_order() {
        for (idx, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), idx);
        }
    }
}
