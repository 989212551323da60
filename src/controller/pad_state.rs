//! Snapshot of one controller's input surface
//!
//! A [`PadState`] is used two ways:
//!
//! - as a **raw sample** produced by a backend, where only the current
//!   `pressed` value of each channel is meaningful, and
//! - as the **consumer copy** owned by the frame loop, which keeps edge
//!   history and the repeat cursor and is refreshed once per frame with
//!   [`PadState::merge_from`].

use super::button::{ButtonState, Channel};
use super::repeat::{RepeatCursor, RepeatPolicy};
use std::fmt;

/// Opaque identity of one physical connection.
///
/// Stable while the device stays connected. Two snapshots describe the same
/// device iff their identities are equal, whatever the other fields say.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PadIdentity(pub u64);

impl PadIdentity {
    pub const NONE: PadIdentity = PadIdentity(0);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for PadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl From<u64> for PadIdentity {
    fn from(hash: u64) -> Self {
        Self(hash)
    }
}

/// Full input surface of one pad at a point in time.
///
/// Intentionally not `PartialEq`: compare devices with
/// [`PadState::same_device`] or [`PadState::check_hash`].
#[derive(Clone, Debug)]
pub struct PadState {
    pub enabled: bool,
    pub identity: PadIdentity,

    buttons: [ButtonState; Channel::COUNT],

    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
    pub trigger_l: f32,
    pub trigger_r: f32,

    pub acceleration: [f32; 3],
    pub rotation: [f32; 3],
    /// Orientation quaternion as (x, y, z, w)
    pub posture: [f32; 4],

    repeat_policy: RepeatPolicy,
    repeat_cursor: RepeatCursor,
}

impl Default for PadState {
    fn default() -> Self {
        Self {
            enabled: false,
            identity: PadIdentity::NONE,
            buttons: [ButtonState::default(); Channel::COUNT],
            left_x: 0.0,
            left_y: 0.0,
            right_x: 0.0,
            right_y: 0.0,
            trigger_l: 0.0,
            trigger_r: 0.0,
            acceleration: [0.0; 3],
            rotation: [0.0; 3],
            posture: [0.0, 0.0, 0.0, 1.0],
            repeat_policy: RepeatPolicy::default(),
            repeat_cursor: RepeatCursor::default(),
        }
    }
}

impl PadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repeat_policy(mut self, policy: RepeatPolicy) -> Self {
        self.repeat_policy = policy;
        self
    }

    pub fn repeat_policy(&self) -> &RepeatPolicy {
        &self.repeat_policy
    }

    pub fn repeat_cursor(&self) -> &RepeatCursor {
        &self.repeat_cursor
    }

    pub fn button(&self, channel: Channel) -> &ButtonState {
        &self.buttons[channel.index()]
    }

    pub fn button_mut(&mut self, channel: Channel) -> &mut ButtonState {
        &mut self.buttons[channel.index()]
    }

    pub fn buttons(&self) -> impl Iterator<Item = (Channel, &ButtonState)> {
        Channel::ALL.into_iter().map(|channel| (channel, self.button(channel)))
    }

    /// Store a raw sample for one channel. Backends use this to fill a sample.
    pub fn set_pressed(&mut self, channel: Channel, pressed: bool) {
        self.buttons[channel.index()].set_raw(pressed);
    }

    pub fn check_hash(&self, candidate: PadIdentity) -> bool {
        self.identity == candidate
    }

    pub fn same_device(&self, other: &PadState) -> bool {
        self.identity == other.identity
    }

    /// Zero every raw input. Identity and edge history are kept.
    pub fn clear_inputs(&mut self) {
        for button in self.buttons.iter_mut() {
            button.set_raw(false);
        }
        self.left_x = 0.0;
        self.left_y = 0.0;
        self.right_x = 0.0;
        self.right_y = 0.0;
        self.trigger_l = 0.0;
        self.trigger_r = 0.0;
        self.acceleration = [0.0; 3];
        self.rotation = [0.0; 3];
        self.posture = [0.0, 0.0, 0.0, 1.0];
    }

    fn forget_history(&mut self) {
        self.buttons = [ButtonState::default(); Channel::COUNT];
        self.repeat_cursor = RepeatCursor::default();
    }

    /// Copy the analog, motion and connection fields of `raw` without
    /// touching any button channel.
    pub(crate) fn copy_surface(&mut self, raw: &PadState) {
        self.enabled = raw.enabled;
        self.identity = raw.identity;
        self.left_x = raw.left_x;
        self.left_y = raw.left_y;
        self.right_x = raw.right_x;
        self.right_y = raw.right_y;
        self.trigger_l = raw.trigger_l;
        self.trigger_r = raw.trigger_r;
        self.acceleration = raw.acceleration;
        self.rotation = raw.rotation;
        self.posture = raw.posture;
    }

    /// Overwrite the raw inputs with those of `raw`, keeping this state's
    /// edge history, repeat cursor and policy. This is how a shared sample
    /// slot is written.
    pub(crate) fn store_sample(&mut self, raw: &PadState) {
        for channel in Channel::ALL {
            self.set_pressed(channel, raw.button(channel).pressed());
        }
        self.copy_surface(raw);
    }

    /// Run one consuming cycle against a raw sample.
    ///
    /// Every channel is updated exactly once with the sample's `pressed`
    /// value, analog, motion and connection fields are copied, then the
    /// repeat cursor advances. A sample from a different device starts from
    /// fresh edge history, so its held buttons report `on()`.
    pub fn merge_from(&mut self, raw: &PadState) {
        if !self.identity.is_none() && !raw.identity.is_none() && !self.same_device(raw) {
            self.forget_history();
        }
        for channel in Channel::ALL {
            self.buttons[channel.index()].update(raw.button(channel).pressed());
        }
        self.copy_surface(raw);
        self.repeat_cursor
            .advance(&mut self.buttons, &self.repeat_policy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        let pad = PadState::default();
        assert!(!pad.enabled);
        assert!(pad.identity.is_none());
        assert_eq!(pad.posture, [0.0, 0.0, 0.0, 1.0]);
        assert!(pad.buttons().all(|(_, b)| !b.pressed()));
    }

    #[test]
    fn test_identity_is_only_equality() {
        let mut a = PadState::default();
        let mut b = PadState::default();
        a.identity = PadIdentity(0xABC);
        b.identity = PadIdentity(0xABC);
        a.left_x = 1.0;
        b.set_pressed(Channel::A, true);
        assert!(a.same_device(&b));

        b.identity = PadIdentity(0xDEF);
        assert!(!a.same_device(&b));
        assert!(a.check_hash(PadIdentity(0xABC)));
        assert!(!a.check_hash(PadIdentity(0xDEF)));
    }

    #[test]
    fn test_merge_tracks_edges_and_copies_surface() {
        let mut consumer = PadState::default();
        let mut raw = PadState::default();
        raw.enabled = true;
        raw.identity = PadIdentity(7);
        raw.set_pressed(Channel::B, true);
        raw.trigger_l = 0.5;
        raw.rotation = [1.0, 2.0, 3.0];

        consumer.merge_from(&raw);
        assert!(consumer.enabled);
        assert_eq!(consumer.identity, PadIdentity(7));
        assert!(consumer.button(Channel::B).on());
        assert_eq!(consumer.trigger_l, 0.5);
        assert_eq!(consumer.rotation, [1.0, 2.0, 3.0]);

        consumer.merge_from(&raw);
        assert!(!consumer.button(Channel::B).on());
        assert!(consumer.button(Channel::B).pressed());

        raw.set_pressed(Channel::B, false);
        consumer.merge_from(&raw);
        assert!(consumer.button(Channel::B).release());
    }

    #[test]
    fn test_clear_inputs_keeps_identity() {
        let mut pad = PadState::default();
        pad.identity = PadIdentity(3);
        pad.set_pressed(Channel::Touch, true);
        pad.left_y = -0.7;
        pad.clear_inputs();
        assert_eq!(pad.identity, PadIdentity(3));
        assert!(!pad.button(Channel::Touch).pressed());
        assert_eq!(pad.left_y, 0.0);
    }

    #[test]
    fn test_merge_keeps_consumer_policy() {
        let policy = RepeatPolicy {
            delay_frames: 1,
            interval_frames: 0,
        };
        let mut consumer = PadState::default().with_repeat_policy(policy);
        let mut raw = PadState::default();
        raw.set_pressed(Channel::Down, true);

        consumer.merge_from(&raw);
        consumer.merge_from(&raw);
        assert_eq!(consumer.repeat_policy(), &policy);
        assert!(consumer.button(Channel::Down).is_repeating());
    }

    #[test]
    fn test_other_device_starts_fresh_history() {
        let policy = RepeatPolicy {
            delay_frames: 1,
            interval_frames: 0,
        };
        let mut consumer = PadState::default().with_repeat_policy(policy);
        let mut raw = PadState::default();
        raw.identity = PadIdentity(0xA);
        raw.set_pressed(Channel::A, true);
        consumer.merge_from(&raw);
        consumer.merge_from(&raw);
        assert!(consumer.button(Channel::A).is_repeating());

        raw.identity = PadIdentity(0xB);
        consumer.merge_from(&raw);
        assert_eq!(consumer.identity, PadIdentity(0xB));
        assert!(consumer.button(Channel::A).on());
        assert!(!consumer.button(Channel::A).is_repeating());
        assert_eq!(consumer.repeat_cursor().candidate(), Some(Channel::A));
        assert_eq!(consumer.repeat_cursor().held_cycles(), 0);
    }

    #[test]
    fn test_unknown_identity_keeps_history() {
        let mut consumer = PadState::default();
        let mut raw = PadState::default();
        raw.set_pressed(Channel::B, true);
        consumer.merge_from(&raw);

        raw.identity = PadIdentity(4);
        consumer.merge_from(&raw);
        assert!(!consumer.button(Channel::B).on());
    }

    #[test]
    fn test_identity_display_is_hex() {
        assert_eq!(PadIdentity(0xABC).to_string(), "abc");
    }
}
