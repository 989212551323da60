//! Auto-repeat timing
//!
//! Repeat is tracked per pad, not per button: a single [`RepeatCursor`]
//! remembers which channel is the current candidate and how many cycles it
//! has been held. Only one channel repeats at a time. A fresh press on any
//! channel takes the cursor over; when several channels are pressed in the
//! same cycle the one declared last in [`Channel::ALL`] keeps it.

use super::button::{ButtonState, Channel};
use serde::{Deserialize, Serialize};

/// Timing of auto-repeat, counted in update cycles (frames).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatPolicy {
    /// Held cycles after the press before repeat is asserted
    pub delay_frames: u32,
    /// 0 keeps repeat asserted until release, otherwise it pulses every
    /// `interval_frames` cycles once the delay has passed
    pub interval_frames: u32,
}

impl Default for RepeatPolicy {
    fn default() -> Self {
        Self {
            delay_frames: 20,
            interval_frames: 0,
        }
    }
}

impl RepeatPolicy {
    fn fires(&self, held: u32) -> bool {
        if held < self.delay_frames {
            return false;
        }
        match self.interval_frames {
            0 => true,
            interval => (held - self.delay_frames) % interval == 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RepeatCursor {
    count: u32,
    button: Option<Channel>,
}

impl RepeatCursor {
    /// Channel currently owning the cursor, if any
    pub fn candidate(&self) -> Option<Channel> {
        self.button
    }

    pub fn held_cycles(&self) -> u32 {
        self.count
    }

    /// Advance the cursor by one cycle. Call after every channel has been
    /// updated for the cycle.
    ///
    /// The candidate is settled first, so a channel that loses the cursor
    /// stops repeating in the same cycle wherever it sits in [`Channel::ALL`].
    pub fn advance(&mut self, buttons: &mut [ButtonState; Channel::COUNT], policy: &RepeatPolicy) {
        let fresh = Channel::ALL
            .into_iter()
            .rev()
            .find(|channel| buttons[channel.index()].on());

        match (fresh, self.button) {
            (Some(channel), _) => {
                self.button = Some(channel);
                self.count = 0;
            }
            (None, Some(held)) if buttons[held.index()].pressed() => {
                self.count = self.count.saturating_add(1);
            }
            _ => {
                self.button = None;
                self.count = 0;
            }
        }

        for channel in Channel::ALL {
            // a fresh press already reports repeat through on()
            buttons[channel.index()].repeating =
                self.button == Some(channel) && self.count > 0 && policy.fires(self.count);
        }
    }
}
