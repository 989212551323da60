//! gilrs-backed pad backend
//!
//! [`PadListener`] moves through two typestates:
//!
//! - `Detached`: owns the gilrs context and answers [`PollPort::poll`].
//! - `Listening`: moved onto its own thread by [`PushPort::register`], pumps
//!   gilrs events and calls the registered [`PadCallbacks`].
//!
//! gilrs reports no motion sensors, so every pushed sample is an
//! [`UpdateKind::PadState`] and motion fields keep their defaults.

use super::backend::{
    BackendError, PadCallbacks, PollPort, PushPort, PushRegistration, UpdateKind,
};
use super::button::Channel;
use super::pad_state::{PadIdentity, PadState};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const BUTTON_MAP: [(Button, Channel); 14] = [
    (Button::DPadUp, Channel::Up),
    (Button::DPadDown, Channel::Down),
    (Button::DPadLeft, Channel::Left),
    (Button::DPadRight, Channel::Right),
    (Button::South, Channel::A),
    (Button::East, Channel::B),
    (Button::West, Channel::C),
    (Button::North, Channel::D),
    (Button::LeftTrigger, Channel::ShoulderL),
    (Button::RightTrigger, Channel::ShoulderR),
    (Button::LeftThumb, Channel::ThumbL),
    (Button::RightThumb, Channel::ThumbR),
    (Button::Start, Channel::Menu),
    (Button::Select, Channel::Options),
];

const IDLE_SLEEP: Duration = Duration::from_millis(1);

#[derive(Clone, Debug)]
pub struct ListenerSettings {
    pub joystick_deadzone: f32,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.05,
        }
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum ListenerState {
    Detached,
    Listening,
}

#[machine]
#[derive(Debug)]
pub struct PadListener<S: ListenerState> {
    gilrs: Gilrs,

    settings: ListenerSettings,

    // Gamepad whose samples are pushed
    tracked: Option<GamepadId>,

    // Identities of every gamepad seen connected, for disconnect events
    known: HashMap<GamepadId, PadIdentity>,

    stop: Arc<AtomicBool>,
}

impl<S: ListenerState> PadListener<S> {
    pub fn settings(&self) -> &ListenerSettings {
        &self.settings
    }

    fn identity(&mut self, id: GamepadId) -> PadIdentity {
        let gilrs = &self.gilrs;
        *self
            .known
            .entry(id)
            .or_insert_with(|| identity_of(id, &gilrs.gamepad(id)))
    }

    fn pump(&mut self) -> Vec<(GamepadId, EventType)> {
        let mut events = Vec::new();
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            events.push((id, event));
        }
        events
    }
}

impl PadListener<Detached> {
    pub fn create(settings: Option<ListenerSettings>) -> Result<Self, BackendError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating pad listener with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(BackendError::Unavailable(e.to_string()));
            }
        };

        let mut listener = Self::new(
            gilrs,
            settings,
            None,
            HashMap::new(),
            Arc::new(AtomicBool::new(false)),
        );
        let connected: Vec<GamepadId> = listener.gilrs.gamepads().map(|(id, _)| id).collect();
        if connected.is_empty() {
            warn!("No gamepad connected, waiting for hot-plug");
        }
        for (idx, id) in connected.into_iter().enumerate() {
            let identity = listener.identity(id);
            let gamepad = listener.gilrs.gamepad(id);
            info!("  [{}] {} ({}), identity {}", idx, gamepad.name(), id, identity);
        }
        Ok(listener)
    }

    fn listen(self) -> PadListener<Listening> {
        info!("Pad listener switching to push mode");
        self.transition()
    }
}

impl PollPort for PadListener<Detached> {
    fn poll(&mut self, slot: usize, raw: &mut PadState) -> Result<bool, BackendError> {
        for (id, event) in self.pump() {
            match event {
                EventType::Connected => {
                    let identity = self.identity(id);
                    info!("Gamepad {} connected, identity {}", id, identity);
                }
                EventType::Disconnected => {
                    if let Some(identity) = self.known.remove(&id) {
                        info!("Gamepad {} disconnected, identity {}", id, identity);
                    }
                }
                _ => {}
            }
        }

        let Some(id) = self.gilrs.gamepads().nth(slot).map(|(id, _)| id) else {
            raw.enabled = false;
            return Ok(false);
        };
        let identity = self.identity(id);
        let deadzone = self.settings.joystick_deadzone;
        fill_sample(identity, &self.gilrs.gamepad(id), deadzone, raw);
        Ok(true)
    }
}

impl PushPort for PadListener<Detached> {
    fn register(self, callbacks: PadCallbacks) -> Result<PushRegistration, BackendError> {
        let stop = Arc::clone(&self.stop);
        let mut listening = self.listen();
        let thread = thread::Builder::new()
            .name("padstate-gilrs".into())
            .spawn(move || listening.run(callbacks))
            .map_err(|e| BackendError::Thread(e.to_string()))?;
        Ok(PushRegistration::new(stop, thread))
    }
}

impl PadListener<Listening> {
    fn run(&mut self, mut callbacks: PadCallbacks) {
        info!("Starting pad listener loop");

        let first = self.gilrs.gamepads().next().map(|(id, _)| id);
        if let Some(id) = first {
            self.adopt(id, &mut callbacks);
        }

        while !self.stop.load(Ordering::Acquire) {
            for (id, event) in self.pump() {
                self.handle(id, event, &mut callbacks);
            }
            thread::sleep(IDLE_SLEEP);
        }
        info!("Pad listener loop stopped");
    }

    fn adopt(&mut self, id: GamepadId, callbacks: &mut PadCallbacks) {
        let identity = self.identity(id);
        self.tracked = Some(id);
        info!("Tracking gamepad {} ({})", id, identity);
        (callbacks.on_connect)(identity);
        self.push_sample(id, callbacks);
    }

    fn handle(&mut self, id: GamepadId, event: EventType, callbacks: &mut PadCallbacks) {
        match event {
            EventType::Connected => {
                if self.tracked.is_none() {
                    self.adopt(id, callbacks);
                } else {
                    let identity = self.identity(id);
                    debug!("Additional gamepad {} ({}) not tracked", id, identity);
                }
            }
            EventType::Disconnected => {
                // forwarded for every pad; the store drops untracked identities
                if let Some(identity) = self.known.remove(&id) {
                    (callbacks.on_disconnect)(identity);
                }
                if self.tracked == Some(id) {
                    self.tracked = None;
                    let next = self
                        .gilrs
                        .gamepads()
                        .map(|(other, _)| other)
                        .find(|other| *other != id);
                    if let Some(next) = next {
                        self.adopt(next, callbacks);
                    }
                }
            }
            EventType::ButtonRepeated(..) | EventType::Dropped => {}
            EventType::ButtonPressed(..)
            | EventType::ButtonReleased(..)
            | EventType::ButtonChanged(..)
            | EventType::AxisChanged(..) => {
                if self.tracked.is_none() {
                    self.adopt(id, callbacks);
                } else if self.tracked == Some(id) {
                    self.push_sample(id, callbacks);
                } else {
                    debug!("Skipping event from non-tracked gamepad: {:?}", id);
                }
            }
            _ => debug!("Unhandled event type: {:?}", event),
        }
    }

    fn push_sample(&mut self, id: GamepadId, callbacks: &mut PadCallbacks) {
        let identity = self.identity(id);
        let mut raw = PadState::default();
        fill_sample(
            identity,
            &self.gilrs.gamepad(id),
            self.settings.joystick_deadzone,
            &mut raw,
        );
        (callbacks.on_update)(&raw, UpdateKind::PadState);
    }
}

fn fill_sample(identity: PadIdentity, gamepad: &Gamepad<'_>, deadzone: f32, raw: &mut PadState) {
    raw.enabled = gamepad.is_connected();
    raw.identity = identity;
    for (button, channel) in BUTTON_MAP {
        raw.set_pressed(channel, gamepad.is_pressed(button));
    }
    raw.left_x = apply_deadzone(gamepad.value(Axis::LeftStickX), deadzone);
    raw.left_y = apply_deadzone(gamepad.value(Axis::LeftStickY), deadzone);
    raw.right_x = apply_deadzone(gamepad.value(Axis::RightStickX), deadzone);
    raw.right_y = apply_deadzone(gamepad.value(Axis::RightStickY), deadzone);
    raw.trigger_l = trigger_value(gamepad, Button::LeftTrigger2, deadzone);
    raw.trigger_r = trigger_value(gamepad, Button::RightTrigger2, deadzone);
}

fn trigger_value(gamepad: &Gamepad<'_>, button: Button, deadzone: f32) -> f32 {
    gamepad
        .button_data(button)
        .map_or(0.0, |data| apply_deadzone(data.value(), deadzone))
}

fn identity_of(id: GamepadId, gamepad: &Gamepad<'_>) -> PadIdentity {
    identity_from(gamepad.uuid(), usize::from(id))
}

fn identity_from(uuid: [u8; 16], index: usize) -> PadIdentity {
    let mut hasher = DefaultHasher::new();
    uuid.hash(&mut hasher);
    index.hash(&mut hasher);
    PadIdentity(hasher.finish())
}

// Rescale the value to the range outside the deadzone
fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}
