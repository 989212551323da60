#![allow(dead_code)]

use padstate::controller::{
    BackendError, Channel, PadCallbacks, PadIdentity, PadState, PollPort, PushPort,
    PushRegistration,
};
use std::sync::{Arc, Mutex};

/// Push backend whose callbacks are driven by the test
#[derive(Clone, Default)]
pub struct MockPush {
    callbacks: Arc<Mutex<Option<PadCallbacks>>>,
    fail: bool,
}

impl MockPush {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut PadCallbacks) -> R) -> R {
        let mut guard = self.callbacks.lock().unwrap();
        f(guard.as_mut().expect("callbacks not registered"))
    }
}

impl PushPort for MockPush {
    fn register(self, callbacks: PadCallbacks) -> Result<PushRegistration, BackendError> {
        if self.fail {
            return Err(BackendError::Registration("mock refuses".into()));
        }
        *self.callbacks.lock().unwrap() = Some(callbacks);
        Ok(PushRegistration::detached())
    }
}

/// Poll backend replaying a fixed list of samples, then reporting no device
pub struct MockPoll {
    pub samples: Vec<PadState>,
    pub polled: usize,
}

impl PollPort for MockPoll {
    fn poll(&mut self, _slot: usize, raw: &mut PadState) -> Result<bool, BackendError> {
        let sample = self.samples.get(self.polled).cloned();
        self.polled += 1;
        match sample {
            Some(sample) => {
                *raw = sample;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub fn sample(identity: u64, pressed: &[Channel]) -> PadState {
    let mut raw = PadState::default();
    raw.enabled = true;
    raw.identity = PadIdentity(identity);
    for channel in pressed {
        raw.set_pressed(*channel, true);
    }
    raw
}
