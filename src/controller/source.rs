//! Frame-loop side of pad acquisition
//!
//! The frame loop picks exactly one protocol per slot. [`PadSource`] owns the
//! consumer copy of the pad and refreshes it once per frame.

use super::backend::{BackendError, PollPort, PushPort, PushRegistration};
use super::pad_state::PadState;
use super::repeat::RepeatPolicy;
use super::store::PadStateStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Pull-mode reader. `&mut self` on [`PollReader::poll`] keeps the edge
/// history single-consumer without a lock.
pub struct PollReader<P: PollPort> {
    port: P,
    slot: usize,
    raw: PadState,
    pad: PadState,
    backend_ok: bool,
}

impl<P: PollPort> PollReader<P> {
    pub fn new(port: P, slot: usize, policy: RepeatPolicy) -> Self {
        Self {
            port,
            slot,
            raw: PadState::default(),
            pad: PadState::default().with_repeat_policy(policy),
            backend_ok: true,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn pad(&self) -> &PadState {
        &self.pad
    }

    pub fn pad_mut(&mut self) -> &mut PadState {
        &mut self.pad
    }

    /// Query the backend and run one consuming cycle. Returns whether a
    /// device occupies the slot; backend failures read as "no device".
    pub fn poll(&mut self) -> bool {
        let connected = match self.port.poll(self.slot, &mut self.raw) {
            Ok(connected) => {
                if !self.backend_ok {
                    info!("Pad backend for slot {} recovered", self.slot);
                    self.backend_ok = true;
                }
                connected
            }
            Err(e) => {
                if self.backend_ok {
                    warn!("Polling slot {} failed: {}", self.slot, e);
                    self.backend_ok = false;
                }
                false
            }
        };
        if !connected {
            self.raw.enabled = false;
            self.raw.clear_inputs();
        }
        self.pad.merge_from(&self.raw);
        connected
    }
}

pub enum PadSource {
    Push {
        store: Arc<PadStateStore>,
        pad: PadState,
        _registration: PushRegistration,
    },
    Poll(PollReader<Box<dyn PollPort + Send>>),
}

impl PadSource {
    /// Register a fresh store with a push backend
    pub fn push<P: PushPort>(port: P, policy: RepeatPolicy) -> Result<Self, BackendError> {
        let store = Arc::new(PadStateStore::new());
        let registration = store.register(port)?;
        Ok(Self::from_store(store, registration, policy))
    }

    pub fn from_store(
        store: Arc<PadStateStore>,
        registration: PushRegistration,
        policy: RepeatPolicy,
    ) -> Self {
        Self::Push {
            store,
            pad: PadState::default().with_repeat_policy(policy),
            _registration: registration,
        }
    }

    pub fn poll<P>(port: P, slot: usize, policy: RepeatPolicy) -> Self
    where
        P: PollPort + Send + 'static,
    {
        Self::Poll(PollReader::new(Box::new(port), slot, policy))
    }

    /// One consuming cycle: fetch or poll, then return the refreshed copy so
    /// secondary sources can be overlaid on it.
    pub fn refresh(&mut self) -> &mut PadState {
        match self {
            Self::Push { store, pad, .. } => {
                store.fetch(pad);
                pad
            }
            Self::Poll(reader) => {
                reader.poll();
                reader.pad_mut()
            }
        }
    }

    pub fn pad(&self) -> &PadState {
        match self {
            Self::Push { pad, .. } => pad,
            Self::Poll(reader) => reader.pad(),
        }
    }

    pub fn store(&self) -> Option<&Arc<PadStateStore>> {
        match self {
            Self::Push { store, .. } => Some(store),
            Self::Poll(_) => None,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Push { .. } => "push",
            Self::Poll(_) => "poll",
        }
    }
}
