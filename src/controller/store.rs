//! Push-mode pad store
//!
//! [`PadStateStore`] is shared between the backend thread, which writes
//! through the handlers returned by [`PadStateStore::callbacks`], and the
//! frame loop, which copies out with [`PadStateStore::fetch`] once per frame.
//! Both sides take the same lock, only for the duration of a copy.
//!
//! Connection state per store:
//!
//! ```text
//! Disconnected ──connect(h)──► Connected(h) ──sample──► Connected(h)
//!      ▲                            │
//!      └──────disconnect(h)─────────┘   disconnect(other) is ignored
//! ```

use super::backend::{BackendError, PadCallbacks, PushPort, PushRegistration, UpdateKind};
use super::mailbox::Mailbox;
use super::pad_state::{PadIdentity, PadState};
use super::rate::{RateMeter, UpdateRate};
use chrono::Local;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Default)]
struct Shared {
    pad: PadState,
    rate: RateMeter,
}

#[derive(Debug, Default)]
pub struct PadStateStore {
    slot: Mailbox<Shared>,
}

impl PadStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update handler: replace the shared sample. Last write wins; motion
    /// updates land in the same slot and may be coalesced.
    pub fn publish(&self, sample: &PadState, kind: UpdateKind) {
        let now = Local::now();
        self.slot.write(|shared| {
            if kind == UpdateKind::PadState {
                shared.rate.record(now);
            }
            shared.pad.store_sample(sample);
        });
    }

    /// Connect handler
    pub fn on_connect(&self, identity: PadIdentity) {
        let previous = self.slot.write(|shared| {
            let previous = shared.pad.identity;
            shared.pad.identity = identity;
            shared.pad.enabled = true;
            shared.rate.reset();
            previous
        });
        if !previous.is_none() && previous != identity {
            debug!("Pad {} replaces {}", identity, previous);
        }
        info!("Connect GamePad: {}", identity);
    }

    /// Disconnect handler. Returns whether the event matched the tracked
    /// device; a mismatching identity is a stale event and changes nothing.
    pub fn on_disconnect(&self, identity: PadIdentity) -> bool {
        let matched = self.slot.write(|shared| {
            if !shared.pad.check_hash(identity) {
                return false;
            }
            shared.pad.enabled = false;
            shared.pad.clear_inputs();
            shared.rate.reset();
            true
        });
        if matched {
            info!("Disconnect GamePad: {}", identity);
        } else {
            debug!("Ignoring disconnect of untracked pad {}", identity);
        }
        matched
    }

    /// True iff `candidate` is the identity of the most recent connect
    pub fn check_hash(&self, candidate: PadIdentity) -> bool {
        self.slot.read(|shared| shared.pad.check_hash(candidate))
    }

    /// Merge the newest sample into the caller's copy.
    ///
    /// The lock covers the copy only; edge and repeat processing run on the
    /// caller's side afterwards.
    pub fn fetch(&self, out: &mut PadState) {
        let sample = self.snapshot();
        out.merge_from(&sample);
    }

    /// Raw copy of the shared sample
    pub fn snapshot(&self) -> PadState {
        self.slot.read(|shared| shared.pad.clone())
    }

    pub fn update_rate(&self) -> Option<UpdateRate> {
        self.slot.read(|shared| shared.rate.rate())
    }

    /// Handlers that write into this store
    pub fn callbacks(self: &Arc<Self>) -> PadCallbacks {
        let update = Arc::clone(self);
        let connect = Arc::clone(self);
        let disconnect = Arc::clone(self);
        PadCallbacks {
            on_update: Box::new(move |sample, kind| update.publish(sample, kind)),
            on_connect: Box::new(move |identity| connect.on_connect(identity)),
            on_disconnect: Box::new(move |identity| {
                disconnect.on_disconnect(identity);
            }),
        }
    }

    /// Register this store's handlers with a push backend.
    ///
    /// On error the caller should fall back to polling or run without input.
    pub fn register<P: PushPort>(
        self: &Arc<Self>,
        port: P,
    ) -> Result<PushRegistration, BackendError> {
        match port.register(self.callbacks()) {
            Ok(registration) => {
                info!("Push backend registered");
                Ok(registration)
            }
            Err(e) => {
                warn!("Push backend registration failed: {}", e);
                Err(e)
            }
        }
    }
}
