//! Game-pad backend ports
//!
//! A backend offers two acquisition protocols:
//!
//! - [`PollPort`]: the frame loop asks for the newest sample of a slot,
//!   synchronously, once per frame.
//! - [`PushPort`]: the backend owns a thread and calls [`PadCallbacks`]
//!   whenever a sample or a hot-plug event arrives.
//!
//! `PushPort::register` consumes the backend, so one backend instance can
//! never feed the same consumer through both protocols.

use super::pad_state::{PadIdentity, PadState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error};

/// What a pushed sample carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// Buttons and axes changed
    PadState,
    /// Only acceleration, rotation or posture changed
    Motion,
}

pub type UpdateHandler = Box<dyn FnMut(&PadState, UpdateKind) + Send>;
pub type HotplugHandler = Box<dyn FnMut(PadIdentity) + Send>;

/// Handlers a push backend invokes from its own thread
pub struct PadCallbacks {
    pub on_update: UpdateHandler,
    pub on_connect: HotplugHandler,
    pub on_disconnect: HotplugHandler,
}

impl std::fmt::Debug for PadCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PadCallbacks").finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Input backend unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to register callbacks: {0}")]
    Registration(String),

    #[error("Backend thread error: {0}")]
    Thread(String),
}

pub trait PollPort {
    /// Fill `raw` with the newest sample for `slot`.
    ///
    /// Returns `Ok(false)` and leaves `raw.enabled == false` when no device
    /// occupies the slot.
    fn poll(&mut self, slot: usize, raw: &mut PadState) -> Result<bool, BackendError>;
}

impl<P: PollPort + ?Sized> PollPort for Box<P> {
    fn poll(&mut self, slot: usize, raw: &mut PadState) -> Result<bool, BackendError> {
        (**self).poll(slot, raw)
    }
}

pub trait PushPort {
    fn register(self, callbacks: PadCallbacks) -> Result<PushRegistration, BackendError>;
}

/// Keeps a push backend alive. Dropping it stops and joins the backend thread.
#[derive(Debug)]
pub struct PushRegistration {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PushRegistration {
    pub fn new(stop: Arc<AtomicBool>, thread: JoinHandle<()>) -> Self {
        Self {
            stop,
            thread: Some(thread),
        }
    }

    /// Registration for a backend that calls back from threads it does not
    /// hand over
    pub fn detached() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }
}

impl Drop for PushRegistration {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            debug!("Waiting for push backend thread to stop");
            if thread.join().is_err() {
                error!("Push backend thread panicked");
            }
        }
    }
}
