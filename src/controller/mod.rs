//! Controller subsystem: game-pad input state
//!
//! Two stages, either of which the frame loop can drive:
//!
//! ```text
//!            push: backend thread ──► PadStateStore ──fetch──┐
//! Backend ──┤                                                ├──► PadState (frame loop copy)
//!            poll: frame loop ─────► PollReader ─────────────┘
//! ```
//!
//! 1. [`button`] - per-channel edge tracking
//! 2. [`repeat`] - single-cursor auto-repeat
//! 3. [`pad_state`] - the snapshot and its merge step
//! 4. [`store`] / [`source`] - hand-off between backend and frame loop
//! 5. [`gilrs_backend`] - the concrete backend

pub mod backend;
pub mod button;
pub mod gilrs_backend;
pub mod mailbox;
pub mod pad_state;
pub mod rate;
pub mod repeat;
pub mod source;
pub mod store;

pub use backend::{
    BackendError, PadCallbacks, PollPort, PushPort, PushRegistration, UpdateKind,
};
pub use button::{ButtonState, Channel};
pub use gilrs_backend::{Detached, Listening, ListenerSettings, PadListener};
pub use pad_state::{PadIdentity, PadState};
pub use rate::UpdateRate;
pub use repeat::{RepeatCursor, RepeatPolicy};
pub use source::{PadSource, PollReader};
pub use store::PadStateStore;
